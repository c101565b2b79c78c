/// Compiled-in settings. There is no config file; every start uses these.
use crate::state::{AppState, Substitute};

pub const APP_TITLE: &str = "Paste Without Line Breaks";
pub const EVENT_CHANNEL_CAPACITY: usize = 32;
/// Used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Tray tooltip and title.
    pub title: String,
    pub start_monitoring: bool,
    pub substitute: Substitute,
    /// Capacity of the channel feeding the dispatcher. Events beyond it are dropped.
    pub event_channel_capacity: usize,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: APP_TITLE.to_string(),
            start_monitoring: true,
            substitute: Substitute::Space,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// The state the dispatcher starts from.
    pub fn initial_state(&self) -> AppState {
        AppState::new(self.start_monitoring, self.substitute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_title() {
        assert_eq!(Config::default().title, "Paste Without Line Breaks");
    }

    #[test]
    fn initial_state_matches_app_state_default() {
        assert_eq!(Config::default().initial_state(), AppState::default());
    }

    #[test]
    fn channel_capacity_is_nonzero() {
        assert!(Config::default().event_channel_capacity > 0);
    }
}
