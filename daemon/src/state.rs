/// What single line breaks are replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitute {
    /// Join wrapped lines with a single space.
    Space,
    /// Join wrapped lines with nothing in between.
    Empty,
}

impl Substitute {
    pub fn as_str(self) -> &'static str {
        match self {
            Substitute::Space => " ",
            Substitute::Empty => "",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Substitute::Space => Substitute::Empty,
            Substitute::Empty => Substitute::Space,
        }
    }
}

pub const STOP_MONITORING_LABEL: &str = "Stop Monitoring";
pub const START_MONITORING_LABEL: &str = "Start Monitoring";
pub const SUBSTITUTE_EMPTY_LABEL: &str = "Substitute With Empty";
pub const SUBSTITUTE_SPACE_LABEL: &str = "Substitute With Space";
pub const QUIT_LABEL: &str = "Quit";

/// Runtime state owned by the dispatcher. Reset to defaults on every start.
///
/// Both axes are independent. Menu labels are derived from the state and name
/// the action a click on that item performs next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub monitoring: bool,
    pub substitute: Substitute,
}

impl AppState {
    pub fn new(monitoring: bool, substitute: Substitute) -> Self {
        Self { monitoring, substitute }
    }

    /// Flips monitoring and returns the new value.
    pub fn toggle_monitoring(&mut self) -> bool {
        self.monitoring = !self.monitoring;
        self.monitoring
    }

    /// Flips the substitute and returns the new value.
    pub fn toggle_substitute(&mut self) -> Substitute {
        self.substitute = self.substitute.toggled();
        self.substitute
    }

    pub fn monitoring_label(&self) -> &'static str {
        if self.monitoring {
            STOP_MONITORING_LABEL
        } else {
            START_MONITORING_LABEL
        }
    }

    pub fn substitute_label(&self) -> &'static str {
        match self.substitute {
            Substitute::Space => SUBSTITUTE_EMPTY_LABEL,
            Substitute::Empty => SUBSTITUTE_SPACE_LABEL,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(true, Substitute::Space)
    }
}
