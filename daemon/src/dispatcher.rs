/// The event dispatcher: the single owner of [`AppState`].
///
/// Clipboard changes, menu clicks and quit all arrive as [`DaemonEvent`]s on one
/// channel, so state reads and writes never race. Side effects go through the
/// [`ClipboardWriter`] and [`TrayView`] seams so the dispatcher can be driven
/// by test doubles.
use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace};

use crate::event::{DaemonEvent, MenuSlot};
use crate::normalize::normalize;
use crate::state::AppState;

/// Writes text to the system clipboard.
pub trait ClipboardWriter: Send {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// The parts of the tray the dispatcher drives.
pub trait TrayView: Send {
    fn set_label(&self, slot: MenuSlot, label: &str);
    /// Asks the tray loop to shut down and release the icon.
    fn exit(&self);
}

/// Whether the dispatcher keeps running after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Dispatcher<C, V> {
    state: AppState,
    clipboard: C,
    view: V,
    /// Setting this to `true` tells every listener to stop.
    stop_tx: watch::Sender<bool>,
}

impl<C: ClipboardWriter, V: TrayView> Dispatcher<C, V> {
    pub fn new(state: AppState, clipboard: C, view: V, stop_tx: watch::Sender<bool>) -> Self {
        Self { state, clipboard, view, stop_tx }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies one event to the state and performs its side effects.
    pub fn handle(&mut self, event: DaemonEvent) -> Flow {
        match event {
            DaemonEvent::ClipboardChanged(text) => {
                self.on_clipboard_changed(&text);
                Flow::Continue
            }

            DaemonEvent::ToggleMonitoring => {
                let monitoring = self.state.toggle_monitoring();
                self.view
                    .set_label(MenuSlot::Monitoring, self.state.monitoring_label());
                info!(monitoring, "Monitoring toggled");
                Flow::Continue
            }

            DaemonEvent::ToggleSubstitute => {
                let substitute = self.state.toggle_substitute();
                self.view
                    .set_label(MenuSlot::Substitute, self.state.substitute_label());
                info!(?substitute, "Substitute toggled");
                Flow::Continue
            }

            DaemonEvent::Quit => {
                info!("Quit requested");
                self.stop_tx.send_replace(true);
                self.view.exit();
                Flow::Stop
            }
        }
    }

    fn on_clipboard_changed(&self, text: &str) {
        if !self.state.monitoring {
            debug!("Clipboard changed but not monitoring");
            return;
        }
        if text.is_empty() {
            debug!("Clipboard changed but empty");
            return;
        }
        trace!(content = text, "Clipboard changed");

        let normalized = normalize(text, self.state.substitute.as_str());
        // Writing identical text back would only trigger another notification.
        if normalized == text {
            debug!("Clipboard text has no single line breaks");
            return;
        }

        match self.clipboard.write_text(&normalized) {
            Ok(()) => {
                trace!(content = %normalized, "Clipboard rewritten");
                info!(
                    before = text.len(),
                    after = normalized.len(),
                    "Normalized clipboard text"
                );
            }
            Err(e) => error!(error = %e, "Failed to write normalized text to clipboard"),
        }
    }

    /// Consumes events until quit or until every sender is gone, then makes
    /// sure the stop signal is raised.
    pub async fn run(mut self, mut events: mpsc::Receiver<DaemonEvent>) {
        info!(state = ?self.state(), "Dispatcher started");
        while let Some(evt) = events.recv().await {
            if self.handle(evt) == Flow::Stop {
                break;
            }
        }
        self.stop_tx.send_replace(true);
        info!("Dispatcher stopped");
    }
}
