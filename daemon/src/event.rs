pub enum DaemonEvent {
    /// The clipboard now holds this text.
    ClipboardChanged(String),
    /// "Start/Stop Monitoring" was clicked.
    ToggleMonitoring,
    /// "Substitute With ..." was clicked.
    ToggleSubstitute,
    /// "Quit" was clicked, or the tray loop went away.
    Quit,
}

/// Menu items whose label changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSlot {
    Monitoring,
    Substitute,
}

/// Requests from the dispatcher to the tray thread, which owns the menu items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayCommand {
    SetLabel(MenuSlot, String),
    Exit,
}
