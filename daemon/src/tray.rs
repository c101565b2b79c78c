/// Tray icon and menu, driven by a `winit` event loop on the main thread.
///
/// The menu items are owned by the loop thread. The dispatcher changes them by
/// sending [`TrayCommand`]s through a [`TrayHandle`]; clicks travel the other
/// way as [`DaemonEvent`]s.
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};
use winit::event::{Event, StartCause};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};

use crate::dispatcher::TrayView;
use crate::event::{DaemonEvent, MenuSlot, TrayCommand};
use crate::state::{AppState, QUIT_LABEL};

pub const MONITORING_ITEM_ID: &str = "toggle-monitoring";
pub const SUBSTITUTE_ITEM_ID: &str = "toggle-substitute";
pub const QUIT_ITEM_ID: &str = "quit";

const ICON_PNG: &[u8] = include_bytes!("../assets/icon.png");

/// How often GTK gets a turn when the loop is otherwise idle.
#[cfg(target_os = "linux")]
const GTK_PUMP_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

/// Maps a clicked menu item to the event it stands for.
pub fn menu_event_for(id: &MenuId) -> Option<DaemonEvent> {
    match id.0.as_str() {
        MONITORING_ITEM_ID => Some(DaemonEvent::ToggleMonitoring),
        SUBSTITUTE_ITEM_ID => Some(DaemonEvent::ToggleSubstitute),
        QUIT_ITEM_ID => Some(DaemonEvent::Quit),
        _ => None,
    }
}

/// Delivers one menu click.
///
/// Quit never goes through the event channel, which a burst of clipboard
/// changes can fill: it calls `exit_loop` instead, and `main` hands `Quit` to
/// the dispatcher once the loop has ended.
pub fn deliver_click(id: &MenuId, tx: &mpsc::Sender<DaemonEvent>, exit_loop: impl FnOnce()) {
    match menu_event_for(id) {
        Some(DaemonEvent::Quit) => {
            info!("Quit clicked");
            exit_loop();
        }
        Some(evt) => {
            if let Err(e) = tx.try_send(evt) {
                warn!(error = %e, "Dropped menu click");
            }
        }
        None => debug!(?id, "Ignoring unknown menu item"),
    }
}

/// Routes menu clicks into the dispatcher channel, and Quit straight to the loop.
pub fn forward_menu_events(tx: mpsc::Sender<DaemonEvent>, proxy: EventLoopProxy<TrayCommand>) {
    let proxy = Mutex::new(proxy);
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        deliver_click(&event.id, &tx, || match proxy.lock() {
            Ok(proxy) => {
                if proxy.send_event(TrayCommand::Exit).is_err() {
                    debug!("Tray loop already closed");
                }
            }
            Err(_) => warn!("Tray proxy lock poisoned"),
        });
    }));
}

/// Decodes an embedded PNG into a tray icon. `None` when `bytes` is empty or
/// not a usable image; the tray then runs without an icon.
pub fn load_icon(bytes: &[u8]) -> Option<Icon> {
    if bytes.is_empty() {
        debug!("No embedded tray icon");
        return None;
    }
    let rgba = match image::load_from_memory_with_format(bytes, image::ImageFormat::Png) {
        Ok(image) => image.into_rgba8(),
        Err(e) => {
            warn!(error = %e, "Failed to decode tray icon");
            return None;
        }
    };
    let (width, height) = rgba.dimensions();
    match Icon::from_rgba(rgba.into_raw(), width, height) {
        Ok(icon) => Some(icon),
        Err(e) => {
            warn!(error = %e, "Invalid tray icon");
            None
        }
    }
}

pub fn build_event_loop() -> Result<EventLoop<TrayCommand>> {
    #[allow(unused_mut)]
    let mut builder = EventLoopBuilder::<TrayCommand>::with_user_event();

    #[cfg(target_os = "macos")]
    {
        use winit::platform::macos::{ActivationPolicy, EventLoopBuilderExtMacOS};
        // Menu-bar only: no dock icon, no app switcher entry.
        builder.with_activation_policy(ActivationPolicy::Accessory);
    }

    builder.build().context("failed to create tray event loop")
}

// ── Dispatcher-side handle ────────────────────────────────────────────────────

/// Sends label changes and exit requests to the tray loop.
pub struct TrayHandle {
    proxy: EventLoopProxy<TrayCommand>,
}

impl TrayHandle {
    pub fn new(proxy: EventLoopProxy<TrayCommand>) -> Self {
        Self { proxy }
    }

    fn send(&self, command: TrayCommand) {
        if self.proxy.send_event(command).is_err() {
            debug!("Tray loop already closed");
        }
    }
}

impl TrayView for TrayHandle {
    fn set_label(&self, slot: MenuSlot, label: &str) {
        self.send(TrayCommand::SetLabel(slot, label.to_owned()));
    }

    fn exit(&self) {
        self.send(TrayCommand::Exit);
    }
}

// ── Loop-side tray ────────────────────────────────────────────────────────────

struct Tray {
    _icon: TrayIcon,
    monitoring: MenuItem,
    substitute: MenuItem,
}

impl Tray {
    fn build(title: &str, state: &AppState) -> Result<Self> {
        let monitoring = MenuItem::with_id(MONITORING_ITEM_ID, state.monitoring_label(), true, None);
        let substitute = MenuItem::with_id(SUBSTITUTE_ITEM_ID, state.substitute_label(), true, None);
        let quit = MenuItem::with_id(QUIT_ITEM_ID, QUIT_LABEL, true, None);

        let menu = Menu::with_items(&[&monitoring, &substitute, &quit])
            .context("failed to build tray menu")?;

        let mut builder = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(title)
            .with_title(title);
        if let Some(icon) = load_icon(ICON_PNG) {
            builder = builder.with_icon(icon);
        }
        let icon = builder.build().context("failed to create tray icon")?;

        Ok(Self {
            _icon: icon,
            monitoring,
            substitute,
        })
    }

    fn set_label(&self, slot: MenuSlot, label: &str) {
        match slot {
            MenuSlot::Monitoring => self.monitoring.set_text(label),
            MenuSlot::Substitute => self.substitute.set_text(label),
        }
    }
}

/// Runs the tray until a [`TrayCommand::Exit`] arrives. Blocks the calling
/// thread, which must be the main thread.
///
/// The tray is created once the platform loop is up, with labels taken from
/// `initial`. Leaving the loop drops the icon and detaches the menu handler.
pub fn run(event_loop: EventLoop<TrayCommand>, title: &str, initial: AppState) -> Result<()> {
    #[cfg(target_os = "linux")]
    gtk::init().context("failed to initialise GTK")?;

    let title = title.to_owned();
    let mut tray: Option<Tray> = None;
    let build_failed = Rc::new(Cell::new(false));
    let failed = Rc::clone(&build_failed);

    event_loop
        .run(move |event, elwt| match event {
            Event::NewEvents(StartCause::Init) => match Tray::build(&title, &initial) {
                Ok(t) => {
                    info!("Tray ready");
                    tray = Some(t);
                }
                Err(e) => {
                    error!(error = %e, "Failed to create tray");
                    failed.set(true);
                    elwt.exit();
                }
            },

            Event::UserEvent(TrayCommand::SetLabel(slot, label)) => {
                if let Some(t) = &tray {
                    t.set_label(slot, &label);
                }
            }

            Event::UserEvent(TrayCommand::Exit) => elwt.exit(),

            Event::AboutToWait => {
                #[cfg(target_os = "linux")]
                {
                    while gtk::events_pending() {
                        gtk::main_iteration_do(false);
                    }
                    elwt.set_control_flow(ControlFlow::WaitUntil(
                        std::time::Instant::now() + GTK_PUMP_INTERVAL,
                    ));
                }
                #[cfg(not(target_os = "linux"))]
                elwt.set_control_flow(ControlFlow::Wait);
            }

            Event::LoopExiting => {
                MenuEvent::set_event_handler(None::<fn(MenuEvent)>);
                drop(tray.take());
                info!("Tray released");
            }

            _ => {}
        })
        .context("tray event loop failed")?;

    if build_failed.get() {
        bail!("tray could not be created");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── menu_event_for ────────────────────────────────────────────────────────

    #[test]
    fn monitoring_item_maps_to_toggle_monitoring() {
        assert!(matches!(
            menu_event_for(&MenuId::new(MONITORING_ITEM_ID)),
            Some(DaemonEvent::ToggleMonitoring)
        ));
    }

    #[test]
    fn substitute_item_maps_to_toggle_substitute() {
        assert!(matches!(
            menu_event_for(&MenuId::new(SUBSTITUTE_ITEM_ID)),
            Some(DaemonEvent::ToggleSubstitute)
        ));
    }

    #[test]
    fn quit_item_maps_to_quit() {
        assert!(matches!(
            menu_event_for(&MenuId::new(QUIT_ITEM_ID)),
            Some(DaemonEvent::Quit)
        ));
    }

    #[test]
    fn unknown_item_maps_to_nothing() {
        assert!(menu_event_for(&MenuId::new("about")).is_none());
        assert!(menu_event_for(&MenuId::new("")).is_none());
    }

    #[test]
    fn item_ids_are_distinct() {
        assert_ne!(MONITORING_ITEM_ID, SUBSTITUTE_ITEM_ID);
        assert_ne!(MONITORING_ITEM_ID, QUIT_ITEM_ID);
        assert_ne!(SUBSTITUTE_ITEM_ID, QUIT_ITEM_ID);
    }

    // ── deliver_click ─────────────────────────────────────────────────────────

    #[test]
    fn quit_exits_the_loop_even_when_the_channel_is_full() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(tx.try_send(DaemonEvent::ClipboardChanged("backlog".into())).is_ok());

        let mut exited = false;
        deliver_click(&MenuId::new(QUIT_ITEM_ID), &tx, || exited = true);

        assert!(exited);
        // Only the backlog is queued; Quit did not compete for channel space.
        assert!(matches!(rx.try_recv(), Ok(DaemonEvent::ClipboardChanged(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn toggles_are_queued_without_exiting() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut exited = false;

        deliver_click(&MenuId::new(MONITORING_ITEM_ID), &tx, || exited = true);
        deliver_click(&MenuId::new(SUBSTITUTE_ITEM_ID), &tx, || exited = true);

        assert!(!exited);
        assert!(matches!(rx.try_recv(), Ok(DaemonEvent::ToggleMonitoring)));
        assert!(matches!(rx.try_recv(), Ok(DaemonEvent::ToggleSubstitute)));
    }

    #[test]
    fn unknown_click_does_nothing() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut exited = false;
        deliver_click(&MenuId::new("about"), &tx, || exited = true);
        assert!(!exited);
        assert!(rx.try_recv().is_err());
    }

    // ── load_icon ─────────────────────────────────────────────────────────────

    #[test]
    fn empty_icon_is_skipped() {
        assert!(load_icon(&[]).is_none());
    }

    #[test]
    fn garbage_icon_is_skipped() {
        assert!(load_icon(b"not a png").is_none());
    }

    #[test]
    fn embedded_icon_decodes() {
        let image = image::load_from_memory_with_format(ICON_PNG, image::ImageFormat::Png)
            .expect("embedded icon is a valid PNG");
        assert_eq!((image.width(), image.height()), (32, 32));
    }
}
