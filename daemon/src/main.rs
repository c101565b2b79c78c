#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

mod clipboard;
mod config;
mod dispatcher;
mod event;
mod logging;
mod normalize;
mod state;
mod tray;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::clipboard::{ClipboardWatch, SystemClipboard};
use crate::dispatcher::Dispatcher;
use crate::event::DaemonEvent;
use crate::tray::TrayHandle;

fn main() -> Result<()> {
    let config = config::Config::default();
    logging::init(&config.log_filter);

    // ── Clipboard ─────────────────────────────────────────────────────────────
    // Nothing works without clipboard access, so this is the one fatal error.
    let clipboard = match SystemClipboard::new() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Clipboard initialisation failed");
            std::process::exit(1);
        }
    };

    // ── Runtime and tray loop ─────────────────────────────────────────────────
    // The tray loop owns the main thread; dispatcher and watcher run on tokio.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("linefold-worker")
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let event_loop = tray::build_event_loop()?;

    let (event_tx, event_rx) = mpsc::channel::<DaemonEvent>(config.event_channel_capacity);
    let (stop_tx, stop_rx) = watch::channel(false);

    // ── Background tasks ──────────────────────────────────────────────────────
    let clipboard_watch = match ClipboardWatch::start(clipboard.clone(), event_tx.clone()) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Clipboard watch failed to start");
            std::process::exit(1);
        }
    };
    let watch_task = runtime.spawn(clipboard_watch.run_until(stop_rx));

    let dispatcher = Dispatcher::new(
        config.initial_state(),
        clipboard,
        TrayHandle::new(event_loop.create_proxy()),
        stop_tx,
    );
    let dispatcher_task = runtime.spawn(dispatcher.run(event_rx));

    tray::forward_menu_events(event_tx.clone(), event_loop.create_proxy());

    info!("linefold v{} started", env!("CARGO_PKG_VERSION"));

    // ── Tray loop (blocks until quit) ─────────────────────────────────────────
    let tray_result = tray::run(event_loop, &config.title, config.initial_state());

    // A Quit click ends the loop directly; the dispatcher learns about it here.
    // This also covers a loop that ended for another reason (tray creation failed).
    let _ = event_tx.blocking_send(DaemonEvent::Quit);
    drop(event_tx);

    runtime.block_on(async {
        let _ = dispatcher_task.await;
        let _ = watch_task.await;
    });

    info!("Shutting down");
    tray_result
}
