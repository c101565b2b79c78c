/// System clipboard access and change notifications, backed by `clipboard-rs`.
///
/// The watcher runs `clipboard-rs`'s blocking watch loop on a dedicated OS
/// thread and forwards text changes into the dispatcher channel. It stops when
/// the shared stop signal is raised.
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use clipboard_rs::{
    Clipboard, ClipboardContext, ClipboardHandler, ClipboardWatcher, ClipboardWatcherContext,
    WatcherShutdown,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::dispatcher::ClipboardWriter;
use crate::event::DaemonEvent;

fn map_clipboard_err<T>(
    result: std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>,
) -> Result<T> {
    result.map_err(|e| anyhow!(e))
}

/// Shared handle to the platform clipboard.
#[derive(Clone)]
pub struct SystemClipboard {
    inner: Arc<Mutex<ClipboardContext>>,
}

impl SystemClipboard {
    /// Fails when the platform clipboard cannot be opened.
    pub fn new() -> Result<Self> {
        let context =
            map_clipboard_err(ClipboardContext::new()).context("clipboard is unavailable")?;
        Ok(Self {
            inner: Arc::new(Mutex::new(context)),
        })
    }

    /// Reads the text-format content. Errors when the clipboard holds no text.
    pub fn read_text(&self) -> Result<String> {
        let ctx = self.lock()?;
        map_clipboard_err(ctx.get_text())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClipboardContext>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("clipboard lock poisoned"))
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let ctx = self.lock()?;
        map_clipboard_err(ctx.set_text(text.to_owned())).context("failed to set clipboard text")
    }
}

/// Hands one clipboard read to the dispatcher. Returns whether an event was
/// queued. Failed reads (no text content) and a full channel drop the change.
pub fn forward_change(tx: &mpsc::Sender<DaemonEvent>, read: Result<String>) -> bool {
    let text = match read {
        Ok(text) => text,
        Err(e) => {
            debug!(error = %e, "Clipboard changed but holds no text");
            return false;
        }
    };
    // try_send never blocks the watch thread.
    match tx.try_send(DaemonEvent::ClipboardChanged(text)) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Dropped clipboard change");
            false
        }
    }
}

struct ChangeForwarder {
    clipboard: SystemClipboard,
    tx: mpsc::Sender<DaemonEvent>,
}

impl ClipboardHandler for ChangeForwarder {
    fn on_clipboard_change(&mut self) {
        forward_change(&self.tx, self.clipboard.read_text());
    }
}

/// A running clipboard watch thread.
pub struct ClipboardWatch {
    thread: std::thread::JoinHandle<()>,
    shutdown: WatcherShutdown,
}

impl ClipboardWatch {
    /// Subscribes to clipboard changes and starts forwarding them to `tx`.
    pub fn start(clipboard: SystemClipboard, tx: mpsc::Sender<DaemonEvent>) -> Result<Self> {
        let mut context = map_clipboard_err(ClipboardWatcherContext::<ChangeForwarder>::new())
            .context("failed to create clipboard watcher")?;

        let shutdown = context
            .add_handler(ChangeForwarder { clipboard, tx })
            .get_shutdown_channel();

        let thread = std::thread::Builder::new()
            .name("clipboard-watch".into())
            .spawn(move || {
                info!("Clipboard watch started");
                context.start_watch();
                info!("Clipboard watch exited");
            })
            .context("failed to spawn clipboard watch thread")?;

        Ok(Self { thread, shutdown })
    }

    /// Waits for the stop signal, then stops the watch loop and joins its thread.
    pub async fn run_until(self, mut stop: watch::Receiver<bool>) {
        // An error means the sender is gone, which is also a stop.
        let _ = stop.wait_for(|stopped| *stopped).await;

        let Self { thread, shutdown } = self;
        shutdown.stop();
        match tokio::task::spawn_blocking(move || thread.join()).await {
            Ok(Ok(())) => debug!("Clipboard watch thread joined"),
            Ok(Err(_)) => warn!("Clipboard watch thread panicked"),
            Err(e) => warn!(error = %e, "Failed to join clipboard watch thread"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received(rx: &mut mpsc::Receiver<DaemonEvent>) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(evt) = rx.try_recv() {
            if let DaemonEvent::ClipboardChanged(text) = evt {
                texts.push(text);
            }
        }
        texts
    }

    // ── forward_change ────────────────────────────────────────────────────────

    #[test]
    fn text_read_is_forwarded() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(forward_change(&tx, Ok("a\nb".into())));
        assert_eq!(received(&mut rx), vec!["a\nb"]);
    }

    #[test]
    fn repeated_text_is_forwarded_every_time() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(forward_change(&tx, Ok("a\nb".into())));
        assert!(forward_change(&tx, Ok("a\nb".into())));
        assert_eq!(received(&mut rx), vec!["a\nb", "a\nb"]);
    }

    #[test]
    fn failed_read_is_skipped() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(!forward_change(&tx, Err(anyhow!("no text on clipboard"))));
        assert!(received(&mut rx).is_empty());
    }

    #[test]
    fn full_channel_drops_the_change() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(forward_change(&tx, Ok("first".into())));
        assert!(!forward_change(&tx, Ok("second".into())));
        assert_eq!(received(&mut rx), vec!["first"]);
    }
}
