use anyhow::{Context, Result, anyhow};
use arboard::Clipboard;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::warn;

/// Something that can accept clipboard writes.
///
/// Starting a write is synchronous and may fail on its own (no clipboard, worker
/// gone). Completion is reported later through the returned [`PendingWrite`].
pub trait ClipboardSink: Send + Sync {
    fn write_text(&self, text: String) -> Result<PendingWrite>;
}

/// Completion signal for a clipboard write that has been started.
#[derive(Debug)]
pub struct PendingWrite {
    rx: oneshot::Receiver<Result<()>>,
}

impl PendingWrite {
    pub fn new(rx: oneshot::Receiver<Result<()>>) -> Self {
        Self { rx }
    }

    /// A write whose outcome is already known.
    pub fn ready(result: Result<()>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    pub async fn completed(self) -> Result<()> {
        let result = self
            .rx
            .await
            .context("Clipboard write was abandoned before completing")?;
        result
    }
}

struct WriteRequest {
    text: String,
    done: oneshot::Sender<Result<()>>,
}

/// System clipboard backed by `arboard`.
///
/// The platform clipboard lives on its own worker thread for as long as this
/// value exists. On Linux the selection belongs to that thread, so copied text
/// is served only while the process runs. A short-lived process should use
/// [`ArboardClipboard::with_handoff`] so a clipboard manager can take the
/// selection over before exit.
pub struct ArboardClipboard {
    tx: mpsc::Sender<WriteRequest>,
}

impl ArboardClipboard {
    pub fn new() -> Result<Self> {
        Self::spawn(None)
    }

    /// Like [`ArboardClipboard::new`], but on Linux each write waits up to
    /// `window` for a clipboard manager to take ownership before it completes.
    /// Other platforms keep the text after exit anyway and ignore `window`.
    pub fn with_handoff(window: Duration) -> Result<Self> {
        Self::spawn(Some(window))
    }

    fn spawn(handoff: Option<Duration>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<WriteRequest>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        thread::Builder::new()
            .name("clipboard".to_string())
            .spawn(move || {
                let mut clipboard = match Clipboard::new().context("Failed to access system clipboard") {
                    Ok(clipboard) => {
                        let _ = ready_tx.send(Ok(()));
                        clipboard
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                for request in rx {
                    let result = set_text(&mut clipboard, request.text, handoff)
                        .context("Failed to copy text to clipboard");
                    let _ = request.done.send(result);
                }
            })
            .context("Failed to start clipboard worker")?;

        ready_rx
            .recv()
            .context("Clipboard worker exited during startup")??;

        Ok(Self { tx })
    }
}

#[cfg(target_os = "linux")]
fn set_text(clipboard: &mut Clipboard, text: String, handoff: Option<Duration>) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    match handoff {
        Some(window) => clipboard
            .set()
            .wait_until(std::time::Instant::now() + window)
            .text(text),
        None => clipboard.set_text(text),
    }
}

#[cfg(not(target_os = "linux"))]
fn set_text(clipboard: &mut Clipboard, text: String, _handoff: Option<Duration>) -> Result<(), arboard::Error> {
    clipboard.set_text(text)
}

impl ClipboardSink for ArboardClipboard {
    fn write_text(&self, text: String) -> Result<PendingWrite> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(WriteRequest { text, done })
            .map_err(|_| anyhow!("Clipboard worker is not running"))?;
        Ok(PendingWrite::new(rx))
    }
}

/// Stand-in used when the system clipboard could not be opened at startup.
/// Every write fails when it starts, with the original reason.
pub struct UnavailableClipboard {
    reason: String,
}

impl UnavailableClipboard {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ClipboardSink for UnavailableClipboard {
    fn write_text(&self, _text: String) -> Result<PendingWrite> {
        Err(anyhow!("Clipboard unavailable: {}", self.reason))
    }
}

/// Open the system clipboard, falling back to [`UnavailableClipboard`].
/// `handoff` is passed to [`ArboardClipboard::with_handoff`] when set.
pub fn system_clipboard(handoff: Option<Duration>) -> Arc<dyn ClipboardSink> {
    let opened = match handoff {
        Some(window) => ArboardClipboard::with_handoff(window),
        None => ArboardClipboard::new(),
    };
    match opened {
        Ok(clipboard) => Arc::new(clipboard),
        Err(err) => {
            let reason = format!("{err:#}");
            warn!(error = %reason, "system clipboard unavailable");
            Arc::new(UnavailableClipboard::new(reason))
        }
    }
}
