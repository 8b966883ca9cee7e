use crate::clipboard::ClipboardSink;
use crate::dom::{Document, NodeId};
use crate::page::{ClickEvent, EventContext, Listener, ListenerId, Page, TaskQueue};
use anyhow::{Context, Result, anyhow, bail};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

pub const COPY_CONTROL_ID: &str = "copy-json";
pub const PAYLOAD_ATTRIBUTE: &str = "data-json";
pub const IDLE_LABEL: &str = "Copy JSON";
pub const CONFIRM_LABEL: &str = "Copied!";
pub const CONFIRMATION_WINDOW: Duration = Duration::from_millis(1200);

/// Copies the `data-json` payload of the `copy-json` control to the clipboard.
///
/// Registered once on the page and sees every click; anything not targeting
/// the copy control is ignored without side effects. The label switches to
/// [`CONFIRM_LABEL`] only after the write completes, then reverts after the
/// confirmation window. Overlapping clicks each run their own revert timer.
pub struct ClickToCopyHandler {
    clipboard: Arc<dyn ClipboardSink>,
    confirm_delay: Duration,
    outcomes: Option<mpsc::UnboundedSender<Result<()>>>,
}

impl ClickToCopyHandler {
    pub fn new(clipboard: Arc<dyn ClipboardSink>) -> Self {
        Self {
            clipboard,
            confirm_delay: CONFIRMATION_WINDOW,
            outcomes: None,
        }
    }

    pub fn with_confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = delay;
        self
    }

    /// Also send the outcome of every copy attempt to `tx`, after it has been
    /// logged. A success is sent once the confirmation has been posted.
    pub fn with_outcomes(mut self, tx: mpsc::UnboundedSender<Result<()>>) -> Self {
        self.outcomes = Some(tx);
        self
    }
}

fn report(outcomes: &Option<mpsc::UnboundedSender<Result<()>>>, outcome: Result<()>) {
    if let Some(tx) = outcomes {
        let _ = tx.send(outcome);
    }
}

impl Listener for ClickToCopyHandler {
    fn on_click(&mut self, event: &ClickEvent, cx: &mut EventContext<'_>) {
        let Some(node) = event.target else {
            return;
        };
        let Some(control) = cx.document.get(node) else {
            return;
        };
        if control.id != COPY_CONTROL_ID {
            return;
        }

        // Absent attribute is passed through as an empty payload.
        let payload = control
            .attribute(PAYLOAD_ATTRIBUTE)
            .unwrap_or_default()
            .to_string();

        let pending = match self.clipboard.write_text(payload) {
            Ok(pending) => pending,
            Err(err) => {
                error!(error = ?err, "failed to start clipboard write");
                report(&self.outcomes, Err(err));
                return;
            }
        };

        let delay = self.confirm_delay;
        let tasks = cx.tasks.clone();
        let outcomes = self.outcomes.clone();
        cx.tasks.spawn(async move {
            match pending.completed().await {
                Ok(()) => {
                    tasks.post(move |doc, tasks| confirm(doc, tasks, node, delay));
                    report(&outcomes, Ok(()));
                }
                Err(err) => {
                    warn!(error = ?err, "clipboard write failed");
                    report(&outcomes, Err(err));
                }
            }
        });
    }
}

fn confirm(doc: &mut Document, tasks: &TaskQueue, node: NodeId, delay: Duration) {
    if let Some(control) = doc.get_mut(node) {
        control.set_text(CONFIRM_LABEL);
        debug!(control = %control.id, "payload copied");
    }
    tasks.post_after(delay, move |doc, _| {
        if let Some(control) = doc.get_mut(node) {
            control.set_text(IDLE_LABEL);
        }
    });
}

/// Register a [`ClickToCopyHandler`] on `page`. Keep the returned id to detach it.
pub fn install_copy_handler(
    page: &mut Page,
    clipboard: Arc<dyn ClipboardSink>,
    confirm_delay: Duration,
) -> ListenerId {
    page.add_listener(ClickToCopyHandler::new(clipboard).with_confirm_delay(confirm_delay))
}

/// Click the copy control once and wait for that copy to finish.
///
/// Failures come back as the error, whether the write failed to start or
/// failed later. On success the control already shows [`CONFIRM_LABEL`] and
/// its revert is scheduled. The handler used here is detached before returning.
pub async fn copy_once(
    page: &mut Page,
    clipboard: Arc<dyn ClipboardSink>,
    confirm_delay: Duration,
    timeout: Duration,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handler = ClickToCopyHandler::new(clipboard)
        .with_confirm_delay(confirm_delay)
        .with_outcomes(tx);
    let listener = page.add_listener(handler);
    let clicked = page.click_by_id(COPY_CONTROL_ID);
    page.remove_listener(listener);

    if !clicked {
        bail!("Page has no {COPY_CONTROL_ID} control");
    }

    let outcome = tokio::time::timeout(timeout, rx.recv())
        .await
        .map_err(|_| anyhow!("Timed out after {timeout:?} waiting for the clipboard"))?
        .ok_or_else(|| anyhow!("Clipboard write was abandoned before completing"))?;
    outcome.context("Payload was not copied")?;

    page.run_pending();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::fake::{FakeClipboard, Outcome};
    use crate::dom::Element;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::Mutex;
    use tokio::time::advance;
    use tracing::subscriber::DefaultGuard;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .map(str::to_string)
                .collect()
        }

        /// Lines that start a log entry, ignoring any backtrace continuation.
        fn entries(&self) -> Vec<String> {
            self.lines()
                .into_iter()
                .filter(|line| line.contains(" ERROR ") || line.contains(" WARN "))
                .collect()
        }
    }

    /// Capture warnings and errors emitted on this thread.
    fn capture_diagnostics() -> (LogBuffer, DefaultGuard) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    fn page_with(payload: Option<&str>, outcome: Outcome) -> (Page, Arc<FakeClipboard>) {
        let mut copy = Element::new(COPY_CONTROL_ID, IDLE_LABEL);
        if let Some(payload) = payload {
            copy.set_attribute(PAYLOAD_ATTRIBUTE, payload);
        }

        let mut doc = Document::new();
        doc.push(copy);
        doc.push(Element::new("other-button", "Other").with_attribute(PAYLOAD_ATTRIBUTE, "nope"));

        let clipboard = FakeClipboard::new(outcome);
        let mut page = Page::new(doc);
        install_copy_handler(&mut page, clipboard.clone(), CONFIRMATION_WINDOW);
        (page, clipboard)
    }

    fn build_copy_document(payload: &str) -> Document {
        let mut doc = Document::new();
        doc.push(Element::new(COPY_CONTROL_ID, IDLE_LABEL).with_attribute(PAYLOAD_ATTRIBUTE, payload));
        doc
    }

    fn label(page: &Page, id: &str) -> String {
        page.document().element_by_id(id).unwrap().text.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_confirms_then_reverts_after_window() {
        let (mut page, clipboard) = page_with(Some(r#"{"a":1}"#), Outcome::Succeed);

        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;

        assert_eq!(clipboard.writes(), vec![r#"{"a":1}"#.to_string()]);
        assert_eq!(label(&page, COPY_CONTROL_ID), CONFIRM_LABEL);

        advance(Duration::from_millis(1199)).await;
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), CONFIRM_LABEL);

        advance(Duration::from_millis(1)).await;
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_label_waits_for_write_completion() {
        let (mut page, clipboard) = page_with(Some("X"), Outcome::Succeed);

        page.click_by_id(COPY_CONTROL_ID);

        assert_eq!(clipboard.writes(), vec!["X".to_string()]);
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_control_is_ignored() {
        let (logs, _guard) = capture_diagnostics();
        let (mut page, clipboard) = page_with(Some("X"), Outcome::Succeed);

        page.click_by_id("other-button");
        page.settle().await;

        assert!(clipboard.writes().is_empty());
        assert_eq!(label(&page, "other-button"), "Other");
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
        assert!(logs.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_without_target_is_ignored() {
        let (logs, _guard) = capture_diagnostics();
        let (mut page, clipboard) = page_with(Some("X"), Outcome::Succeed);

        page.dispatch_click(None);
        page.settle().await;

        assert!(clipboard.writes().is_empty());
        assert!(logs.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_failure_logs_once_and_keeps_label() {
        let (logs, _guard) = capture_diagnostics();
        let (mut page, clipboard) = page_with(Some("X"), Outcome::FailToStart);

        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;
        advance(CONFIRMATION_WINDOW).await;
        page.settle().await;

        assert_eq!(clipboard.writes().len(), 1);
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);

        let lines = logs.entries();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR"));
        assert!(lines[0].contains("clipboard unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_failure_keeps_label_and_warns() {
        let (logs, _guard) = capture_diagnostics();
        let (mut page, _clipboard) = page_with(Some("X"), Outcome::FailToComplete);

        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;

        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
        let lines = logs.entries();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("write rejected"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_payload_is_copied_as_empty() {
        let (mut page, clipboard) = page_with(None, Outcome::Succeed);

        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;

        assert_eq!(clipboard.writes(), vec![String::new()]);
        assert_eq!(label(&page, COPY_CONTROL_ID), CONFIRM_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_cycles_are_identical() {
        let (mut page, clipboard) = page_with(Some("X"), Outcome::Succeed);

        let mut cycles = Vec::new();
        for _ in 0..2 {
            let mut observed = vec![label(&page, COPY_CONTROL_ID)];
            page.click_by_id(COPY_CONTROL_ID);
            page.settle().await;
            observed.push(label(&page, COPY_CONTROL_ID));
            advance(CONFIRMATION_WINDOW).await;
            page.settle().await;
            observed.push(label(&page, COPY_CONTROL_ID));
            cycles.push(observed);
        }

        assert_eq!(cycles[0], vec![IDLE_LABEL, CONFIRM_LABEL, IDLE_LABEL]);
        assert_eq!(cycles[0], cycles[1]);
        assert_eq!(clipboard.writes(), vec!["X".to_string(), "X".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_clicks_run_independent_timers() {
        let (mut page, clipboard) = page_with(Some("X"), Outcome::Succeed);

        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;
        advance(Duration::from_millis(600)).await;
        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), CONFIRM_LABEL);

        // The first timer reverts the label even though the second window is still open.
        advance(Duration::from_millis(600)).await;
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);

        advance(Duration::from_millis(600)).await;
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
        assert_eq!(clipboard.writes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_handler_no_longer_copies() {
        let mut doc = Document::new();
        doc.push(Element::new(COPY_CONTROL_ID, IDLE_LABEL).with_attribute(PAYLOAD_ATTRIBUTE, "X"));
        let clipboard = FakeClipboard::new(Outcome::Succeed);
        let mut page = Page::new(doc);

        let id = install_copy_handler(&mut page, clipboard.clone(), CONFIRMATION_WINDOW);
        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;
        assert_eq!(clipboard.writes().len(), 1);

        assert!(page.remove_listener(id));
        advance(CONFIRMATION_WINDOW).await;
        page.settle().await;
        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;

        assert_eq!(clipboard.writes().len(), 1);
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_failed_attempt() {
        let (mut page, clipboard) = page_with(Some("X"), Outcome::FailToStart);
        let (_logs, _guard) = capture_diagnostics();

        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);

        clipboard.set_outcome(Outcome::Succeed);
        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), CONFIRM_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_confirm_delay() {
        let mut doc = Document::new();
        doc.push(Element::new(COPY_CONTROL_ID, IDLE_LABEL).with_attribute(PAYLOAD_ATTRIBUTE, "X"));
        let mut page = Page::new(doc);
        install_copy_handler(
            &mut page,
            FakeClipboard::new(Outcome::Succeed),
            Duration::from_millis(300),
        );

        page.click_by_id(COPY_CONTROL_ID);
        page.settle().await;
        advance(Duration::from_millis(300)).await;
        page.settle().await;

        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_once_confirms_and_detaches() {
        let mut page = Page::new(build_copy_document("X"));
        let clipboard = FakeClipboard::new(Outcome::Succeed);

        copy_once(&mut page, clipboard.clone(), CONFIRMATION_WINDOW, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(clipboard.writes(), vec!["X".to_string()]);
        assert_eq!(label(&page, COPY_CONTROL_ID), CONFIRM_LABEL);
        assert_eq!(page.listener_count(), 0);

        advance(CONFIRMATION_WINDOW).await;
        page.settle().await;
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_once_returns_start_failure_immediately() {
        let mut page = Page::new(build_copy_document("X"));
        let started = tokio::time::Instant::now();

        let err = copy_once(
            &mut page,
            FakeClipboard::new(Outcome::FailToStart),
            CONFIRMATION_WINDOW,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(err.to_string(), "Payload was not copied");
        assert!(format!("{err:#}").contains("clipboard unavailable"));
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_once_returns_completion_failure() {
        let mut page = Page::new(build_copy_document("X"));
        let started = tokio::time::Instant::now();

        let err = copy_once(
            &mut page,
            FakeClipboard::new(Outcome::FailToComplete),
            CONFIRMATION_WINDOW,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(format!("{err:#}").contains("write rejected"));
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_once_times_out() {
        let mut page = Page::new(build_copy_document("X"));
        // Keeps the held completion senders alive past the listener's removal.
        let clipboard = FakeClipboard::new(Outcome::NeverComplete);

        let err = copy_once(&mut page, clipboard.clone(), CONFIRMATION_WINDOW, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Timed out"));
        assert_eq!(clipboard.writes(), vec!["X".to_string()]);
        assert_eq!(label(&page, COPY_CONTROL_ID), IDLE_LABEL);
    }

    #[tokio::test]
    async fn test_copy_once_without_control() {
        let mut page = Page::new(Document::new());
        let clipboard = FakeClipboard::new(Outcome::Succeed);

        let err = copy_once(&mut page, clipboard.clone(), CONFIRMATION_WINDOW, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no copy-json control"));
        assert!(clipboard.writes().is_empty());
    }
}
