//! Page-level event loop.
//!
//! A [`Page`] owns the [`Document`] and a single click dispatcher. Listeners
//! are registered on the page, not on individual elements, and decide for
//! themselves which targets they care about.
//!
//! Work that finishes later (clipboard completions, timers) never touches the
//! document from another task. It posts a [`Task`] back to the page, and the
//! page applies it on its next turn.

use crate::dom::{Document, NodeId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Number of scheduler yields per `settle` round. Enough for a spawned task
/// to observe a ready completion and post its follow-up.
const SETTLE_YIELDS: usize = 8;

pub type Task = Box<dyn FnOnce(&mut Document, &TaskQueue) + Send>;

/// Handle for posting work back onto the page.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce(&mut Document, &TaskQueue) + Send + 'static,
    {
        // Only fails once the page is gone, and then nobody is left to see it.
        let _ = self.tx.send(Box::new(task));
    }

    /// Post `task` once `delay` has elapsed, counted from now.
    pub fn post_after<F>(&self, delay: Duration, task: F)
    where
        F: FnOnce(&mut Document, &TaskQueue) + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let queue = self.clone();
        tokio::spawn(async move {
            sleep_until(deadline).await;
            queue.post(task);
        });
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: Option<NodeId>,
}

pub struct EventContext<'a> {
    pub document: &'a mut Document,
    pub tasks: &'a TaskQueue,
}

pub trait Listener {
    fn on_click(&mut self, event: &ClickEvent, cx: &mut EventContext<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct Page {
    document: Document,
    listeners: Vec<(ListenerId, Box<dyn Listener>)>,
    next_listener_id: u64,
    queue: TaskQueue,
    rx: mpsc::UnboundedReceiver<Task>,
}

impl Page {
    pub fn new(document: Document) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            document,
            listeners: Vec::new(),
            next_listener_id: 0,
            queue: TaskQueue { tx },
            rx,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn add_listener(&mut self, listener: impl Listener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Detach a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver a click to every listener, in registration order.
    pub fn dispatch_click(&mut self, target: Option<NodeId>) {
        let event = ClickEvent { target };
        for (_, listener) in self.listeners.iter_mut() {
            let mut cx = EventContext {
                document: &mut self.document,
                tasks: &self.queue,
            };
            listener.on_click(&event, &mut cx);
        }
    }

    /// Click the first element with `id`. Returns false when no such element
    /// exists, in which case nothing is dispatched.
    pub fn click_by_id(&mut self, id: &str) -> bool {
        match self.document.find_by_id(id) {
            Some(node) => {
                self.dispatch_click(Some(node));
                true
            }
            None => false,
        }
    }

    /// Apply every task that has already been posted. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(&mut self.document, &self.queue);
            ran += 1;
        }
        ran
    }

    /// Let spawned work make progress and apply whatever it posts, until a
    /// round produces nothing new. Does not wait on timers.
    pub async fn settle(&mut self) {
        loop {
            for _ in 0..SETTLE_YIELDS {
                tokio::task::yield_now().await;
            }
            if self.run_pending() == 0 {
                break;
            }
        }
    }

    /// Keep applying tasks as they arrive until `duration` has elapsed.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => break,
                Some(task) = self.rx.recv() => task(&mut self.document, &self.queue),
            }
        }
        self.run_pending();
    }

    /// Apply tasks as they arrive until `done` holds for the document or
    /// `timeout` elapses. Returns whether `done` was reached.
    pub async fn run_until<F>(&mut self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut(&Document) -> bool,
    {
        self.run_pending();
        if done(&self.document) {
            return true;
        }

        let deadline = Instant::now() + timeout;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return false,
                Some(task) = self.rx.recv() => {
                    task(&mut self.document, &self.queue);
                    if done(&self.document) {
                        return true;
                    }
                }
            }
        }
    }
}
