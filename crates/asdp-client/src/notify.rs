//! Notification channel: timed toast messages.
//!
//! Each toast gets its own expiry task. Dismissing a toast early aborts
//! that task; nothing else touches it, so toasts expire independently of
//! each other and of in-flight requests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// How long a toast stays visible.
pub const TOAST_TTL: Duration = Duration::from_millis(3000);

/// Capacity of the broadcast channel feeding [`Notifier::subscribe`].
const EVENT_CAPACITY: usize = 64;

/// Unique toast identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ToastId(Uuid);

impl ToastId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome a toast reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Unique id.
    pub id: ToastId,
    /// Success or error.
    pub kind: ToastKind,
    /// Text shown to the user.
    pub message: String,
}

#[derive(Default)]
struct Queue {
    toasts: Vec<Toast>,
    timers: HashMap<ToastId, JoinHandle<()>>,
}

impl Queue {
    fn remove(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        before != self.toasts.len()
    }
}

/// Toast queue with per-toast expiry.
///
/// Cloning yields another handle to the same queue. [`Notifier::notify`]
/// spawns a tokio task and must be called from within a runtime.
#[derive(Clone)]
pub struct Notifier {
    queue: Arc<Mutex<Queue>>,
    events: broadcast::Sender<Toast>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("toasts", &self.toasts())
            .finish_non_exhaustive()
    }
}

fn lock(queue: &Mutex<Queue>) -> MutexGuard<'_, Queue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Notifier {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            queue: Arc::new(Mutex::new(Queue::default())),
            events,
        }
    }

    /// Append a toast and schedule its removal after [`TOAST_TTL`].
    pub fn notify(&self, kind: ToastKind, message: impl Into<String>) -> ToastId {
        let toast = Toast {
            id: ToastId::new(),
            kind,
            message: message.into(),
        };

        match kind {
            ToastKind::Success => tracing::info!(toast = %toast.id, "{}", toast.message),
            ToastKind::Error => tracing::warn!(toast = %toast.id, "{}", toast.message),
        }

        let id = toast.id;
        {
            let mut queue = lock(&self.queue);
            queue.toasts.push(toast.clone());
            let timer = tokio::spawn(expire(Arc::downgrade(&self.queue), id));
            queue.timers.insert(id, timer);
        }

        // No subscribers is fine.
        let _ = self.events.send(toast);
        id
    }

    /// Shorthand for a success toast.
    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.notify(ToastKind::Success, message)
    }

    /// Shorthand for an error toast.
    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.notify(ToastKind::Error, message)
    }

    /// Remove a toast before it expires and cancel its timer.
    ///
    /// Returns `false` when the toast is already gone.
    pub fn dismiss(&self, id: ToastId) -> bool {
        let mut queue = lock(&self.queue);
        if let Some(timer) = queue.timers.remove(&id) {
            timer.abort();
        }
        queue.remove(id)
    }

    /// Visible toasts in insertion order.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        lock(&self.queue).toasts.clone()
    }

    /// Whether a toast is still visible.
    #[must_use]
    pub fn contains(&self, id: ToastId) -> bool {
        lock(&self.queue).toasts.iter().any(|toast| toast.id == id)
    }

    /// Receive every toast as it is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.events.subscribe()
    }
}

async fn expire(queue: Weak<Mutex<Queue>>, id: ToastId) {
    tokio::time::sleep(TOAST_TTL).await;
    if let Some(queue) = queue.upgrade() {
        let mut queue = lock(&queue);
        queue.timers.remove(&id);
        queue.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_after_ttl() {
        let notifier = Notifier::new();
        let id = notifier.error("X");
        assert!(notifier.contains(id));

        tokio::time::sleep(TOAST_TTL - Duration::from_millis(1)).await;
        assert!(notifier.contains(id));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!notifier.contains(id));
        assert!(notifier.toasts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toasts_expire_independently() {
        let notifier = Notifier::new();
        let first = notifier.success("first");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let second = notifier.error("second");
        let third = notifier.success("third");
        assert!(notifier.dismiss(third));

        let order: Vec<_> = notifier.toasts().into_iter().map(|t| t.id).collect();
        assert_eq!(order, vec![first, second]);

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert!(!notifier.contains(first));
        assert!(notifier.contains(second));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!notifier.contains(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_twice() {
        let notifier = Notifier::new();
        let id = notifier.success("saved");
        assert!(notifier.dismiss(id));
        assert!(!notifier.dismiss(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_are_kept() {
        let notifier = Notifier::new();
        notifier.error("same");
        notifier.error("same");
        assert_eq!(notifier.toasts().len(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_receives_toasts() {
        let notifier = Notifier::new();
        let mut events = notifier.subscribe();
        let id = notifier.success("File uploaded successfully");

        let toast = events.recv().await.unwrap();
        assert_eq!(toast.id, id);
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.message, "File uploaded successfully");
    }
}
