//! Transient, single-slot user notifications
//!
//! A new message replaces whatever is showing and restarts the clear timer.
//! Subscribers observe the slot through a `watch` channel, so a slow reader
//! only ever sees the latest message.

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a message stays visible
pub const NOTIFICATION_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
}

#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    slot: watch::Sender<Option<Notification>>,
    generation: AtomicU64,
    timer: Mutex<Option<JoinHandle<()>>>,
    lifetime: Duration,
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_lifetime(NOTIFICATION_LIFETIME)
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            inner: Arc::new(NotifierInner {
                slot,
                generation: AtomicU64::new(0),
                timer: Mutex::new(None),
                lifetime,
            }),
        }
    }

    /// Show `message`, or clear the slot with `None`.
    ///
    /// Must be called from within a Tokio runtime; the auto-clear timer is a
    /// spawned task.
    pub fn notify(&self, message: Option<String>) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut timer = self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        let Some(message) = message else {
            self.inner.slot.send_replace(None);
            return;
        };

        debug!("Notification: {}", message);
        self.inner.slot.send_replace(Some(Notification { message }));

        let inner = self.inner.clone();
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.lifetime).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.slot.send_replace(None);
            }
        }));
    }

    /// Show a message
    pub fn show(&self, message: impl Into<String>) {
        self.notify(Some(message.into()));
    }

    /// Clear immediately and cancel the pending timer
    pub fn clear(&self) {
        self.notify(None);
    }

    /// The message currently showing, if any
    pub fn current(&self) -> Option<String> {
        self.inner.slot.borrow().as_ref().map(|n| n.message.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.slot.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
