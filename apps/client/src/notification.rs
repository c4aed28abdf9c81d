//! Notification control: one transient toast at a time.
//!
//! A new toast replaces the current one (no queue). Each toast owns a tokio
//! timer that clears it after its duration; replacing or dismissing the toast
//! aborts that timer so a stale callback can never clear a newer toast.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub duration: Duration,
}

#[derive(Default)]
struct Slot {
    active: Option<Toast>,
    timer: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            duration,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shows a toast, replacing any active one. Must run inside a tokio runtime.
    pub fn show(&self, kind: ToastKind, message: impl Into<String>) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
            duration: self.duration,
        };
        let id = toast.id;
        let deadline = tokio::time::Instant::now() + self.duration;

        let mut slot = self.lock();
        if let Some(previous) = slot.timer.take() {
            previous.abort();
        }
        slot.active = Some(toast);

        let shared = Arc::clone(&self.slot);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.active.as_ref().map(|t| t.id) == Some(id) {
                debug!("Toast {} expired", id);
                slot.active = None;
                slot.timer = None;
            }
        }));
        id
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.show(ToastKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.show(ToastKind::Error, message)
    }

    pub fn dismiss(&self) {
        let mut slot = self.lock();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.active = None;
    }

    pub fn current(&self) -> Option<Toast> {
        self.lock().active.clone()
    }
}
