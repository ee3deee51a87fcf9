use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    seq: u64,
}

impl Toast {
    pub fn is_success(&self) -> bool {
        self.kind == ToastKind::Success
    }
}

/// A single transient notification owned by one view.
///
/// Each toast dismisses itself after the timeout. Showing a new toast or
/// dropping the slot cancels the pending timer. Must be used inside a tokio
/// runtime.
pub struct ToastSlot {
    current: Arc<Mutex<Option<Toast>>>,
    timer: Option<JoinHandle<()>>,
    timeout: Duration,
    next_seq: u64,
}

impl Default for ToastSlot {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ToastSlot {
    pub fn new(timeout: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            timer: None,
            timeout,
            next_seq: 0,
        }
    }

    pub fn current(&self) -> Option<Toast> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(ToastKind::Success, message.into());
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.show(ToastKind::Failure, message.into());
    }

    pub fn show(&mut self, kind: ToastKind, message: String) {
        self.cancel_timer();
        self.next_seq += 1;
        let seq = self.next_seq;
        log::debug!("Toast ({:?}): {}", kind, message);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Toast { kind, message, seq });

        let slot = Arc::clone(&self.current);
        let timeout = self.timeout;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
            // Only clear the toast this timer was started for.
            if current.as_ref().is_some_and(|t| t.seq == seq) {
                *current = None;
            }
        }));
    }

    pub fn dismiss(&mut self) {
        self.cancel_timer();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ToastSlot {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
