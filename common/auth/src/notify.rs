use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

pub const UNAUTHORIZED_MESSAGE: &str = "You are not authorized to access this page.";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Error,
    Success,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Error => "error",
            NotificationKind::Success => "success",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// Capability to show a transient message to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);
}

/// Emits notifications as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Error => warn!(kind = %kind, "{message}"),
            NotificationKind::Success => info!(kind = %kind, "{message}"),
        }
    }
}

/// Keeps notifications until the caller drains them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    inner: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().expect("mutex poisoned").clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.inner.lock().expect("mutex poisoned"))
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        self.inner.lock().expect("mutex poisoned").push(Notification {
            message: message.to_string(),
            kind,
        });
    }
}
