//! User-facing notices raised by the flows

use std::fmt;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// A message meant for the person using the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Transient confirmation toast
    Success(String),

    /// Transient error toast
    Error(String),

    /// Blocking alert the user has to dismiss
    Alert(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(message) | Notice::Error(message) | Notice::Alert(message) => message,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Sink for notices; the embedding UI decides how to render them
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(message) => info!(target: "carmarket::notice", "{}", message),
            Notice::Error(message) => error!(target: "carmarket::notice", "{}", message),
            Notice::Alert(message) => warn!(target: "carmarket::notice", "{}", message),
        }
    }
}

/// Keeps every notice for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }

    pub fn clear(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
