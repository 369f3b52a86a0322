//! User-facing notices.
//!
//! The host shows these to whoever triggered the lifecycle hook. Logging is
//! separate: hooks log through `log` and additionally emit a notice.

use std::sync::Mutex;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational.
    Status,
    /// Something failed.
    Error,
}

/// A notice as recorded by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

/// Sink for user-facing notices (the host's messenger).
pub trait Notifier: Send + Sync {
    /// Informational notice.
    fn status(&self, message: &str);

    /// Error notice.
    fn error(&self, message: &str);
}

/// Notifier that forwards notices to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn status(&self, message: &str) {
        log::info!(target: "searchbridge::notice", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "searchbridge::notice", "{message}");
    }
}

/// Notifier that keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices in emission order.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Messages of error notices.
    pub fn errors(&self) -> Vec<String> {
        self.messages(NoticeLevel::Error)
    }

    /// Messages of status notices.
    pub fn statuses(&self) -> Vec<String> {
        self.messages(NoticeLevel::Status)
    }

    fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                level,
                message: message.to_string(),
            });
        }
    }
}

impl Notifier for RecordingNotifier {
    fn status(&self, message: &str) {
        self.push(NoticeLevel::Status, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }
}
