//! User-facing notices: blocking alerts and transient toasts

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;
use tracing::{error, info, warn};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Alerts need acknowledging; toasts go away on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Alert,
    Toast,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub presentation: Presentation,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl Notice {
    pub fn alert(kind: NoticeKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            presentation: Presentation::Alert,
            title: title.to_string(),
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn toast(kind: NoticeKind, message: impl Into<String>) -> Self {
        let title = match kind {
            NoticeKind::Info => "Info",
            NoticeKind::Success => "Success",
            NoticeKind::Warning => "Warning",
            NoticeKind::Error => "Error",
        };
        Self {
            presentation: Presentation::Toast,
            ..Self::alert(kind, title, message)
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::alert(NoticeKind::Success, "Success", message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::alert(NoticeKind::Error, "Error", message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            NoticeKind::Info => "i",
            NoticeKind::Success => "ok",
            NoticeKind::Warning => "!",
            NoticeKind::Error => "x",
        };
        write!(f, "[{}] {}: {}", marker, self.title, self.message)
    }
}

/// Queue of notices waiting to be shown, plus a bounded history
pub struct Notifier {
    pending: VecDeque<Notice>,
    history: Vec<Notice>,
    max_history: usize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            history: Vec::new(),
            max_history: 100,
        }
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn push(&mut self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => error!("{}: {}", notice.title, notice.message),
            NoticeKind::Warning => warn!("{}: {}", notice.title, notice.message),
            _ => info!("{}: {}", notice.title, notice.message),
        }

        self.history.push(notice.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }
        self.pending.push_back(notice);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notice::success(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notice::error(message));
    }

    pub fn toast(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.push(Notice::toast(kind, message));
    }

    /// Toast an operation's outcome; returns whether it succeeded
    pub fn toast_result<T: AsRef<str>>(&mut self, result: &Result<T, ApiError>) -> bool {
        match result {
            Ok(message) => {
                self.toast(NoticeKind::Success, message.as_ref());
                true
            }
            Err(e) => {
                self.toast(NoticeKind::Error, e.user_message());
                false
            }
        }
    }

    /// Take everything not yet shown, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn history(&self) -> &[Notice] {
        &self.history
    }

    pub fn last(&self) -> Option<&Notice> {
        self.history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_in_order() {
        let mut notifier = Notifier::new();
        notifier.success("Supplier added");
        notifier.toast(NoticeKind::Error, "Connection error. Please try again.");

        assert!(notifier.has_pending());
        let shown = notifier.drain();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].presentation, Presentation::Alert);
        assert_eq!(shown[1].presentation, Presentation::Toast);
        assert_eq!(shown[1].title, "Error");
        assert!(!notifier.has_pending());
        assert_eq!(notifier.history().len(), 2);
    }

    #[test]
    fn test_toast_result() {
        let mut notifier = Notifier::new();
        assert!(notifier.toast_result(&Ok::<_, ApiError>("Code sent")));
        assert!(!notifier.toast_result(&Err::<&str, _>(ApiError::Cancelled)));

        let shown = notifier.drain();
        assert_eq!(shown[0].kind, NoticeKind::Success);
        assert_eq!(shown[0].message, "Code sent");
        assert_eq!(shown[1].kind, NoticeKind::Error);
        assert!(shown.iter().all(|n| n.presentation == Presentation::Toast));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut notifier = Notifier::new().with_history(2);
        for i in 0..5 {
            notifier.toast(NoticeKind::Info, format!("notice {}", i));
        }
        assert_eq!(notifier.history().len(), 2);
        assert_eq!(notifier.last().unwrap().message, "notice 4");
    }

    #[test]
    fn test_display_line() {
        let notice = Notice::error("Proveedor en uso");
        assert_eq!(notice.to_string(), "[x] Error: Proveedor en uso");
    }
}
