//! User-facing notices. Delivery is fire-and-forget.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A short message for the learner, e.g. a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    #[must_use]
    pub fn sign_in_required() -> Self {
        Self::new(
            "Authentication Required",
            "Please sign in to submit answers.",
            Severity::Error,
        )
    }

    #[must_use]
    pub fn submit_failed() -> Self {
        Self::new(
            "Error",
            "Failed to submit answer. Please try again.",
            Severity::Error,
        )
    }

    #[must_use]
    pub fn progress_failed() -> Self {
        Self::new(
            "Error",
            "Failed to update progress. Please try again.",
            Severity::Error,
        )
    }

    #[must_use]
    pub fn answer_result(correct: bool) -> Self {
        if correct {
            Self::new(
                "Correct!",
                "Great job! Your answer is correct.",
                Severity::Success,
            )
        } else {
            Self::new(
                "Incorrect",
                "That's not quite right. Try again!",
                Severity::Error,
            )
        }
    }
}

/// Sink for learner notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Error => {
                tracing::warn!(title = %notice.title, "{}", notice.description);
            }
            Severity::Info | Severity::Success => {
                tracing::info!(title = %notice.title, "{}", notice.description);
            }
        }
    }
}

/// Collects notices in memory; used by tests and headless callers.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Drain and return the notices received so far.
    pub fn take(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut guard) = self.notices.lock() {
            guard.push(notice);
        }
    }
}
