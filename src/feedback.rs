use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    /// How long a message of this severity stays visible.
    pub fn default_duration(&self) -> Duration {
        match self {
            Severity::Info | Severity::Success => Duration::from_secs(3),
            Severity::Warning => Duration::from_secs(4),
            Severity::Danger => Duration::from_secs(5),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub message: String,
    pub severity: Severity,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl Feedback {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            duration: severity.default_duration(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Severity::Danger, message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Single-slot message channel: the newest message replaces the previous one
/// and each message disappears once its duration has elapsed.
#[derive(Debug, Default)]
pub struct FeedbackChannel {
    slot: Mutex<Option<(Feedback, Instant)>>,
}

impl FeedbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, feedback: Feedback) {
        *self.slot.lock() = Some((feedback, Instant::now()));
    }

    /// The visible message, if it has not been dismissed yet.
    pub fn current(&self) -> Option<Feedback> {
        self.current_at(Instant::now())
    }

    fn current_at(&self, now: Instant) -> Option<Feedback> {
        let mut guard = self.slot.lock();
        let expired = guard
            .as_ref()
            .is_some_and(|(feedback, posted)| now.duration_since(*posted) >= feedback.duration);
        if expired {
            *guard = None;
        }
        guard.as_ref().map(|(feedback, _)| feedback.clone())
    }

    /// The last posted message regardless of expiry.
    pub fn latest(&self) -> Option<Feedback> {
        self.slot.lock().as_ref().map(|(feedback, _)| feedback.clone())
    }

    pub fn dismiss(&self) {
        *self.slot.lock() = None;
    }
}
