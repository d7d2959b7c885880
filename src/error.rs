//! Error types for the quiz engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the quiz engine.
///
/// Remote lookup failures never appear here. They collapse into
/// [`crate::RelationResult::Unavailable`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    /// The learner submitted an empty or whitespace-only answer.
    #[error("please enter a {0}")]
    EmptyInput(&'static str),

    /// The word dataset could not be parsed.
    #[error("invalid word list: {0}")]
    Dataset(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the sentence journal failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Debounced work was requested outside a tokio runtime.
    #[error("no tokio runtime is running")]
    NoRuntime,

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl QuizError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns a message suitable for the feedback channel.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput(what) => format!("Please enter a {what}."),
            Self::Dataset(_) => {
                "Failed to load the word list. Please try again later.".to_string()
            }
            Self::Io { path, .. } => format!("Could not access {}.", path.display()),
            Self::Json(_) => "Could not encode the saved data.".to_string(),
            Self::NoRuntime => "Suggestions are not available right now.".to_string(),
            Self::Client(_) => "An unexpected error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
