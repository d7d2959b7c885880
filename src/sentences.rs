use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{QuizError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedSentence {
    pub word: String,
    pub sentence: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl SubmittedSentence {
    pub fn new(word: impl Into<String>, sentence: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            sentence: sentence.into(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only history of submitted sentences.
///
/// A persistent journal keeps a JSON array on disk and rewrites it on every
/// append; an ephemeral one keeps the entries in memory.
#[derive(Debug)]
pub struct SentenceJournal {
    path: Option<PathBuf>,
    memory: Mutex<Vec<SubmittedSentence>>,
}

impl SentenceJournal {
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self::with_path(Some(path.into()))
    }

    pub fn ephemeral() -> Self {
        Self::with_path(None)
    }

    fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            memory: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Every stored sentence in insertion order. Unreadable or corrupt
    /// history reads as empty.
    pub fn entries(&self) -> Vec<SubmittedSentence> {
        match &self.path {
            Some(path) => read_history(path),
            None => self.memory.lock().clone(),
        }
    }

    pub fn append(&self, entry: SubmittedSentence) -> Result<()> {
        let Some(path) = &self.path else {
            self.memory.lock().push(entry);
            return Ok(());
        };
        let _guard = self.memory.lock();
        let mut history = read_history(path);
        history.push(entry);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| QuizError::io(parent, err))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&history)?;
        fs::write(path, bytes).map_err(|err| QuizError::io(path, err))?;
        info!(path = %path.display(), total = history.len(), "sentence saved");
        Ok(())
    }
}

fn read_history(path: &Path) -> Vec<SubmittedSentence> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!(error = %err, path = %path.display(), "failed to read sentence history");
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Vec<SubmittedSentence>>(&bytes) {
        Ok(history) => history,
        Err(err) => {
            warn!(error = %err, path = %path.display(), "discarding corrupt sentence history");
            Vec::new()
        }
    }
}
