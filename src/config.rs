use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::relation::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, HttpRelationClient, RelationSource};
use crate::suggest::DEFAULT_DEBOUNCE;

/// Runtime settings shared by the CLI and the web front end.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Base URL of the relation service.
    pub relation_endpoint: String,
    /// Upper bound on a single relation lookup.
    pub request_timeout: Duration,
    /// Skip the relation service and grade against the fallback lists only.
    pub offline: bool,
    pub debounce: Duration,
    /// JSON word list; `None` starts the session empty.
    pub words_path: Option<PathBuf>,
    /// Sentence journal; `None` keeps sentences in memory.
    pub sentences_path: Option<PathBuf>,
    pub shuffle: bool,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            relation_endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            offline: false,
            debounce: DEFAULT_DEBOUNCE,
            words_path: None,
            sentences_path: None,
            shuffle: false,
        }
    }
}

impl QuizConfig {
    /// Builds the relation lookup these settings describe.
    pub fn relation_source(&self) -> Result<RelationSource> {
        if self.offline {
            return Ok(RelationSource::Offline);
        }
        HttpRelationClient::new(self.relation_endpoint.clone(), self.request_timeout)
            .map(RelationSource::Http)
    }
}
