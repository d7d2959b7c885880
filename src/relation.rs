use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QuizError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.datamuse.com/words";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT_VALUE: &str = concat!("lexiquiz-rs/", env!("CARGO_PKG_VERSION"));

/// Lexical relation a quiz answer is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Synonym,
    Antonym,
}

impl Relation {
    pub const ALL: [Relation; 2] = [Relation::Synonym, Relation::Antonym];

    /// Query parameter understood by the relation service.
    pub fn query_code(&self) -> &'static str {
        match self {
            Relation::Synonym => "rel_syn",
            Relation::Antonym => "rel_ant",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Relation::Synonym => "synonym",
            Relation::Antonym => "antonym",
        }
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            Relation::Synonym => 0,
            Relation::Antonym => 1,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "synonym" | "syn" | "rel_syn" => Ok(Relation::Synonym),
            "antonym" | "ant" | "rel_ant" => Ok(Relation::Antonym),
            other => Err(format!("unknown relation {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationQuery {
    pub word: String,
    pub relation: Relation,
}

impl RelationQuery {
    pub fn new(word: impl Into<String>, relation: Relation) -> Self {
        Self {
            word: word.into(),
            relation,
        }
    }
}

/// Outcome of a relation lookup. `Unavailable` is a first-class result,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationResult {
    Remote(BTreeSet<String>),
    Unavailable,
}

impl RelationResult {
    pub fn is_remote(&self) -> bool {
        matches!(self, RelationResult::Remote(_))
    }
}

/// Anything that can answer relation queries.
pub trait RelationLookup: Send + Sync {
    fn lookup(&self, query: &RelationQuery) -> impl Future<Output = RelationResult> + Send;
}

/// HTTP client for a Datamuse-style relation service.
#[derive(Debug, Clone)]
pub struct HttpRelationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelationClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| QuizError::Client(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, query: &RelationQuery) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            self.endpoint,
            separator,
            query.relation.query_code(),
            utf8_percent_encode(query.word.trim(), NON_ALPHANUMERIC)
        )
    }

    async fn fetch(&self, url: &str) -> std::result::Result<BTreeSet<String>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| format!("transport error: {err}"))?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(format!("unexpected status {status}"));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| format!("failed to read body: {err}"))?;
        parse_related_words(&body)
    }
}

impl RelationLookup for HttpRelationClient {
    async fn lookup(&self, query: &RelationQuery) -> RelationResult {
        if query.word.trim().is_empty() {
            debug!("skipping relation lookup for blank word");
            return RelationResult::Unavailable;
        }
        let url = self.request_url(query);
        debug!(%url, relation = %query.relation, "querying relation service");
        match self.fetch(&url).await {
            Ok(words) => {
                debug!(count = words.len(), "relation service answered");
                RelationResult::Remote(words)
            }
            Err(reason) => {
                debug!(%reason, word = %query.word, "relation service unavailable, using fallback");
                RelationResult::Unavailable
            }
        }
    }
}

/// Lookup chosen at startup: the HTTP service, or offline grading that
/// always falls back.
#[derive(Debug, Clone)]
pub enum RelationSource {
    Http(HttpRelationClient),
    Offline,
}

impl RelationLookup for RelationSource {
    async fn lookup(&self, query: &RelationQuery) -> RelationResult {
        match self {
            RelationSource::Http(client) => client.lookup(query).await,
            RelationSource::Offline => RelationResult::Unavailable,
        }
    }
}

#[derive(Deserialize)]
struct RelatedWord {
    word: Option<serde_json::Value>,
}

/// Parses a `[{"word": ...}, ...]` payload into a lowercase set.
pub(crate) fn parse_related_words(body: &[u8]) -> std::result::Result<BTreeSet<String>, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|err| format!("malformed JSON: {err}"))?;
    let serde_json::Value::Array(items) = value else {
        return Err("payload is not an array".to_string());
    };
    let words = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RelatedWord>(item).ok())
        .filter_map(|item| match item.word {
            Some(serde_json::Value::String(word)) => Some(word.trim().to_lowercase()),
            _ => None,
        })
        .filter(|word| !word.is_empty())
        .collect();
    Ok(words)
}
