use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QuizError, Result};
use crate::relation::{Relation, RelationLookup, RelationQuery, RelationResult};

/// Which data source decided a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub accepted: bool,
    pub source: VerdictSource,
}

/// Grades answers against the relation service, degrading to a fixed list
/// when the service is unavailable.
#[derive(Debug, Clone)]
pub struct AnswerValidator<L> {
    lookup: L,
}

impl<L: RelationLookup> AnswerValidator<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Validates `input`. Callers must reject blank input beforehand; use
    /// [`AnswerValidator::validate_input`] to have it checked here.
    pub async fn validate(
        &self,
        word: &str,
        relation: Relation,
        input: &str,
        fallback: &[String],
    ) -> Verdict {
        let answer = normalize_answer(input);
        let query = RelationQuery::new(word, relation);
        match self.lookup.lookup(&query).await {
            RelationResult::Remote(related) => {
                let accepted = related.contains(&answer);
                debug!(word, %relation, accepted, "answer graded by relation service");
                Verdict {
                    accepted,
                    source: VerdictSource::Remote,
                }
            }
            RelationResult::Unavailable => {
                let accepted = fallback
                    .iter()
                    .any(|entry| normalize_answer(entry) == answer);
                debug!(word, %relation, accepted, "answer graded by fallback list");
                Verdict {
                    accepted,
                    source: VerdictSource::Fallback,
                }
            }
        }
    }

    pub async fn validate_input(
        &self,
        word: &str,
        relation: Relation,
        input: &str,
        fallback: &[String],
    ) -> Result<Verdict> {
        if input.trim().is_empty() {
            return Err(QuizError::EmptyInput(relation.label()));
        }
        Ok(self.validate(word, relation, input, fallback).await)
    }
}

pub fn normalize_answer(input: &str) -> String {
    input.trim().to_lowercase()
}
