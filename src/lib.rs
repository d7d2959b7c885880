pub mod config;
pub mod error;
pub mod fallback;
pub mod feedback;
pub mod generation;
pub mod relation;
pub mod sentences;
pub mod session;
pub mod speech;
pub mod suggest;
pub mod validate;
pub mod words;

#[cfg(feature = "web")]
pub mod web;

pub use config::QuizConfig;
pub use error::{QuizError, Result};
pub use fallback::FallbackCatalog;
pub use feedback::{Feedback, FeedbackChannel, Severity};
pub use generation::{GenerationGate, Ticket};
pub use relation::{
    HttpRelationClient, Relation, RelationLookup, RelationQuery, RelationResult, RelationSource,
};
pub use sentences::{SentenceJournal, SubmittedSentence};
pub use session::{AnswerOutcome, QuizSession, SentenceOutcome, SessionState};
pub use speech::{NoSpeech, Speaker, SpeechError, SystemSpeaker};
pub use suggest::{SuggestionEngine, SuggestionSet, SuggestionView, compute_suggestions};
pub use validate::{AnswerValidator, Verdict, VerdictSource};
pub use words::{Word, WordList};
