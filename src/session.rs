use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::QuizConfig;
use crate::error::{QuizError, Result};
use crate::fallback::FallbackCatalog;
use crate::feedback::{Feedback, FeedbackChannel};
use crate::generation::GenerationGate;
use crate::relation::{Relation, RelationLookup, RelationSource};
use crate::sentences::{SentenceJournal, SubmittedSentence};
use crate::speech::{SpeechError, Speaker};
use crate::suggest::{SuggestionEngine, SuggestionView};
use crate::validate::{AnswerValidator, Verdict, VerdictSource};
use crate::words::{Word, WordList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// Nothing to grade against; no word is loaded.
    NoWord,
    /// Blank answer, rejected before any lookup.
    EmptyInput,
    Graded { verdict: Verdict },
    /// A newer submission on the same form (or a word change) overtook this one.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SentenceOutcome {
    NoWord,
    EmptyInput,
    MissingWord { word: String },
    Saved { entry: SubmittedSentence },
}

/// Quiz state for one learner: the word list, the current position, and the
/// per-form validation and suggestion state.
pub struct QuizSession<L> {
    words: WordList,
    index: usize,
    shuffle: bool,
    validator: AnswerValidator<L>,
    fallback: FallbackCatalog,
    journal: SentenceJournal,
    feedback: FeedbackChannel,
    gates: [GenerationGate; 2],
    suggestions: [SuggestionEngine; 2],
}

impl<L: RelationLookup> QuizSession<L> {
    pub fn new(lookup: L) -> Self {
        let fallback = FallbackCatalog::builtin().clone();
        let suggestions = Relation::ALL
            .map(|relation| SuggestionEngine::new(fallback.words(relation).to_vec()));
        Self {
            words: WordList::default(),
            index: 0,
            shuffle: false,
            validator: AnswerValidator::new(lookup),
            fallback,
            journal: SentenceJournal::ephemeral(),
            feedback: FeedbackChannel::new(),
            gates: [GenerationGate::new(), GenerationGate::new()],
            suggestions,
        }
    }

    /// Replaces the fallback lists; suggestion candidates follow them.
    /// Engines installed earlier keep their delay and listener.
    pub fn with_fallback(mut self, fallback: FallbackCatalog) -> Self {
        for relation in Relation::ALL {
            self.suggestions[relation.slot()].replace_candidates(fallback.words(relation).to_vec());
        }
        self.fallback = fallback;
        self
    }

    pub fn with_journal(mut self, journal: SentenceJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Installs a custom suggestion engine for one form, e.g. to register a
    /// delivery callback.
    pub fn with_suggestion_engine(mut self, relation: Relation, engine: SuggestionEngine) -> Self {
        self.suggestions[relation.slot()] = engine;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.words.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Ready
        }
    }

    pub fn current(&self) -> Option<&Word> {
        self.words.get(self.index)
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn words(&self) -> &WordList {
        &self.words
    }

    /// Moves to the next word, wrapping around. No-op on an empty list.
    pub fn advance(&mut self) -> Option<&Word> {
        if self.words.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.words.len();
        self.reset_forms();
        self.current()
    }

    /// Replaces the word list and rewinds to the first word.
    pub fn load(&mut self, list: WordList) {
        self.words = list;
        self.index = 0;
        self.reset_forms();
        info!(words = self.words.len(), "word list loaded");
    }

    /// Loads a JSON word list; on failure the session is left empty and a
    /// danger message is posted.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let parsed = WordList::from_path(path);
        if let Err(err) = &parsed {
            warn!(error = %err, path = %path.display(), "failed to load word list");
        }
        self.install(parsed)
    }

    /// Same as [`Self::load_from_path`] for an in-memory payload.
    pub fn load_from_json(&mut self, bytes: &[u8]) -> Result<usize> {
        let parsed = WordList::from_json_slice(bytes);
        if let Err(err) = &parsed {
            warn!(error = %err, "failed to parse word list");
        }
        self.install(parsed)
    }

    fn install(&mut self, parsed: Result<WordList>) -> Result<usize> {
        match parsed {
            Ok(mut list) => {
                if self.shuffle {
                    list.shuffle();
                }
                let count = list.len();
                self.load(list);
                Ok(count)
            }
            Err(err) => {
                self.load(WordList::default());
                self.feedback.post(Feedback::danger(
                    "Failed to load the word list. Please try again later.",
                ));
                Err(err)
            }
        }
    }

    pub fn fallback(&self) -> &FallbackCatalog {
        &self.fallback
    }

    pub fn journal(&self) -> &SentenceJournal {
        &self.journal
    }

    pub fn feedback(&self) -> &FeedbackChannel {
        &self.feedback
    }

    pub fn validator(&self) -> &AnswerValidator<L> {
        &self.validator
    }

    /// Grades a synonym or antonym answer for the current word.
    pub async fn submit_answer(&self, relation: Relation, input: &str) -> AnswerOutcome {
        let Some(word) = self.current().map(|word| word.text.clone()) else {
            self.feedback.post(Feedback::warning("No word is loaded yet."));
            return AnswerOutcome::NoWord;
        };
        if input.trim().is_empty() {
            let err = QuizError::EmptyInput(relation.label());
            self.feedback.post(Feedback::warning(err.user_message()));
            return AnswerOutcome::EmptyInput;
        }

        let gate = &self.gates[relation.slot()];
        let ticket = gate.begin();
        let verdict = self
            .validator
            .validate(&word, relation, input, self.fallback.words(relation))
            .await;
        if !gate.is_current(ticket) {
            debug!(%word, %relation, "discarding superseded verdict");
            return AnswerOutcome::Superseded;
        }

        self.feedback
            .post(verdict_feedback(&word, relation, input.trim(), verdict));
        AnswerOutcome::Graded { verdict }
    }

    /// Saves a sentence if it uses the current word.
    pub fn submit_sentence(&self, sentence: &str) -> Result<SentenceOutcome> {
        let Some(word) = self.current() else {
            self.feedback.post(Feedback::warning("No word is loaded yet."));
            return Ok(SentenceOutcome::NoWord);
        };
        let sentence = sentence.trim();
        if sentence.is_empty() {
            self.feedback
                .post(Feedback::warning(QuizError::EmptyInput("sentence").user_message()));
            return Ok(SentenceOutcome::EmptyInput);
        }
        if !sentence.to_lowercase().contains(&word.text.to_lowercase()) {
            self.feedback.post(Feedback::danger(format!(
                "Your sentence must include the word \"{}\".",
                word.text
            )));
            return Ok(SentenceOutcome::MissingWord {
                word: word.text.clone(),
            });
        }

        let entry = SubmittedSentence::new(word.text.clone(), sentence);
        if let Err(err) = self.journal.append(entry.clone()) {
            warn!(error = %err, "failed to save sentence");
            self.feedback.post(Feedback::danger(err.user_message()));
            return Err(err);
        }
        self.feedback.post(Feedback::success("Sentence saved!"));
        Ok(SentenceOutcome::Saved { entry })
    }

    /// Asks the speech collaborator to say the current word.
    pub fn speak_current(&self, speaker: &dyn Speaker) -> bool {
        let Some(word) = self.current() else {
            return false;
        };
        match speaker.speak(&word.text) {
            Ok(()) => true,
            Err(SpeechError::Unsupported) => {
                self.feedback.post(Feedback::warning(
                    "Text-to-speech is not supported on this system.",
                ));
                false
            }
            Err(err) => {
                warn!(error = %err, "speech playback failed");
                self.feedback
                    .post(Feedback::warning("Could not play the pronunciation."));
                false
            }
        }
    }

    /// Feeds an input change to the form's debounced suggestion engine.
    /// Outside a tokio runtime this fails with [`QuizError::NoRuntime`].
    pub fn suggest(&mut self, relation: Relation, input: &str) -> Result<()> {
        self.suggestions[relation.slot()].schedule(input)
    }

    pub fn suggestions(&self, relation: Relation) -> SuggestionView {
        self.suggestions[relation.slot()].view()
    }

    /// Accepts a suggestion chip; returns the text for the answer field.
    pub fn select_suggestion(&mut self, relation: Relation, suggestion: &str) -> String {
        self.suggestions[relation.slot()].select(suggestion)
    }

    fn reset_forms(&mut self) {
        for gate in &self.gates {
            gate.invalidate();
        }
        for engine in &mut self.suggestions {
            engine.cancel();
        }
    }
}

impl QuizSession<RelationSource> {
    /// Builds a session from runtime settings, loading the word list when a
    /// path is configured. A bad word list leaves the session empty.
    pub fn from_config(config: &QuizConfig) -> Result<Self> {
        let journal = match &config.sentences_path {
            Some(path) => SentenceJournal::persistent(path),
            None => SentenceJournal::ephemeral(),
        };
        let fallback = FallbackCatalog::builtin().clone();
        let mut session = QuizSession::new(config.relation_source()?)
            .with_journal(journal)
            .with_shuffle(config.shuffle);
        for relation in Relation::ALL {
            let engine = SuggestionEngine::new(fallback.words(relation).to_vec())
                .with_delay(config.debounce);
            session = session.with_suggestion_engine(relation, engine);
        }
        if let Some(path) = &config.words_path {
            // Failure is reported through the feedback channel.
            let _ = session.load_from_path(path);
        }
        Ok(session)
    }
}

fn verdict_feedback(word: &str, relation: Relation, answer: &str, verdict: Verdict) -> Feedback {
    let offline = match verdict.source {
        VerdictSource::Remote => "",
        VerdictSource::Fallback => " (checked against the offline list)",
    };
    if verdict.accepted {
        Feedback::success(format!(
            "Correct! \"{answer}\" is a {relation} of \"{word}\".{offline}"
        ))
    } else {
        Feedback::danger(format!(
            "Incorrect. \"{answer}\" is not a {relation} of \"{word}\".{offline}"
        ))
    }
}
