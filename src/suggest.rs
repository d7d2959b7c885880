use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::error::{QuizError, Result};
use crate::generation::GenerationGate;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Candidate words matching a prefix, in candidate-list order.
pub type SuggestionSet = Vec<String>;

/// What the suggestion chips should currently show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "words", rename_all = "snake_case")]
pub enum SuggestionView {
    /// No input, nothing to show.
    #[default]
    Hidden,
    /// Input present but nothing matched; render a "no suggestions" hint.
    NoMatches,
    Matches(SuggestionSet),
}

impl SuggestionView {
    pub fn words(&self) -> &[String] {
        match self {
            SuggestionView::Matches(words) => words,
            _ => &[],
        }
    }
}

/// Returns the candidates that start with `prefix` (trimmed, lowercased).
/// An empty prefix yields no suggestions.
pub fn compute_suggestions<S: AsRef<str>>(prefix: &str, candidates: &[S]) -> SuggestionSet {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

pub fn suggestion_view<S: AsRef<str>>(input: &str, candidates: &[S]) -> SuggestionView {
    if input.trim().is_empty() {
        return SuggestionView::Hidden;
    }
    let matches = compute_suggestions(input, candidates);
    if matches.is_empty() {
        SuggestionView::NoMatches
    } else {
        SuggestionView::Matches(matches)
    }
}

type Listener = Arc<dyn Fn(&SuggestionView) + Send + Sync>;

/// Debounced suggestion scheduler for a single input field.
///
/// Each [`schedule`](Self::schedule) call cancels the pending one; only the
/// last call inside the delay window computes and delivers. The listener is
/// invoked with the view lock held and must not block.
pub struct SuggestionEngine {
    candidates: Arc<Vec<String>>,
    delay: Duration,
    gate: Arc<GenerationGate>,
    view: Arc<Mutex<SuggestionView>>,
    listener: Option<Listener>,
    pending: Option<JoinHandle<()>>,
}

impl SuggestionEngine {
    pub fn new<I>(candidates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            candidates: Arc::new(candidates.into_iter().map(Into::into).collect()),
            delay: DEFAULT_DEBOUNCE,
            gate: Arc::new(GenerationGate::new()),
            view: Arc::new(Mutex::new(SuggestionView::Hidden)),
            listener: None,
            pending: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Registers the callback notified on every view change, including the
    /// clear that follows [`select`](Self::select) and [`cancel`](Self::cancel).
    pub fn on_update<F>(mut self, listener: F) -> Self
    where
        F: Fn(&SuggestionView) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Swaps the candidate list, keeping the delay and listener. Any pending
    /// trigger is cancelled.
    pub fn replace_candidates<I>(&mut self, candidates: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.cancel();
        self.candidates = Arc::new(candidates.into_iter().map(Into::into).collect());
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn view(&self) -> SuggestionView {
        self.view.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Records an input change; computation happens once input settles.
    ///
    /// Fails with [`QuizError::NoRuntime`] when called outside a tokio
    /// runtime; the current view is left untouched.
    pub fn schedule(&mut self, input: impl Into<String>) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| QuizError::NoRuntime)?;
        self.abort_pending();
        let input = input.into();
        let ticket = self.gate.begin();
        let gate = Arc::clone(&self.gate);
        let view_slot = Arc::clone(&self.view);
        let candidates = Arc::clone(&self.candidates);
        let listener = self.listener.clone();
        let delay = self.delay;
        trace!(input = %input, "suggestion trigger scheduled");
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if !gate.is_current(ticket) {
                return;
            }
            let view = suggestion_view(&input, &candidates);
            let mut slot = view_slot.lock();
            // A cancel may have landed while computing.
            if !gate.is_current(ticket) {
                return;
            }
            *slot = view;
            trace!(input = %input, matches = slot.words().len(), "suggestions delivered");
            if let Some(listener) = &listener {
                listener(&*slot);
            }
        }));
        Ok(())
    }

    /// Accepts a chip: returns the text for the input field and ends the round.
    pub fn select(&mut self, suggestion: &str) -> String {
        self.cancel();
        suggestion.to_string()
    }

    /// Drops any pending trigger, clears the view and tells the listener.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.gate.invalidate();
        let mut slot = self.view.lock();
        *slot = SuggestionView::Hidden;
        if let Some(listener) = &self.listener {
            listener(&*slot);
        }
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
