#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lexiquiz_rs::{RelationLookup, RelationQuery, RelationResult, Word, WordList};
use parking_lot::Mutex;

/// Lookup double that answers with a fixed result and records every query.
pub struct ScriptedLookup {
    result: RelationResult,
    delays: Mutex<VecDeque<Duration>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<RelationQuery>>,
}

impl ScriptedLookup {
    pub fn remote(words: &[&str]) -> Self {
        let set: BTreeSet<String> = words.iter().map(|w| w.to_string()).collect();
        Self::with_result(RelationResult::Remote(set))
    }

    pub fn unavailable() -> Self {
        Self::with_result(RelationResult::Unavailable)
    }

    fn with_result(result: RelationResult) -> Self {
        Self {
            result,
            delays: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Delays applied to successive calls, in order.
    pub fn with_delays(self, delays: &[Duration]) -> Self {
        *self.delays.lock() = delays.iter().copied().collect();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<RelationQuery> {
        self.queries.lock().clone()
    }
}

impl RelationLookup for ScriptedLookup {
    async fn lookup(&self, query: &RelationQuery) -> RelationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.clone());
        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

pub fn sample_words() -> WordList {
    WordList::new(vec![
        Word::new("big", "adjective", "of considerable size"),
        Word::new("fast", "adjective", "moving quickly"),
        Word::new("happy", "adjective", "feeling pleasure"),
    ])
}

pub fn fallback(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
