use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::relation::Relation;

const BUILTIN_SYNONYMS: &[&str] = &[
    "large",
    "huge",
    "enormous",
    "massive",
    "giant",
    "gigantic",
    "vast",
    "immense",
    "tremendous",
    "colossal",
];

const BUILTIN_ANTONYMS: &[&str] = &[
    "small",
    "tiny",
    "little",
    "miniature",
    "minute",
    "petite",
    "compact",
    "slight",
    "minor",
    "mini",
];

static BUILTIN: Lazy<FallbackCatalog> = Lazy::new(|| {
    FallbackCatalog::new(
        BUILTIN_SYNONYMS.iter().copied(),
        BUILTIN_ANTONYMS.iter().copied(),
    )
});

/// Offline word lists consulted when the relation service is unreachable.
///
/// Entries are stored lowercased and trimmed, in their original order so the
/// suggestion chips render predictably.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackCatalog {
    synonyms: Vec<String>,
    antonyms: Vec<String>,
}

impl FallbackCatalog {
    pub fn new<S, A>(synonyms: S, antonyms: A) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            synonyms: normalize_list(synonyms),
            antonyms: normalize_list(antonyms),
        }
    }

    /// The catalog compiled into the crate.
    pub fn builtin() -> &'static FallbackCatalog {
        &BUILTIN
    }

    pub fn words(&self, relation: Relation) -> &[String] {
        match relation {
            Relation::Synonym => &self.synonyms,
            Relation::Antonym => &self.antonyms,
        }
    }

    pub fn contains(&self, relation: Relation, word: &str) -> bool {
        let needle = word.trim().to_lowercase();
        self.words(relation).iter().any(|entry| *entry == needle)
    }
}

fn normalize_list<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let word = item.as_ref().trim().to_lowercase();
        if !word.is_empty() && !out.contains(&word) {
            out.push(word);
        }
    }
    out
}
