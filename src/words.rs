use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};

/// One quiz word as read from the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word")]
    pub text: String,
    #[serde(rename = "partOfSpeech", alias = "pos", default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub definition: String,
}

impl Word {
    pub fn new(
        text: impl Into<String>,
        part_of_speech: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            part_of_speech: part_of_speech.into(),
            definition: definition.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WordList {
    words: Vec<Word>,
}

impl WordList {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Parses a JSON array of word objects. Anything else is rejected.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|err| QuizError::Dataset(format!("not valid JSON: {err}")))?;
        if !value.is_array() {
            return Err(QuizError::Dataset("expected a JSON array of words".to_string()));
        }
        let words: Vec<Word> = serde_json::from_value(value)
            .map_err(|err| QuizError::Dataset(format!("malformed word entry: {err}")))?;
        if let Some(pos) = words.iter().position(|word| word.text.trim().is_empty()) {
            return Err(QuizError::Dataset(format!("entry {pos} has an empty word")));
        }
        Ok(Self { words })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| QuizError::io(path, err))?;
        Self::from_json_slice(&bytes)
    }

    pub fn shuffle(&mut self) {
        self.words.shuffle(&mut rand::thread_rng());
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Word> {
        self.words.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }
}

impl From<Vec<Word>> for WordList {
    fn from(words: Vec<Word>) -> Self {
        Self::new(words)
    }
}
