use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{ChoiceKey, QuestionId};

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Whether a question accepts one choice or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Single,
    Multiple,
}

impl QuestionKind {
    pub const SINGLE_LABEL: &'static str = "单选题";
    pub const MULTIPLE_LABEL: &'static str = "多选题";

    /// Parses the `type` label used by the bank files.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label == Self::SINGLE_LABEL || label.eq_ignore_ascii_case("single") {
            return Some(Self::Single);
        }
        if label == Self::MULTIPLE_LABEL || label.eq_ignore_ascii_case("multiple") {
            return Some(Self::Multiple);
        }
        None
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Single => Self::SINGLE_LABEL,
            Self::Multiple => Self::MULTIPLE_LABEL,
        }
    }

    #[must_use]
    pub fn is_multiple(self) -> bool {
        matches!(self, Self::Multiple)
    }
}

//
// ─── RAW RECORD ────────────────────────────────────────────────────────────────
//

/// Question exactly as it appears in a bank JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer: Vec<String>,
    #[serde(default)]
    pub analysis: String,
}

impl QuestionRecord {
    /// Check the record against the question invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` naming the first violated rule.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        let id = QuestionId::new(id);

        let kind = QuestionKind::from_label(&self.kind).ok_or_else(|| {
            QuestionError::UnknownKind {
                label: self.kind.clone(),
            }
        })?;

        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let mut keys = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.iter().enumerate() {
            let key = ChoiceKey::from_option(option).ok_or(QuestionError::EmptyOption { index })?;
            if keys.contains(&key) {
                return Err(QuestionError::DuplicateChoiceKey {
                    key: key.as_str().to_owned(),
                });
            }
            keys.push(key);
        }

        let mut correct: Vec<ChoiceKey> = Vec::with_capacity(self.answer.len());
        for raw in &self.answer {
            let key = ChoiceKey::new(raw.trim());
            if !keys.contains(&key) {
                return Err(QuestionError::UnknownAnswerKey {
                    key: raw.clone(),
                });
            }
            if !correct.contains(&key) {
                correct.push(key);
            }
        }

        if correct.is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }
        if kind == QuestionKind::Single && correct.len() != 1 {
            return Err(QuestionError::SingleSelectArity {
                count: correct.len(),
            });
        }

        let explanation = Some(self.analysis.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_owned);

        Ok(Question {
            id,
            kind,
            prompt: self.question,
            options: self.options,
            choice_keys: keys,
            correct,
            explanation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated, immutable question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    options: Vec<String>,
    choice_keys: Vec<ChoiceKey>,
    correct: Vec<ChoiceKey>,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options paired with their choice keys, in display order.
    pub fn keyed_options(&self) -> impl Iterator<Item = (&ChoiceKey, &str)> {
        self.choice_keys
            .iter()
            .zip(self.options.iter().map(String::as_str))
    }

    #[must_use]
    pub fn choice_keys(&self) -> &[ChoiceKey] {
        &self.choice_keys
    }

    #[must_use]
    pub fn correct_keys(&self) -> &[ChoiceKey] {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn has_choice(&self, key: &ChoiceKey) -> bool {
        self.choice_keys.contains(key)
    }

    #[must_use]
    pub fn is_correct_key(&self, key: &ChoiceKey) -> bool {
        self.correct.contains(key)
    }

    /// Case-insensitive substring match over the prompt and every option.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.prompt.to_lowercase().contains(needle)
            || self
                .options
                .iter()
                .any(|option| option.to_lowercase().contains(needle))
    }

    /// Returns true if every key of `keys` names an option of this question.
    #[must_use]
    pub fn accepts_all(&self, keys: &[ChoiceKey]) -> bool {
        let known: HashSet<&ChoiceKey> = self.choice_keys.iter().collect();
        keys.iter().all(|key| known.contains(key))
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("unknown question type label: {label:?}")]
    UnknownKind { label: String },

    #[error("question has no options")]
    NoOptions,

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("choice key {key:?} is used by more than one option")]
    DuplicateChoiceKey { key: String },

    #[error("answer key {key:?} does not match any option")]
    UnknownAnswerKey { key: String },

    #[error("question has no correct answer")]
    EmptyAnswer,

    #[error("single-select question must have exactly one correct key, found {count}")]
    SingleSelectArity { count: usize },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
