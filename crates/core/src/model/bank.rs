use std::collections::HashMap;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Question, QuestionError, QuestionRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error("question id {id} appears more than once")]
    DuplicateId { id: QuestionId },
}

/// The full, ordered question bank with an id index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    positions: HashMap<QuestionId, usize>,
}

impl QuestionBank {
    /// Build a bank from validated questions, preserving order.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut positions = HashMap::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            if positions.insert(question.id().clone(), index).is_some() {
                return Err(BankError::DuplicateId {
                    id: question.id().clone(),
                });
            }
        }
        Ok(Self {
            questions,
            positions,
        })
    }

    /// Validate raw records (already concatenated in source order) into a bank.
    ///
    /// # Errors
    ///
    /// Returns `BankError::InvalidRecord` for the first record that fails
    /// validation, or `BankError::DuplicateId`.
    pub fn from_records(records: Vec<QuestionRecord>) -> Result<Self, BankError> {
        Self::new(Self::validate_records(records)?)
    }

    /// Validate one source's records without building a bank.
    ///
    /// # Errors
    ///
    /// Returns `BankError::InvalidRecord` for the first invalid record; the
    /// index is relative to `records`.
    pub fn validate_records(records: Vec<QuestionRecord>) -> Result<Vec<Question>, BankError> {
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .validate()
                    .map_err(|source| BankError::InvalidRecord { index, source })
            })
            .collect()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Position of `id` in the unfiltered bank.
    #[must_use]
    pub fn index_of(&self, id: &QuestionId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.index_of(id).map(|index| &self.questions[index])
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.positions.contains_key(id)
    }
}
