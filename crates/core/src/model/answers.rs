use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{ChoiceKey, QuestionId};
use crate::model::question::QuestionKind;

/// The user's selected choice keys per question.
///
/// Entries appear on first selection and are only dropped by `clear`.
/// Key order within an entry follows click order but is compared as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerRecord {
    entries: BTreeMap<QuestionId, Vec<ChoiceKey>>,
}

impl AnswerRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole selection for `id`. Repeated keys are dropped.
    pub fn set(&mut self, id: QuestionId, keys: Vec<ChoiceKey>) {
        let mut deduped: Vec<ChoiceKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if !deduped.contains(&key) {
                deduped.push(key);
            }
        }
        self.entries.insert(id, deduped);
    }

    /// Selection for `id`; empty when nothing was recorded.
    #[must_use]
    pub fn get(&self, id: &QuestionId) -> &[ChoiceKey] {
        self.entries.get(id).map_or(&[], Vec::as_slice)
    }

    /// True if `id` has an entry, even an empty one.
    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.entries.contains_key(id)
    }

    /// True if `id` has at least one selected key.
    #[must_use]
    pub fn has_selection(&self, id: &QuestionId) -> bool {
        !self.get(id).is_empty()
    }

    /// Number of questions with a non-empty selection.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.values().filter(|keys| !keys.is_empty()).count()
    }

    pub fn ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.entries.keys()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Selection that results from clicking `key` on a question of `kind`.
///
/// Single-select replaces the selection; multi-select toggles membership.
#[must_use]
pub fn next_selection(kind: QuestionKind, current: &[ChoiceKey], key: ChoiceKey) -> Vec<ChoiceKey> {
    match kind {
        QuestionKind::Single => vec![key],
        QuestionKind::Multiple => {
            if current.contains(&key) {
                current.iter().filter(|k| **k != key).cloned().collect()
            } else {
                let mut next = current.to_vec();
                next.push(key);
                next
            }
        }
    }
}
