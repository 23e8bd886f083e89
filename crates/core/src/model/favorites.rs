use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::QuestionId;

/// Favorited question ids. Independent of answers, reveal state and filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    ids: BTreeSet<QuestionId>,
}

impl FavoriteSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present.
    ///
    /// Returns true when `id` is a favorite afterwards.
    pub fn toggle(&mut self, id: &QuestionId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<QuestionId> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = QuestionId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_restores_previous_set() {
        let mut favorites: FavoriteSet = ["1", "5"].into_iter().map(QuestionId::new).collect();
        let before = favorites.clone();

        let id = QuestionId::new("3");
        assert!(favorites.toggle(&id));
        assert!(!favorites.toggle(&id));
        assert_eq!(favorites, before);

        let existing = QuestionId::new("5");
        assert!(!favorites.toggle(&existing));
        assert!(favorites.toggle(&existing));
        assert_eq!(favorites, before);
    }

    #[test]
    fn persists_as_json_array() {
        let favorites: FavoriteSet = ["b", "a"].into_iter().map(QuestionId::new).collect();
        let json = serde_json::to_string(&favorites).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }
}
