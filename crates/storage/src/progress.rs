//! Typed access to the three persisted session records.
//!
//! Each record is JSON text under its own key. Reads never fail: a missing,
//! unreadable or malformed value falls back to that record's default.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use exam_core::model::{AnswerRecord, FavoriteSet};

use crate::repository::{KeyValueStore, StorageError};

/// Keys the session records are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressKeys {
    pub favorites: String,
    pub answers: String,
    pub current_page: String,
}

impl Default for ProgressKeys {
    fn default() -> Self {
        Self {
            favorites: "exam_favorites".into(),
            answers: "exam_user_answers".into(),
            current_page: "exam_current_page".into(),
        }
    }
}

/// Everything restored when a session opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProgress {
    pub favorites: FavoriteSet,
    pub answers: AnswerRecord,
    pub current_page: usize,
}

impl Default for PersistedProgress {
    fn default() -> Self {
        Self {
            favorites: FavoriteSet::default(),
            answers: AnswerRecord::default(),
            current_page: 1,
        }
    }
}

#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    keys: ProgressKeys,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, keys: ProgressKeys) -> Self {
        Self { kv, keys }
    }

    /// Load all three records, substituting defaults where needed.
    pub async fn load(&self) -> PersistedProgress {
        PersistedProgress {
            favorites: self.load_favorites().await,
            answers: self.load_answers().await,
            current_page: self.load_current_page().await,
        }
    }

    pub async fn load_favorites(&self) -> FavoriteSet {
        self.load_field(&self.keys.favorites)
            .await
            .unwrap_or_default()
    }

    pub async fn load_answers(&self) -> AnswerRecord {
        self.load_field(&self.keys.answers).await.unwrap_or_default()
    }

    /// Stored 1-based page; 0 is treated as malformed.
    pub async fn load_current_page(&self) -> usize {
        match self.load_field::<usize>(&self.keys.current_page).await {
            Some(0) => {
                tracing::warn!(key = %self.keys.current_page, "stored page 0 is invalid, using 1");
                1
            }
            Some(page) => page,
            None => 1,
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be encoded or stored.
    pub async fn save_favorites(&self, favorites: &FavoriteSet) -> Result<(), StorageError> {
        self.save_field(&self.keys.favorites, favorites).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be encoded or stored.
    pub async fn save_answers(&self, answers: &AnswerRecord) -> Result<(), StorageError> {
        self.save_field(&self.keys.answers, answers).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be encoded or stored.
    pub async fn save_current_page(&self, page: usize) -> Result<(), StorageError> {
        self.save_field(&self.keys.current_page, &page).await
    }

    /// Drop the answered-record entirely.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear_answers(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.keys.answers).await
    }

    async fn load_field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(%key, error = %err, "failed to read persisted state, using default");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%key, error = %err, "malformed persisted state, using default");
                None
            }
        }
    }

    async fn save_field<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(key, &encoded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use exam_core::model::{ChoiceKey, QuestionId};

    fn store_with(entries: &[(&str, &str)]) -> ProgressStore {
        let kv = InMemoryStore::with_entries(entries.iter().copied());
        ProgressStore::new(Arc::new(kv), ProgressKeys::default())
    }

    #[tokio::test]
    async fn missing_keys_load_defaults() {
        let progress = store_with(&[]).load().await;
        assert_eq!(progress, PersistedProgress::default());
        assert_eq!(progress.current_page, 1);
    }

    #[tokio::test]
    async fn malformed_values_fall_back_independently() {
        let store = store_with(&[
            ("exam_favorites", "{not json"),
            ("exam_user_answers", r#"{"1":["A"]}"#),
            ("exam_current_page", "\"three\""),
        ]);
        let progress = store.load().await;
        assert!(progress.favorites.is_empty());
        assert_eq!(progress.answers.get(&QuestionId::new("1")), &[ChoiceKey::new("A")]);
        assert_eq!(progress.current_page, 1);
    }

    #[tokio::test]
    async fn wrong_shape_is_treated_as_malformed() {
        let store = store_with(&[
            ("exam_favorites", r#"{"a":1}"#),
            ("exam_user_answers", r#"["1","2"]"#),
            ("exam_current_page", "-4"),
        ]);
        assert_eq!(store.load().await, PersistedProgress::default());
    }

    #[tokio::test]
    async fn page_zero_is_replaced() {
        let store = store_with(&[("exam_current_page", "0")]);
        assert_eq!(store.load_current_page().await, 1);
    }

    #[tokio::test]
    async fn saved_records_load_back() {
        let store = store_with(&[]);
        let mut favorites = FavoriteSet::new();
        favorites.toggle(&QuestionId::new("9"));
        let mut answers = AnswerRecord::new();
        answers.set(QuestionId::new("9"), vec![ChoiceKey::new("C"), ChoiceKey::new("A")]);

        store.save_favorites(&favorites).await.unwrap();
        store.save_answers(&answers).await.unwrap();
        store.save_current_page(4).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.favorites, favorites);
        assert_eq!(loaded.answers, answers);
        assert_eq!(loaded.current_page, 4);

        store.clear_answers().await.unwrap();
        assert!(store.load_answers().await.is_empty());
    }

    #[tokio::test]
    async fn custom_keys_are_honored() {
        let kv = Arc::new(InMemoryStore::new());
        let keys = ProgressKeys {
            favorites: "f".into(),
            answers: "a".into(),
            current_page: "p".into(),
        };
        let store = ProgressStore::new(kv.clone(), keys);
        store.save_current_page(2).await.unwrap();
        assert_eq!(kv.get("p").await.unwrap().as_deref(), Some("2"));
        assert_eq!(kv.get("exam_current_page").await.unwrap(), None);
    }
}
