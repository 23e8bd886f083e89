use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a Question across the merged bank.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// DOM-style anchor used when scrolling to this question.
    #[must_use]
    pub fn anchor(&self) -> String {
        format!("q-{}", self.0)
    }
}

/// Short token identifying one option of a question (usually a letter).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceKey(String);

impl ChoiceKey {
    /// Creates a new `ChoiceKey`
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the key from an option's display text.
    ///
    /// The leading character is the key (`"B. Paris"` -> `B`), whether it is a
    /// letter or not. Returns `None` for empty text.
    #[must_use]
    pub fn from_option(text: &str) -> Option<Self> {
        let first = text.chars().next()?;
        Some(Self(first.to_string()))
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for QuestionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ChoiceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ChoiceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChoiceKey({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from an empty string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError { kind: "QuestionId" });
        }
        Ok(Self::new(trimmed))
    }
}

impl FromStr for ChoiceKey {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError { kind: "ChoiceKey" });
        }
        Ok(Self::new(trimmed))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_key_uses_leading_letter() {
        let key = ChoiceKey::from_option("B. Paris").unwrap();
        assert_eq!(key.as_str(), "B");
    }

    #[test]
    fn choice_key_falls_back_to_first_char() {
        let key = ChoiceKey::from_option("对").unwrap();
        assert_eq!(key.as_str(), "对");
        assert!(ChoiceKey::from_option("").is_none());
    }

    #[test]
    fn question_id_from_str_trims() {
        let id: QuestionId = "  q-17 ".parse().unwrap();
        assert_eq!(id.as_str(), "q-17");
        assert!("   ".parse::<QuestionId>().is_err());
    }

    #[test]
    fn question_id_anchor() {
        assert_eq!(QuestionId::new("42").anchor(), "q-42");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&QuestionId::new("7")).unwrap();
        assert_eq!(json, "\"7\"");
        let key: ChoiceKey = serde_json::from_str("\"C\"").unwrap();
        assert_eq!(key, ChoiceKey::new("C"));
    }
}
