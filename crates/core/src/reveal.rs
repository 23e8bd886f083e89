use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::model::{AnswerRecord, QuestionId};

/// Which reveal strategy a deployment runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevealMode {
    /// Each question is checked on its own and stays revealed.
    #[default]
    PerQuestion,
    /// A whole page is submitted at once and scored.
    PerPage,
}

impl fmt::Display for RevealMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerQuestion => f.write_str("per-question"),
            Self::PerPage => f.write_str("per-page"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRevealModeError {
    raw: String,
}

impl fmt::Display for ParseRevealModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid reveal mode {:?} (expected per-question or per-page)",
            self.raw
        )
    }
}

impl std::error::Error for ParseRevealModeError {}

impl FromStr for RevealMode {
    type Err = ParseRevealModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-question" | "question" => Ok(Self::PerQuestion),
            "per-page" | "page" => Ok(Self::PerPage),
            _ => Err(ParseRevealModeError { raw: s.to_owned() }),
        }
    }
}

/// Tracks what the user has chosen to see results for.
///
/// Both variants are one-way within a session: nothing un-reveals except
/// `reset`, and (per page only) `invalidate_pages` after a filter change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealTracker {
    PerQuestion { revealed: BTreeSet<QuestionId> },
    PerPage { pages: BTreeMap<usize, bool> },
}

impl RevealTracker {
    #[must_use]
    pub fn new(mode: RevealMode) -> Self {
        match mode {
            RevealMode::PerQuestion => Self::PerQuestion {
                revealed: BTreeSet::new(),
            },
            RevealMode::PerPage => Self::PerPage {
                pages: BTreeMap::new(),
            },
        }
    }

    /// Tracker for a resumed session.
    ///
    /// In per-question mode every question that already has an answer entry
    /// starts revealed, so prior results are shown again.
    #[must_use]
    pub fn resume(mode: RevealMode, answers: &AnswerRecord) -> Self {
        match mode {
            RevealMode::PerQuestion => Self::PerQuestion {
                revealed: answers.ids().cloned().collect(),
            },
            RevealMode::PerPage => Self::new(mode),
        }
    }

    #[must_use]
    pub fn mode(&self) -> RevealMode {
        match self {
            Self::PerQuestion { .. } => RevealMode::PerQuestion,
            Self::PerPage { .. } => RevealMode::PerPage,
        }
    }

    /// Reveal a single question. Returns true if it was not revealed before.
    ///
    /// No effect in per-page mode.
    pub fn reveal_question(&mut self, id: &QuestionId) -> bool {
        match self {
            Self::PerQuestion { revealed } => revealed.insert(id.clone()),
            Self::PerPage { .. } => false,
        }
    }

    /// Mark `page` as submitted. Returns true if it was pending before.
    ///
    /// No effect in per-question mode.
    pub fn reveal_page(&mut self, page: usize) -> bool {
        match self {
            Self::PerQuestion { .. } => false,
            Self::PerPage { pages } => pages.insert(page, true) != Some(true),
        }
    }

    #[must_use]
    pub fn is_page_revealed(&self, page: usize) -> bool {
        match self {
            Self::PerQuestion { .. } => false,
            Self::PerPage { pages } => pages.get(&page).copied().unwrap_or(false),
        }
    }

    /// Whether results are visible for `id`, which currently sits on `page`.
    #[must_use]
    pub fn is_revealed(&self, id: &QuestionId, page: Option<usize>) -> bool {
        match self {
            Self::PerQuestion { revealed } => revealed.contains(id),
            Self::PerPage { .. } => page.is_some_and(|page| self.is_page_revealed(page)),
        }
    }

    /// Drop page flags after the filtered view changed.
    ///
    /// Returns true if any flag was cleared.
    pub fn invalidate_pages(&mut self) -> bool {
        match self {
            Self::PerQuestion { .. } => false,
            Self::PerPage { pages } => {
                let had_any = !pages.is_empty();
                pages.clear();
                had_any
            }
        }
    }

    /// Back to the initial state for every question and page.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode());
    }

    /// Number of revealed questions (per-question) or submitted pages (per-page).
    #[must_use]
    pub fn revealed_count(&self) -> usize {
        match self {
            Self::PerQuestion { revealed } => revealed.len(),
            Self::PerPage { pages } => pages.values().filter(|flag| **flag).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceKey;

    #[test]
    fn mode_parses_from_config_strings() {
        assert_eq!("per-page".parse::<RevealMode>().unwrap(), RevealMode::PerPage);
        assert_eq!(
            " Per-Question ".parse::<RevealMode>().unwrap(),
            RevealMode::PerQuestion
        );
        assert!("sometimes".parse::<RevealMode>().is_err());
    }

    #[test]
    fn question_reveal_is_one_way() {
        let mut tracker = RevealTracker::new(RevealMode::PerQuestion);
        let id = QuestionId::new("1");
        assert!(!tracker.is_revealed(&id, None));
        assert!(tracker.reveal_question(&id));
        assert!(!tracker.reveal_question(&id));
        assert!(tracker.is_revealed(&id, None));
        assert!(!tracker.invalidate_pages());
        assert!(tracker.is_revealed(&id, None));
    }

    #[test]
    fn resume_reveals_previously_answered_questions() {
        let mut answers = AnswerRecord::new();
        answers.set(QuestionId::new("3"), vec![ChoiceKey::new("A")]);
        answers.set(QuestionId::new("4"), Vec::new());

        let tracker = RevealTracker::resume(RevealMode::PerQuestion, &answers);
        assert!(tracker.is_revealed(&QuestionId::new("3"), None));
        assert!(tracker.is_revealed(&QuestionId::new("4"), None));
        assert!(!tracker.is_revealed(&QuestionId::new("5"), None));

        let tracker = RevealTracker::resume(RevealMode::PerPage, &answers);
        assert_eq!(tracker.revealed_count(), 0);
    }

    #[test]
    fn page_flags_follow_submit_and_invalidate() {
        let mut tracker = RevealTracker::new(RevealMode::PerPage);
        let id = QuestionId::new("1");
        assert!(!tracker.reveal_question(&id));
        assert!(tracker.reveal_page(2));
        assert!(!tracker.reveal_page(2));
        assert!(tracker.is_page_revealed(2));
        assert!(tracker.is_revealed(&id, Some(2)));
        assert!(!tracker.is_revealed(&id, Some(1)));
        assert!(!tracker.is_revealed(&id, None));

        assert!(tracker.invalidate_pages());
        assert!(!tracker.is_page_revealed(2));
    }

    #[test]
    fn reset_keeps_mode() {
        let mut tracker = RevealTracker::new(RevealMode::PerPage);
        tracker.reveal_page(1);
        tracker.reset();
        assert_eq!(tracker.mode(), RevealMode::PerPage);
        assert_eq!(tracker.revealed_count(), 0);
    }
}
