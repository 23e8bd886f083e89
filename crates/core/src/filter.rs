use crate::model::{FavoriteSet, QuestionBank};

/// Search text plus the favorites-only toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    query: String,
    favorites_only: bool,
}

impl FilterCriteria {
    #[must_use]
    pub fn new(query: impl Into<String>, favorites_only: bool) -> Self {
        Self {
            query: query.into(),
            favorites_only,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn favorites_only(&self) -> bool {
        self.favorites_only
    }

    /// Returns true if the query changed.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query == self.query {
            return false;
        }
        self.query = query;
        true
    }

    /// Returns true if the flag changed.
    pub fn set_favorites_only(&mut self, favorites_only: bool) -> bool {
        if favorites_only == self.favorites_only {
            return false;
        }
        self.favorites_only = favorites_only;
        true
    }

    /// Returns true if anything was active.
    pub fn clear(&mut self) -> bool {
        let was_active = self.is_active();
        self.query.clear();
        self.favorites_only = false;
        was_active
    }

    /// Whether the filtered view can differ from the full bank.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.favorites_only || !self.query.trim().is_empty()
    }
}

/// Positions (into the full bank) of the questions matching `criteria`.
///
/// Bank order is preserved. The favorites restriction is applied first, then
/// the query as a case-insensitive substring over prompt and options. A query
/// that is blank after trimming matches everything; otherwise it is matched
/// as typed, surrounding whitespace included.
#[must_use]
pub fn filter_positions(
    bank: &QuestionBank,
    criteria: &FilterCriteria,
    favorites: &FavoriteSet,
) -> Vec<usize> {
    let needle = if criteria.query.trim().is_empty() {
        String::new()
    } else {
        criteria.query.to_lowercase()
    };
    bank.questions()
        .iter()
        .enumerate()
        .filter(|(_, question)| !criteria.favorites_only || favorites.contains(question.id()))
        .filter(|(_, question)| needle.is_empty() || question.matches_lowercase(&needle))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, QuestionRecord};

    fn bank() -> QuestionBank {
        let raw = |id: &str, prompt: &str, option_b: &str| QuestionRecord {
            id: id.into(),
            kind: "单选题".into(),
            question: prompt.into(),
            options: vec!["A. none".into(), format!("B. {option_b}")],
            answer: vec!["A".into()],
            analysis: String::new(),
        };
        QuestionBank::from_records(vec![
            raw("1", "What is Rust?", "a language"),
            raw("2", "What is TCP?", "a Protocol"),
            raw("3", "Which protocol is stateless?", "UDP"),
            raw("4", "Ownership rules", "borrowing"),
        ])
        .unwrap()
    }

    fn ids(bank: &QuestionBank, criteria: &FilterCriteria, favorites: &FavoriteSet) -> Vec<String> {
        filter_positions(bank, criteria, favorites)
            .into_iter()
            .map(|index| bank.questions()[index].id().to_string())
            .collect()
    }

    #[test]
    fn empty_criteria_keep_everything() {
        let bank = bank();
        let result = ids(&bank, &FilterCriteria::default(), &FavoriteSet::new());
        assert_eq!(result, ["1", "2", "3", "4"]);
    }

    #[test]
    fn whitespace_query_is_inactive() {
        let bank = bank();
        let criteria = FilterCriteria::new("   ", false);
        assert!(!criteria.is_active());
        assert_eq!(filter_positions(&bank, &criteria, &FavoriteSet::new()), [0, 1, 2, 3]);
    }

    #[test]
    fn query_matches_prompt_and_options_case_insensitively() {
        let bank = bank();
        let criteria = FilterCriteria::new("PROTOCOL", false);
        assert_eq!(ids(&bank, &criteria, &FavoriteSet::new()), ["2", "3"]);
    }

    #[test]
    fn surrounding_whitespace_is_part_of_the_query() {
        let bank = bank();
        // "a Protocol" ends the option, so only the prompt with a space after it matches.
        let criteria = FilterCriteria::new(" protocol ", false);
        assert_eq!(ids(&bank, &criteria, &FavoriteSet::new()), ["3"]);

        // "What is Rust?" has no space after "rust".
        let criteria = FilterCriteria::new("rust ", false);
        assert!(ids(&bank, &criteria, &FavoriteSet::new()).is_empty());
    }

    #[test]
    fn favorites_only_keeps_bank_order() {
        let bank = bank();
        let mut favorites = FavoriteSet::new();
        favorites.toggle(&QuestionId::new("4"));
        favorites.toggle(&QuestionId::new("1"));
        let criteria = FilterCriteria::new("", true);
        assert_eq!(ids(&bank, &criteria, &favorites), ["1", "4"]);
    }

    #[test]
    fn favorites_and_query_combine() {
        let bank = bank();
        let favorites: FavoriteSet = ["1", "2", "4"].into_iter().map(QuestionId::new).collect();
        let criteria = FilterCriteria::new("what", true);
        assert_eq!(ids(&bank, &criteria, &favorites), ["1", "2"]);
    }

    #[test]
    fn setters_report_changes() {
        let mut criteria = FilterCriteria::default();
        assert!(criteria.set_query("rust"));
        assert!(!criteria.set_query("rust"));
        assert!(criteria.set_favorites_only(true));
        assert!(!criteria.set_favorites_only(true));
        assert!(criteria.clear());
        assert!(!criteria.clear());
    }

    #[test]
    fn clearing_a_blank_query_reports_nothing_active() {
        let mut criteria = FilterCriteria::new("   ", false);
        assert!(!criteria.clear());
        assert_eq!(criteria.query(), "");
    }
}
