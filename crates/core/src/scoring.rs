//! Correctness checks and per-option / per-question status derivation.
//!
//! Nothing here is cached: every result is derived from the question and the
//! current selection at the moment it is asked for.

use serde::Serialize;

use crate::model::{AnswerRecord, ChoiceKey, Question};

/// Canonical form of a key collection: sorted and comma-joined.
#[must_use]
pub fn normalize(keys: &[ChoiceKey]) -> String {
    let mut sorted: Vec<&str> = keys.iter().map(ChoiceKey::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

/// True when `answer` names exactly the correct keys, in any order.
///
/// Partial multi-select answers and empty answers are always incorrect.
#[must_use]
pub fn is_correct(question: &Question, answer: &[ChoiceKey]) -> bool {
    normalize(answer) == normalize(question.correct_keys())
}

/// How a single option should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionStatus {
    Default,
    Selected,
    Correct,
    Wrong,
}

#[must_use]
pub fn option_status(
    question: &Question,
    answer: &[ChoiceKey],
    key: &ChoiceKey,
    revealed: bool,
) -> OptionStatus {
    let selected = answer.contains(key);
    if !revealed {
        return if selected {
            OptionStatus::Selected
        } else {
            OptionStatus::Default
        };
    }

    if question.is_correct_key(key) {
        OptionStatus::Correct
    } else if selected {
        OptionStatus::Wrong
    } else {
        OptionStatus::Default
    }
}

/// Status of one cell of the answer sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Unanswered,
    Answered,
    Correct,
    Wrong,
    /// Revealed without any selection.
    Missed,
}

#[must_use]
pub fn sheet_status(question: &Question, answer: &[ChoiceKey], revealed: bool) -> SheetStatus {
    match (revealed, answer.is_empty()) {
        (false, true) => SheetStatus::Unanswered,
        (false, false) => SheetStatus::Answered,
        (true, true) => SheetStatus::Missed,
        (true, false) if is_correct(question, answer) => SheetStatus::Correct,
        (true, false) => SheetStatus::Wrong,
    }
}

/// Correct answers against total questions on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageScore {
    pub correct: usize,
    pub total: usize,
}

impl PageScore {
    #[must_use]
    pub fn tally<'a>(
        questions: impl IntoIterator<Item = &'a Question>,
        answers: &AnswerRecord,
    ) -> Self {
        let mut correct = 0;
        let mut total = 0;
        for question in questions {
            total += 1;
            if is_correct(question, answers.get(question.id())) {
                correct += 1;
            }
        }
        Self { correct, total }
    }

    /// Share of correct answers in percent; 0 for an empty page.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, QuestionRecord};

    fn question(id: &str, kind: &str, answer: &[&str]) -> Question {
        QuestionRecord {
            id: id.into(),
            kind: kind.into(),
            question: "Q".into(),
            options: vec![
                "A. one".into(),
                "B. two".into(),
                "C. three".into(),
                "D. four".into(),
            ],
            answer: answer.iter().map(|s| (*s).to_string()).collect(),
            analysis: String::new(),
        }
        .validate()
        .unwrap()
    }

    fn keys(raw: &[&str]) -> Vec<ChoiceKey> {
        raw.iter().map(|k| ChoiceKey::new(*k)).collect()
    }

    #[test]
    fn multiple_select_is_order_independent() {
        let q = question("1", "多选题", &["A", "C"]);
        assert!(is_correct(&q, &keys(&["C", "A"])));
        assert!(is_correct(&q, &keys(&["A", "C"])));
    }

    #[test]
    fn every_permutation_scores_the_same() {
        let q = question("1", "多选题", &["A", "B", "D"]);
        let perms = [
            ["A", "B", "D"],
            ["A", "D", "B"],
            ["B", "A", "D"],
            ["B", "D", "A"],
            ["D", "A", "B"],
            ["D", "B", "A"],
        ];
        for perm in perms {
            assert!(is_correct(&q, &keys(&perm)), "{perm:?}");
        }
    }

    #[test]
    fn partial_and_excess_answers_are_incorrect() {
        let q = question("1", "多选题", &["A", "B", "D"]);
        assert!(!is_correct(&q, &keys(&["A"])));
        assert!(!is_correct(&q, &keys(&["D", "B"])));
        assert!(!is_correct(&q, &keys(&["A", "B", "C", "D"])));
    }

    #[test]
    fn empty_answer_is_incorrect() {
        let q = question("1", "单选题", &["B"]);
        assert!(!is_correct(&q, &[]));
    }

    #[test]
    fn option_status_follows_reveal() {
        let q = question("1", "单选题", &["B"]);
        let answer = keys(&["A"]);
        let a = ChoiceKey::new("A");
        let b = ChoiceKey::new("B");
        let c = ChoiceKey::new("C");

        assert_eq!(option_status(&q, &answer, &a, false), OptionStatus::Selected);
        assert_eq!(option_status(&q, &answer, &b, false), OptionStatus::Default);

        assert_eq!(option_status(&q, &answer, &a, true), OptionStatus::Wrong);
        assert_eq!(option_status(&q, &answer, &b, true), OptionStatus::Correct);
        assert_eq!(option_status(&q, &answer, &c, true), OptionStatus::Default);
    }

    #[test]
    fn sheet_status_covers_all_cells() {
        let q = question("1", "单选题", &["B"]);
        assert_eq!(sheet_status(&q, &[], false), SheetStatus::Unanswered);
        assert_eq!(sheet_status(&q, &keys(&["A"]), false), SheetStatus::Answered);
        assert_eq!(sheet_status(&q, &[], true), SheetStatus::Missed);
        assert_eq!(sheet_status(&q, &keys(&["B"]), true), SheetStatus::Correct);
        assert_eq!(sheet_status(&q, &keys(&["A"]), true), SheetStatus::Wrong);
    }

    #[test]
    fn page_score_counts_correct_answers() {
        let questions = vec![
            question("1", "单选题", &["A"]),
            question("2", "单选题", &["B"]),
            question("3", "多选题", &["A", "C"]),
        ];
        let mut answers = AnswerRecord::new();
        answers.set(QuestionId::new("1"), keys(&["A"]));
        answers.set(QuestionId::new("2"), keys(&["C"]));
        answers.set(QuestionId::new("3"), keys(&["C", "A"]));

        let score = PageScore::tally(&questions, &answers);
        assert_eq!(score, PageScore { correct: 2, total: 3 });
    }
}
