use exam_core::model::{ChoiceKey, Question, QuestionId};
use exam_core::scoring::{OptionStatus, PageScore, SheetStatus};

/// One option of a question as it should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView<'a> {
    pub key: &'a ChoiceKey,
    pub text: &'a str,
    pub status: OptionStatus,
}

/// Everything the presentation layer needs to draw one question card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView<'a> {
    /// 1-based position in the filtered view.
    pub number: usize,
    pub question: &'a Question,
    pub selection: &'a [ChoiceKey],
    pub is_favorite: bool,
    pub revealed: bool,
    /// Only known once revealed.
    pub correct: Option<bool>,
    pub options: Vec<OptionView<'a>>,
}

/// One cell of the answer sheet for the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry<'a> {
    pub number: usize,
    pub id: &'a QuestionId,
    pub status: SheetStatus,
}

/// Snapshot of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView<'a> {
    pub page: usize,
    pub page_count: usize,
    pub questions: Vec<QuestionView<'a>>,
    /// Present once the page was submitted (per-page mode).
    pub score: Option<PageScore>,
}

impl PageView<'_> {
    /// True when the active filter matches nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Favorites shown by the current filter against all favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoritesSummary {
    pub shown: usize,
    pub total: usize,
}
