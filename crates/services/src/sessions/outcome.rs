use exam_core::scoring::PageScore;

/// Result of `answer` / `toggle_choice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded,
    /// The question is already revealed in per-question mode.
    Locked,
    UnknownQuestion,
    /// A key is not an option of the question, or a single-select question
    /// was given more than one key.
    InvalidChoice,
}

/// Result of `reveal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed,
    AlreadyRevealed,
    UnknownQuestion,
    /// The session runs in per-page mode.
    WrongMode,
}

/// Result of `submit_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { page: usize, score: PageScore },
    Declined,
    /// The session runs in per-question mode.
    WrongMode,
}

/// Result of `reset_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    Declined,
}

/// Where `jump_to_question` landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTarget {
    pub page: usize,
    pub page_changed: bool,
    /// Scroll anchor for the presentation layer.
    pub anchor: String,
}
