mod confirm;
mod controller;
mod outcome;
mod view;

// Public API of the session subsystem.
pub use confirm::{ConfirmGate, ConfirmPrompt};
pub use controller::SessionController;
pub use outcome::{AnswerOutcome, JumpTarget, ResetOutcome, RevealOutcome, SubmitOutcome};
pub use view::{FavoritesSummary, OptionView, PageView, QuestionView, SheetEntry};
