use std::fmt;

/// Actions that must be confirmed by the user before they mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPrompt {
    SubmitPage { page: usize },
    ResetProgress,
}

impl fmt::Display for ConfirmPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitPage { page } => {
                write!(f, "Submit page {page}? Results will be shown for every question on it.")
            }
            Self::ResetProgress => {
                f.write_str("Clear all recorded answers? This cannot be undone.")
            }
        }
    }
}

/// Asks the user to approve a confirmation-gated action.
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, prompt: ConfirmPrompt) -> bool;
}

impl<F> ConfirmGate for F
where
    F: Fn(ConfirmPrompt) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: ConfirmPrompt) -> bool {
        self(prompt)
    }
}
