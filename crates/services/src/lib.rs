#![forbid(unsafe_code)]

pub mod bank_loader;
pub mod config;
pub mod error;
pub mod sessions;

pub use sessions as session;

pub use bank_loader::{BankLoader, BankSource, parse_records};
pub use config::{SecondSourcePolicy, SessionConfig};
pub use error::{ConfigError, LoadError};

pub use sessions::{
    AnswerOutcome, ConfirmGate, ConfirmPrompt, FavoritesSummary, JumpTarget, PageView,
    QuestionView, ResetOutcome, RevealOutcome, SessionController, SheetEntry, SubmitOutcome,
};
