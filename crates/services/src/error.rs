//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::BankError;
use exam_core::paging::PagingError;
use exam_core::reveal::ParseRevealModeError;

/// Errors emitted while loading the question bank. All of them are fatal to
/// the session; no partial bank is ever returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("failed to read {origin}: {error}")]
    Read {
        origin: String,
        #[source]
        error: std::io::Error,
    },
    #[error("request for {origin} failed: {error}")]
    Http {
        origin: String,
        #[source]
        error: reqwest::Error,
    },
    #[error("failed to load {origin}: {status}")]
    HttpStatus {
        origin: String,
        status: reqwest::StatusCode,
    },
    #[error("{origin} is not a question array: {error}")]
    Parse {
        origin: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("{origin}: {error}")]
    Invalid {
        origin: String,
        #[source]
        error: BankError,
    },
    #[error(transparent)]
    Bank(#[from] BankError),
}

/// Errors emitted while reading session configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("invalid second source policy {raw:?} (expected required or optional)")]
    InvalidSecondSourcePolicy { raw: String },
    #[error(transparent)]
    Paging(#[from] PagingError),
    #[error(transparent)]
    RevealMode(#[from] ParseRevealModeError),
}
