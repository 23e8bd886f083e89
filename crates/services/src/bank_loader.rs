use std::fmt;
use std::path::PathBuf;

use reqwest::{Client, Url};

use exam_core::model::{Question, QuestionBank, QuestionRecord};

use crate::config::SecondSourcePolicy;
use crate::error::LoadError;

/// Where one JSON question array comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BankSource {
    File(PathBuf),
    Url(Url),
}

impl BankSource {
    /// `http://` and `https://` strings become URLs, anything else a path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Self::Url(url);
            }
        }
        Self::File(PathBuf::from(trimmed))
    }
}

impl fmt::Display for BankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Loads and merges the two bank sources.
#[derive(Clone)]
pub struct BankLoader {
    client: Client,
    policy: SecondSourcePolicy,
}

impl BankLoader {
    #[must_use]
    pub fn new(policy: SecondSourcePolicy) -> Self {
        Self::with_client(Client::new(), policy)
    }

    /// Use a preconfigured HTTP client for URL sources.
    #[must_use]
    pub fn with_client(client: Client, policy: SecondSourcePolicy) -> Self {
        Self { client, policy }
    }

    /// Fetch both sources concurrently and merge them, first source first.
    ///
    /// Both fetches must finish before anything is validated. A failure of the
    /// first source is always fatal; a failure of the second honours the
    /// configured `SecondSourcePolicy`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on any fatal fetch, parse or validation failure, or
    /// when the merged bank contains duplicate ids.
    pub async fn load(
        &self,
        primary: &BankSource,
        secondary: &BankSource,
    ) -> Result<QuestionBank, LoadError> {
        let (first, second) = tokio::join!(self.fetch(primary), self.fetch(secondary));

        let mut questions = first?;
        match second {
            Ok(more) => questions.extend(more),
            Err(err) if self.policy == SecondSourcePolicy::Optional => {
                tracing::warn!(
                    source = %secondary,
                    error = %err,
                    "second question source unavailable, continuing with the first only"
                );
            }
            Err(err) => return Err(err),
        }

        let bank = QuestionBank::new(questions)?;
        tracing::info!(questions = bank.len(), "question bank loaded");
        Ok(bank)
    }

    async fn fetch(&self, source: &BankSource) -> Result<Vec<Question>, LoadError> {
        let origin = source.to_string();
        let body = match source {
            BankSource::File(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|error| LoadError::Read {
                        origin: origin.clone(),
                        error,
                    })?
            }
            BankSource::Url(url) => self.fetch_url(url, &origin).await?,
        };

        let records = parse_records(&body).map_err(|error| LoadError::Parse {
            origin: origin.clone(),
            error,
        })?;
        tracing::debug!(%origin, records = records.len(), "parsed question source");

        QuestionBank::validate_records(records).map_err(|error| LoadError::Invalid { origin, error })
    }

    async fn fetch_url(&self, url: &Url, origin: &str) -> Result<Vec<u8>, LoadError> {
        let http = |error| LoadError::Http {
            origin: origin.to_owned(),
            error,
        };

        let response = self.client.get(url.clone()).send().await.map_err(http)?;
        if !response.status().is_success() {
            return Err(LoadError::HttpStatus {
                origin: origin.to_owned(),
                status: response.status(),
            });
        }

        let bytes = response.bytes().await.map_err(http)?;
        Ok(bytes.to_vec())
    }
}

/// Decode one source document: a JSON array of question records.
///
/// # Errors
///
/// Returns the `serde_json` error if the body is not an array of records.
pub fn parse_records(body: &[u8]) -> Result<Vec<QuestionRecord>, serde_json::Error> {
    serde_json::from_slice(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_parse_urls_and_paths() {
        assert!(matches!(
            BankSource::parse("https://example.com/data.json"),
            BankSource::Url(_)
        ));
        assert_eq!(
            BankSource::parse(" ./data2.json "),
            BankSource::File(PathBuf::from("./data2.json"))
        );
    }

    #[test]
    fn parse_records_rejects_non_arrays() {
        assert!(parse_records(br#"{"id":"1"}"#).is_err());
        assert!(parse_records(b"[]").unwrap().is_empty());
    }
}
