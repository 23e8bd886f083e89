use std::env;
use std::fmt;
use std::str::FromStr;

use exam_core::paging::Paginator;
use exam_core::reveal::RevealMode;
use storage::progress::ProgressKeys;

use crate::error::ConfigError;

pub const PAGE_SIZE_VAR: &str = "EXAM_PAGE_SIZE";
pub const REVEAL_MODE_VAR: &str = "EXAM_REVEAL_MODE";
pub const SECOND_SOURCE_VAR: &str = "EXAM_SECOND_SOURCE";

/// What happens when the second bank source cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecondSourcePolicy {
    /// Any failure of the second source fails the whole load.
    #[default]
    Required,
    /// Continue with the first source only, logging a warning.
    Optional,
}

impl fmt::Display for SecondSourcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::Optional => f.write_str("optional"),
        }
    }
}

impl FromStr for SecondSourcePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(Self::Required),
            "optional" => Ok(Self::Optional),
            _ => Err(ConfigError::InvalidSecondSourcePolicy { raw: s.to_owned() }),
        }
    }
}

/// Deployment-level knobs for a quiz session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub paginator: Paginator,
    pub reveal_mode: RevealMode,
    pub second_source: SecondSourcePolicy,
    pub keys: ProgressKeys,
}

impl SessionConfig {
    /// Defaults overridden by `EXAM_PAGE_SIZE`, `EXAM_REVEAL_MODE` and
    /// `EXAM_SECOND_SOURCE` when set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = non_empty(lookup(PAGE_SIZE_VAR)) {
            let size = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: PAGE_SIZE_VAR,
                    raw: raw.clone(),
                })?;
            config = config.with_page_size(size)?;
        }
        if let Some(raw) = non_empty(lookup(REVEAL_MODE_VAR)) {
            config.reveal_mode = raw.parse()?;
        }
        if let Some(raw) = non_empty(lookup(SECOND_SOURCE_VAR)) {
            config.second_source = raw.parse()?;
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Paging` if `page_size` is zero.
    pub fn with_page_size(mut self, page_size: usize) -> Result<Self, ConfigError> {
        self.paginator = Paginator::new(page_size)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_reveal_mode(mut self, mode: RevealMode) -> Self {
        self.reveal_mode = mode;
        self
    }

    #[must_use]
    pub fn with_second_source(mut self, policy: SecondSourcePolicy) -> Self {
        self.second_source = policy;
        self
    }

    #[must_use]
    pub fn with_keys(mut self, keys: ProgressKeys) -> Self {
        self.keys = keys;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_are_fifty_per_page_and_per_question() {
        let config = SessionConfig::from_vars(lookup(&[])).unwrap();
        assert_eq!(config.paginator.page_size(), 50);
        assert_eq!(config.reveal_mode, RevealMode::PerQuestion);
        assert_eq!(config.second_source, SecondSourcePolicy::Required);
        assert_eq!(config.keys.answers, "exam_user_answers");
    }

    #[test]
    fn variables_override_defaults() {
        let config = SessionConfig::from_vars(lookup(&[
            (PAGE_SIZE_VAR, "20"),
            (REVEAL_MODE_VAR, "per-page"),
            (SECOND_SOURCE_VAR, "Optional"),
        ]))
        .unwrap();
        assert_eq!(config.paginator.page_size(), 20);
        assert_eq!(config.reveal_mode, RevealMode::PerPage);
        assert_eq!(config.second_source, SecondSourcePolicy::Optional);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = SessionConfig::from_vars(lookup(&[(PAGE_SIZE_VAR, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Paging(_)));

        let err = SessionConfig::from_vars(lookup(&[(PAGE_SIZE_VAR, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let err = SessionConfig::from_vars(lookup(&[(REVEAL_MODE_VAR, "never")])).unwrap_err();
        assert!(matches!(err, ConfigError::RevealMode(_)));

        let err = SessionConfig::from_vars(lookup(&[(SECOND_SOURCE_VAR, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSecondSourcePolicy { .. }));
    }
}
