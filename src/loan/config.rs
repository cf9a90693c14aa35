use super::{Loan, LoanBounds, LoanError, LoanState, RetryPolicy};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Errors that can occur when loading a [LoanConfig].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config validation failed: {0}")]
    Validation(#[from] LoanError),

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Settings of the loan form and its submission.
///
/// ```toml
/// default_amount = 10000.0
/// default_duration = 14
/// rate = 15.0
/// endpoint = "https://jsonplaceholder.typicode.com/posts"
/// max_retries = 3
///
/// [bounds]
/// min_amount = 5000.0
/// max_amount = 50000.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoanConfig {
    pub bounds: LoanBounds,
    pub default_amount: f64,
    /// Days.
    pub default_duration: u32,
    /// Annual rate, percent.
    pub rate: f64,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LoanConfig {
    fn default() -> Self {
        LoanConfig {
            bounds: LoanBounds::default(),
            default_amount: 10_000.0,
            default_duration: 14,
            rate: 15.0,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 2_000,
        }
    }
}

impl LoanConfig {
    /// Loads and validates the configuration at `path`.
    ///
    /// If the file doesn't exist, returns `LoanConfig::default()`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(LoanConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LoanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks:
    /// - the bounds admit at least one amount and one duration
    /// - the default amount and duration lie within the bounds
    /// - the rate is a percentage in `(0, 100]`
    /// - the endpoint is an absolute URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounds.validate()?;
        self.bounds.check_amount(self.default_amount)?;
        self.bounds.check_duration(self.default_duration)?;

        if !self.rate.is_finite() || self.rate <= 0.0 || self.rate > 100.0 {
            return Err(LoanError::InvalidRate(format!("{} is not in (0, 100]", self.rate)).into());
        }

        reqwest::Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// The state of a fresh loan form.
    pub fn initial_state(&self) -> LoanState {
        LoanState::new(Loan::new(
            self.default_amount,
            self.default_duration,
            self.rate,
        ))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
