use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_ADVANCE_DELAY_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_PATH: &str = "db.sqlite";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a whole number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub advance_delay: Duration,
    pub request_timeout: Duration,
    pub storage_path: String,
}

impl Config {
    /// Reads the configuration from the process environment (`.env` included once loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::NotANumber { name, value }),
                None => Ok(default),
            }
        };

        Ok(Self {
            api_url: lookup("FLAG_QUIZ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            advance_delay: Duration::from_millis(number(
                "FLAG_QUIZ_ADVANCE_DELAY_MS",
                DEFAULT_ADVANCE_DELAY_MS,
            )?),
            request_timeout: Duration::from_secs(number(
                "FLAG_QUIZ_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            storage_path: lookup("FLAG_QUIZ_DB").unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string()),
        })
    }
}
