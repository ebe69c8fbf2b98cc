use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::DEFAULT_MAX_WORKERS;
use crate::fetch::FetchSettings;
use crate::filename::OutputFormat;
use crate::retry::RetryPolicy;
use crate::validate::UrlPolicy;

pub const ENV_API_KEY: &str = "SCRAPER_API_KEY";
pub const ENV_ENDPOINT: &str = "SCRAPER_ENDPOINT";
pub const ENV_TIMEOUT: &str = "SCRAPER_TIMEOUT";
pub const ENV_RETRIES: &str = "SCRAPER_RETRIES";
pub const ENV_RETRY_DELAY: &str = "SCRAPER_RETRY_DELAY";
pub const ENV_WORKERS: &str = "SCRAPER_WORKERS";
pub const ENV_OUTPUT_DIR: &str = "SCRAPER_OUTPUT_DIR";
pub const ENV_OUTPUT_FORMAT: &str = "SCRAPER_OUTPUT_FORMAT";
pub const ENV_STRICT_URLS: &str = "SCRAPER_STRICT_URLS";

/// Placeholder values that count as "no key configured".
const PLACEHOLDER_KEYS: &[&str] = &["your_api_key_here", "changeme"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Parse { key: &'static str, value: String },
    #[error("{key}: {value} is outside {min}..={max}")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("{key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Everything the engine needs, built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub retry: RetryPolicy,
    pub max_workers: usize,
    pub url_policy: UrlPolicy,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub write_report: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default_with_output(PathBuf::from("scraped_data"))
    }
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            fetch: FetchSettings::default(),
            retry: RetryPolicy::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            url_policy: UrlPolicy::permissive(),
            output_dir,
            format: OutputFormat::Text,
            write_report: true,
        }
    }

    /// Build from `SCRAPER_*` keys; anything missing keeps its default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            config.fetch.api_key = key;
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            config.fetch.endpoint = endpoint;
        }
        if let Some(value) = get(ENV_TIMEOUT) {
            config.fetch.request_timeout =
                Duration::from_secs(parse_in_range(ENV_TIMEOUT, &value, 1, 60)?);
        }
        if let Some(value) = get(ENV_RETRIES) {
            config.retry.retries = parse_in_range(ENV_RETRIES, &value, 1, 10)? as u32;
        }
        if let Some(value) = get(ENV_RETRY_DELAY) {
            let secs: f64 = value.parse().map_err(|_| ConfigError::Parse {
                key: ENV_RETRY_DELAY,
                value: value.clone(),
            })?;
            config.retry.base_delay =
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::Invalid {
                    key: ENV_RETRY_DELAY,
                    message: format!("{value} is not a valid delay"),
                })?;
        }
        if let Some(value) = get(ENV_WORKERS) {
            config.max_workers = parse_in_range(ENV_WORKERS, &value, 1, 10)? as usize;
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(value) = get(ENV_OUTPUT_FORMAT) {
            config.format = value.parse().map_err(|_| ConfigError::Parse {
                key: ENV_OUTPUT_FORMAT,
                value,
            })?;
        }
        if let Some(value) = get(ENV_STRICT_URLS) {
            if parse_bool(ENV_STRICT_URLS, &value)? {
                config.url_policy = UrlPolicy::strict();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Range checks shared by every way of building a config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(ENV_WORKERS, self.max_workers as u64, 1, 10)?;
        check_range(ENV_TIMEOUT, self.fetch.request_timeout.as_secs(), 1, 60)?;
        check_range(ENV_RETRIES, u64::from(self.retry.retries), 1, 10)?;
        match url::Url::parse(&self.fetch.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::Invalid {
                key: ENV_ENDPOINT,
                message: format!("{} is not an http(s) url", self.fetch.endpoint),
            }),
        }
    }

    /// True when no usable API key is configured. Requests still go out and
    /// fail at the proxy with an HTTP error.
    pub fn api_key_missing(&self) -> bool {
        let key = self.fetch.api_key.trim();
        key.is_empty() || PLACEHOLDER_KEYS.iter().any(|p| key.eq_ignore_ascii_case(p))
    }
}

/// Range-checked as `u64` so narrowing afterwards cannot wrap.
fn parse_in_range(key: &'static str, value: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let parsed: u64 = value.parse().map_err(|_| ConfigError::Parse {
        key,
        value: value.to_string(),
    })?;
    check_range(key, parsed, min, max)?;
    Ok(parsed)
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse {
            key,
            value: value.to_string(),
        }),
    }
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            min,
            max,
        })
    }
}
