//! Named settings presets stored as RON next to the output directory.
//!
//! The API key is never written to a preset.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use pagetext_engine::{
    ensure_output_dir, AtomicFileWriter, EngineConfig, OutputFormat, PersistError, RetryPolicy,
    UrlPolicy,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PRESETS_DIRNAME: &str = "config_presets";
const PRESET_EXTENSION: &str = "ron";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset name {0:?} has no letters or digits")]
    InvalidName(String),
    #[error("preset {0:?} not found")]
    NotFound(String),
    #[error("failed to read preset {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse preset {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize preset: {0}")]
    Serialize(String),
    #[error("preset has unknown output format {0:?}")]
    Format(String),
    #[error("preset field {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub created: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_secs: f64,
    pub workers: usize,
    pub output_format: String,
    pub strict_urls: bool,
    pub write_report: bool,
}

impl Preset {
    pub fn from_config(name: &str, config: &EngineConfig) -> Self {
        Self {
            name: name.to_string(),
            created: Utc::now().to_rfc3339(),
            endpoint: config.fetch.endpoint.clone(),
            timeout_secs: config.fetch.request_timeout.as_secs(),
            retries: config.retry.retries,
            retry_delay_secs: config.retry.base_delay.as_secs_f64(),
            workers: config.max_workers,
            output_format: config.format.extension().to_string(),
            strict_urls: config.url_policy == UrlPolicy::strict(),
            write_report: config.write_report,
        }
    }

    /// Overwrite the preset's settings on `config`, leaving the API key and
    /// output directory alone.
    pub fn apply(&self, config: &mut EngineConfig) -> Result<(), PresetError> {
        let format: OutputFormat = self
            .output_format
            .parse()
            .map_err(|_| PresetError::Format(self.output_format.clone()))?;
        let retry_delay = Duration::try_from_secs_f64(self.retry_delay_secs).map_err(|_| {
            PresetError::InvalidValue {
                field: "retry_delay_secs",
                message: format!("{} is not a valid delay", self.retry_delay_secs),
            }
        })?;
        config.fetch.endpoint = self.endpoint.clone();
        config.fetch.request_timeout = Duration::from_secs(self.timeout_secs);
        config.retry = RetryPolicy::new(self.retries, retry_delay);
        config.max_workers = self.workers;
        config.format = format;
        config.url_policy = if self.strict_urls {
            UrlPolicy::strict()
        } else {
            UrlPolicy::permissive()
        };
        config.write_report = self.write_report;
        Ok(())
    }
}

/// Presets live beside the output directory, not inside it.
pub fn presets_dir(output_dir: &Path) -> PathBuf {
    match output_dir.parent() {
        Some(parent) => parent.join(PRESETS_DIRNAME),
        None => output_dir.join("..").join(PRESETS_DIRNAME),
    }
}

/// Anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn sanitize_preset_name(name: &str) -> Result<String, PresetError> {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !safe.chars().any(|c| c.is_ascii_alphanumeric()) {
        Err(PresetError::InvalidName(name.to_string()))
    } else {
        Ok(safe)
    }
}

pub fn save_preset(dir: &Path, name: &str, config: &EngineConfig) -> Result<PathBuf, PresetError> {
    let safe = sanitize_preset_name(name)?;
    ensure_output_dir(dir)?;

    let preset = Preset::from_config(&safe, config);
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&preset, pretty)
        .map_err(|err| PresetError::Serialize(err.to_string()))?;

    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let path = writer.write(&format!("{safe}.{PRESET_EXTENSION}"), &content)?;
    engine_info!("Saved preset {:?} to {:?}", safe, path);
    Ok(path)
}

pub fn load_preset(dir: &Path, name: &str) -> Result<Preset, PresetError> {
    let safe = sanitize_preset_name(name)?;
    let path = dir.join(format!("{safe}.{PRESET_EXTENSION}"));
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(PresetError::NotFound(safe));
        }
        Err(source) => return Err(PresetError::Read { path, source }),
    };

    let preset: Preset = ron::from_str(&content).map_err(|err| {
        engine_warn!("Failed to parse preset from {:?}: {}", path, err);
        PresetError::Parse {
            path: path.clone(),
            message: err.to_string(),
        }
    })?;
    engine_info!("Loaded preset {:?} from {:?}", preset.name, path);
    Ok(preset)
}
