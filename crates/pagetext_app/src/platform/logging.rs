//! Logger setup for the pagetext binary.
//!
//! Logs go to the terminal and to `<log dir>/scraper.log`. When the log
//! directory cannot be used, logging continues on the terminal only.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const ENV_LOG_LEVEL: &str = "SCRAPER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SCRAPER_LOG_DIR";
pub const LOG_FILENAME: &str = "scraper.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub dir: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            dir: PathBuf::from("logs"),
        }
    }
}

impl LogSettings {
    /// Unknown level names fall back to `info` with a note on stderr.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(raw) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            match LevelFilter::from_str(raw.trim()) {
                Ok(level) => settings.level = level,
                Err(_) => eprintln!("Warning: unknown {ENV_LOG_LEVEL} {raw:?}, using info"),
            }
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|v| !v.trim().is_empty()) {
            settings.dir = PathBuf::from(dir.trim());
        }
        settings
    }
}

/// Install the global logger. Returns the log file path when one is in use.
pub fn initialize(settings: &LogSettings) -> Option<PathBuf> {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        settings.level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let log_path = settings.dir.join(LOG_FILENAME);
    let file_in_use = match open_log_file(&settings.dir, &log_path) {
        Ok(file) => {
            loggers.push(WriteLogger::new(settings.level, config, file));
            Some(log_path)
        }
        Err(err) => {
            eprintln!(
                "Warning: Could not open log file at {:?}: {}; logging to terminal only",
                log_path, err
            );
            None
        }
    };

    let _ = CombinedLogger::init(loggers);
    file_in_use
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn open_log_file(dir: &Path, path: &Path) -> std::io::Result<File> {
    fs::create_dir_all(dir)?;
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_info_in_logs_dir() {
        let settings = LogSettings::from_lookup(|_| None);
        assert_eq!(settings, LogSettings::default());
    }

    #[test]
    fn settings_read_level_and_dir() {
        let settings = LogSettings::from_lookup(|key| match key {
            ENV_LOG_LEVEL => Some("Debug".into()),
            ENV_LOG_DIR => Some("/tmp/pagetext-logs".into()),
            _ => None,
        });
        assert_eq!(settings.level, LevelFilter::Debug);
        assert_eq!(settings.dir, PathBuf::from("/tmp/pagetext-logs"));
    }

    #[test]
    fn unknown_level_keeps_default() {
        let settings = LogSettings::from_lookup(|key| {
            (key == ENV_LOG_LEVEL).then(|| "loud".to_string())
        });
        assert_eq!(settings.level, LevelFilter::Info);
    }

    #[test]
    fn log_file_is_created_in_missing_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("logs");
        let path = dir.join(LOG_FILENAME);
        open_log_file(&dir, &path).unwrap();
        assert!(path.is_file());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn unusable_log_dir_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x").unwrap();
        assert!(open_log_file(&blocker, &blocker.join(LOG_FILENAME)).is_err());
    }
}
