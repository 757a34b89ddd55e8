use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

use crate::progress::DEFAULT_STATUS_BATCH;
use crate::scanner::ScanFilter;

/// Defaults for the walk filters, status cadence and logging. Paths are
/// never part of the configuration; callers always pass them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub include_files: bool,
    pub extensions: Vec<String>,
    pub excluded_folders: Vec<String>,
    /// Items between two status lines.
    pub status_batch: usize,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            include_files: false,
            extensions: Vec::new(),
            excluded_folders: Vec::new(),
            status_batch: DEFAULT_STATUS_BATCH,
            logging: LoggingConfig::default(),
        }
    }
}

/// `[logging]` table. `TRACING_LEVEL` and `LOG_FILE_PATH` still win when set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Pretty log lines on stderr.
    pub console: bool,
    /// Plain log file; `None` disables it.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            file: Some(PathBuf::from("./logs/folder-scanner.log")),
        }
    }
}

impl AppConfig {
    pub fn to_filter(&self) -> ScanFilter {
        ScanFilter::all()
            .include_files(self.include_files)
            .with_extensions(&self.extensions)
            .with_excluded_folders(&self.excluded_folders)
    }
}

/// Load `Config.{toml,json,yaml}` from the working directory (optional),
/// overlaid with `FOLDER_SCANNER_*` environment variables. Nested keys use
/// a double underscore, as in `FOLDER_SCANNER_LOGGING__LEVEL`.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_configuration_from("Config")
}

pub fn load_configuration_from(name: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("FOLDER_SCANNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("extensions")
                .with_list_parse_key("excluded_folders"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
