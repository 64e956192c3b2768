//! Paths and options for doto logging

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Name of the per-user directory under the home directory
pub const CONFIG_DIR_NAME: &str = ".doto-logs";

/// Name of the logs directory inside the config directory
pub const LOGS_DIR_NAME: &str = "logs";

/// Options for [`configure`](crate::setup::configure)
///
/// Host applications can embed this in their own config files; every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingOptions {
    /// Mirror DEBUG and above to the local syslog socket when it exists
    #[serde(default)]
    pub use_syslog: bool,

    /// Persist to this exact file without rotation.
    /// When unset (or empty) a dated, rotating file in the logs directory is used.
    #[serde(default)]
    pub filename: Option<PathBuf>,
}

impl LoggingOptions {
    pub fn with_syslog(mut self, use_syslog: bool) -> Self {
        self.use_syslog = use_syslog;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// The fixed persistent file, if one was given
    pub fn fixed_file(&self) -> Option<&Path> {
        self.filename
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Directory layout used by logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    debug_file: PathBuf,
}

impl LogPaths {
    /// Layout under the user's home directory, dated at process start
    pub fn from_home() -> Self {
        Self::under(config_dir(), process_start_date())
    }

    /// Layout under an explicit config directory
    pub fn under(config_dir: impl Into<PathBuf>, date: NaiveDate) -> Self {
        let config_dir = config_dir.into();
        let logs_dir = config_dir.join(LOGS_DIR_NAME);
        let debug_file = logs_dir.join(debug_file_name(date));
        Self {
            config_dir,
            logs_dir,
            debug_file,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Default rotating log file
    pub fn debug_file(&self) -> &Path {
        &self.debug_file
    }
}

impl Default for LogPaths {
    fn default() -> Self {
        Self::from_home()
    }
}

/// UTC calendar date, fixed on first use for the rest of the process
pub fn process_start_date() -> NaiveDate {
    static START: OnceLock<NaiveDate> = OnceLock::new();
    *START.get_or_init(|| Utc::now().date_naive())
}

/// File name of the dated debug log
pub fn debug_file_name(date: NaiveDate) -> String {
    format!("debug-{}.log", date.format("%Y-%m-%d"))
}

/// Get the base configuration directory (~/.doto-logs)
/// Falls back to ./.doto-logs if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for logs");
        PathBuf::from(CONFIG_DIR_NAME)
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME))
}
