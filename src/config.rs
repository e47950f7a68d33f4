use crate::clock::{Clock, LocalClock};
use crate::error::Result;
use crate::tally::TallyLog;
use crate::os::{self, ErrorTextFn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Construction-time settings of a [`TallyLog`].
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```
/// use eventtally::Config;
///
/// let config: Config = serde_json::from_str(r#"{"max_files": 5}"#).unwrap();
/// assert_eq!(config.max_files, 5);
/// assert_eq!(config.max_file_size, 10 << 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Directory the subfolders are created under. `None` resolves to the
    /// local data directory (see [`os::default_base_dir`]).
    pub base_dir: Option<PathBuf>,

    /// First subfolder under the base directory.
    pub subfolder1: Option<String>,

    /// Second subfolder, nested in the first.
    pub subfolder2: Option<String>,

    /// Rotate once the open file grows past this many bytes. `0` never
    /// rotates.
    pub max_file_size: u64,

    /// Log files kept after a rotation, counting the new one. `0` keeps all.
    pub max_files: usize,

    /// Distinct events held in memory before a forced flush.
    pub max_items: usize,

    /// Ask the file system to encrypt log files at rest. Only honored on
    /// Windows.
    pub encrypt: bool,

    /// Push every record to disk before returning.
    pub write_through: bool,

    /// Open a new file for every flush and close it afterwards, instead of
    /// holding one open for the log's lifetime.
    pub open_per_flush: bool,

    /// Flush unwritten changes when the log is dropped.
    pub flush_on_drop: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_dir: None,
            subfolder1: Some("GEN".to_string()),
            subfolder2: Some("Logs".to_string()),
            max_file_size: 10 << 20,
            max_files: 3,
            max_items: 10_000_000,
            encrypt: true,
            write_through: true,
            open_per_flush: false,
            flush_on_drop: true,
        }
    }
}

impl Config {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The directory log files are written to.
    pub fn log_dir(&self) -> PathBuf {
        let mut dir = self.base_dir.clone().unwrap_or_else(os::default_base_dir);
        for sub in [&self.subfolder1, &self.subfolder2].into_iter().flatten() {
            dir.push(sub);
        }
        dir
    }
}

/// Builder for a [`TallyLog`].
///
/// ```no_run
/// use eventtally::TallyLog;
///
/// let log = TallyLog::builder()
///     .base_dir("/var/lib/myapp")
///     .subfolders("firewall", "Logs")
///     .max_file_size(1 << 20)
///     .max_files(5)
///     .build();
/// ```
pub struct TallyLogBuilder {
    config: Config,
    clock: Arc<dyn Clock>,
    error_text: ErrorTextFn,
}

impl TallyLogBuilder {
    pub(crate) fn new() -> Self {
        TallyLogBuilder {
            config: Config::default(),
            clock: Arc::new(LocalClock),
            error_text: os::os_error_text,
        }
    }

    /// Start from an existing config.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = Some(dir.into());
        self
    }

    /// Set both subfolders.
    pub fn subfolders(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.config.subfolder1 = Some(first.into());
        self.config.subfolder2 = Some(second.into());
        self
    }

    /// Write directly into the base directory.
    pub fn no_subfolders(mut self) -> Self {
        self.config.subfolder1 = None;
        self.config.subfolder2 = None;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn max_files(mut self, count: usize) -> Self {
        self.config.max_files = count;
        self
    }

    pub fn max_items(mut self, count: usize) -> Self {
        self.config.max_items = count;
        self
    }

    pub fn encrypt(mut self, on: bool) -> Self {
        self.config.encrypt = on;
        self
    }

    pub fn write_through(mut self, on: bool) -> Self {
        self.config.write_through = on;
        self
    }

    pub fn open_per_flush(mut self, on: bool) -> Self {
        self.config.open_per_flush = on;
        self
    }

    pub fn flush_on_drop(mut self, on: bool) -> Self {
        self.config.flush_on_drop = on;
        self
    }

    /// Replace the wall clock used for timestamps and file names.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the OS error-to-text translator.
    pub fn error_text(mut self, lookup: ErrorTextFn) -> Self {
        self.error_text = lookup;
        self
    }

    /// Create the log.
    ///
    /// Never fails. If the directory or file cannot be created, the problem
    /// is logged and flushed records are dropped.
    pub fn build(self) -> TallyLog {
        TallyLog::from_parts(self.config, self.clock, self.error_text)
    }
}
