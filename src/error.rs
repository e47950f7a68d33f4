use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the file sink and configuration loading.
///
/// The aggregator never surfaces sink errors to callers: a failed write is
/// logged and counted in [`FlushSummary`](crate::FlushSummary), and the
/// record is lost.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot create log directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("cannot open log file {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot write log file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("no log file is open")]
    NotOpen,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
