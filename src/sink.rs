//! The file a log flushes into: naming, opening, size-based rotation and
//! retention of old files.

use crate::clock::{self, Clock};
use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Extension of every log file. Retention only considers files with it.
pub const EXTENSION: &str = "json";

/// Written before every record except the first in a file.
pub const SEPARATOR: &str = ",\n";

struct OpenFile {
    path: PathBuf,
    file: File,
}

pub(crate) struct FileSink {
    dir: PathBuf,
    max_size: u64,
    max_files: usize,
    encrypt: bool,
    write_through: bool,
    clock: Arc<dyn Clock>,
    current: Option<OpenFile>,
    rotations: u64,
}

impl FileSink {
    pub(crate) fn new(
        dir: PathBuf,
        max_size: u64,
        max_files: usize,
        encrypt: bool,
        write_through: bool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        FileSink {
            dir,
            max_size,
            max_files,
            encrypt,
            write_through,
            clock,
            current: None,
            rotations: 0,
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|open| open.path.as_path())
    }

    pub(crate) fn rotations(&self) -> u64 {
        self.rotations
    }

    pub(crate) fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Open a freshly named file, closing any file already open.
    pub(crate) fn open(&mut self) -> Result<()> {
        self.close();

        fs::create_dir_all(&self.dir).map_err(|source| Error::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.next_path();
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        platform_options(&mut options, self.encrypt, self.write_through);

        let file = options.open(&path).map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;

        log::debug!("eventtally: opened {}", path.display());
        self.current = Some(OpenFile { path, file });
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        if let Some(open) = self.current.take() {
            log::debug!("eventtally: closed {}", open.path.display());
        }
    }

    /// Append one record, rotating first if the file is over its size limit.
    pub(crate) fn write_record(&mut self, record: &str) -> Result<()> {
        self.rotate_if_needed()?;

        let write_through = self.write_through;
        let open = self.current.as_mut().ok_or(Error::NotOpen)?;
        let size = open.file.metadata()?.len();

        let mut buf = String::with_capacity(record.len() + SEPARATOR.len());
        if size > 0 {
            buf.push_str(SEPARATOR);
        }
        buf.push_str(record);

        let result = open.file.write_all(buf.as_bytes()).and_then(|()| {
            if write_through {
                open.file.sync_data()
            } else {
                Ok(())
            }
        });
        result.map_err(|source| Error::Write {
            path: open.path.clone(),
            source,
        })
    }

    /// Rotate when a size limit is set and the open file exceeds it.
    ///
    /// Returns whether a rotation happened.
    pub(crate) fn rotate_if_needed(&mut self) -> Result<bool> {
        if self.max_size == 0 {
            return Ok(false);
        }
        let Some(open) = &self.current else {
            return Ok(false);
        };
        let size = open.file.metadata()?.len();
        if size <= self.max_size {
            return Ok(false);
        }

        log::debug!(
            "eventtally: {} is {size} bytes (limit {}), rotating",
            open.path.display(),
            self.max_size
        );
        self.close();
        if self.max_files > 0 {
            prune(&self.dir, self.max_files - 1);
        }
        self.rotations += 1;
        self.open()?;
        Ok(true)
    }

    /// A path named after the current time that no existing file uses.
    fn next_path(&self) -> PathBuf {
        let stem = clock::format_file_stem(&self.clock.now());
        let path = self.dir.join(format!("{stem}.{EXTENSION}"));
        if !path.exists() {
            return path;
        }
        (1u32..)
            .map(|n| self.dir.join(format!("{stem}-{n}.{EXTENSION}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or(path)
    }
}

/// Delete all but the `keep` newest log files in `dir`, oldest first.
///
/// Files are ordered by creation time where the platform records it, by
/// modification time otherwise. Failures are logged and skipped.
pub(crate) fn prune(dir: &Path, keep: usize) {
    let mut files = log_files(dir);
    if files.len() <= keep {
        return;
    }

    // newest first
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    for (_, path) in files.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("eventtally: removed old log {}", path.display()),
            Err(e) => log::warn!("eventtally: cannot remove old log {}: {e}", path.display()),
        }
    }
}

/// Log files in `dir` with their creation (or modification) time.
pub(crate) fn log_files(dir: &Path) -> Vec<(SystemTime, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("eventtally: cannot list {}: {e}", dir.display());
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                return None;
            }
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            let time = meta
                .created()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Some((time, path))
        })
        .collect()
}

#[cfg(windows)]
fn platform_options(options: &mut OpenOptions, encrypt: bool, write_through: bool) {
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_SHARE_READ: u32 = 0x0000_0001;
    const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x0000_0020;
    const FILE_ATTRIBUTE_NOT_CONTENT_INDEXED: u32 = 0x0000_2000;
    const FILE_ATTRIBUTE_ENCRYPTED: u32 = 0x0000_4000;
    const FILE_FLAG_WRITE_THROUGH: u32 = 0x8000_0000;

    let mut attributes = FILE_ATTRIBUTE_ARCHIVE | FILE_ATTRIBUTE_NOT_CONTENT_INDEXED;
    if encrypt {
        attributes |= FILE_ATTRIBUTE_ENCRYPTED;
    }
    options.share_mode(FILE_SHARE_READ).attributes(attributes);
    if write_through {
        options.custom_flags(FILE_FLAG_WRITE_THROUGH);
    }
}

#[cfg(not(windows))]
fn platform_options(_options: &mut OpenOptions, encrypt: bool, _write_through: bool) {
    if encrypt {
        log::debug!("eventtally: encryption at rest is not available on this platform");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::LocalClock;
    use tempfile::tempdir;

    fn sink(dir: &Path, max_size: u64, max_files: usize) -> FileSink {
        FileSink::new(
            dir.to_path_buf(),
            max_size,
            max_files,
            false,
            false,
            Arc::new(LocalClock),
        )
    }

    #[test]
    fn write_without_open_fails() {
        let dir = tempdir().unwrap();
        let mut sink = sink(dir.path(), 0, 0);
        assert!(matches!(sink.write_record("{}"), Err(Error::NotOpen)));
    }

    #[test]
    fn records_are_comma_separated() {
        let dir = tempdir().unwrap();
        let mut sink = sink(dir.path(), 0, 0);
        sink.open().unwrap();
        sink.write_record(r#"{"a":1}"#).unwrap();
        sink.write_record(r#"{"a":2}"#).unwrap();

        let text = fs::read_to_string(sink.current_path().unwrap()).unwrap();
        assert_eq!(text, "{\"a\":1},\n{\"a\":2}");
    }

    #[test]
    fn reopening_never_reuses_a_name() {
        let dir = tempdir().unwrap();
        let mut sink = sink(dir.path(), 0, 0);
        sink.open().unwrap();
        let first = sink.current_path().unwrap().to_path_buf();
        sink.open().unwrap();
        let second = sink.current_path().unwrap().to_path_buf();
        assert_ne!(first, second);
        assert_eq!(log_files(dir.path()).len(), 2);
    }

    #[test]
    fn prune_keeps_newest() {
        let dir = tempdir().unwrap();
        for name in ["a.json", "b.json", "c.json"] {
            fs::write(dir.path().join(name), "{}").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        prune(dir.path(), 1);

        assert!(dir.path().join("c.json").exists());
        assert!(!dir.path().join("a.json").exists());
        assert!(!dir.path().join("b.json").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn open_fails_when_dir_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut sink = sink(&blocker.join("logs"), 0, 0);
        assert!(matches!(sink.open(), Err(Error::CreateDir { .. })));
        assert!(!sink.is_open());
    }
}
