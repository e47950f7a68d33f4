use crate::clock::{self, Clock};
use crate::config::{Config, TallyLogBuilder};
use crate::fields::Fields;
use crate::level::{CallSite, Level};
use crate::map::{Identity, TallyMap, TIME_FIELD};
use crate::os::{self, ErrorTextFn};
use crate::render;
use crate::sink::FileSink;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Severity field appended to every helper-built key.
pub const LEVEL_FIELD: &str = "_LEVEL_";
/// Calling thread field appended to every helper-built key.
pub const THREAD_FIELD: &str = "_THREAD_";
/// Free-text message field.
pub const MESSAGE_FIELD: &str = "_MSG_";
/// OS error code, as hex text.
pub const OS_ERROR_FIELD: &str = "_OSERROR_";
/// OS error description.
pub const OS_ERROR_TEXT_FIELD: &str = "_OSERRORTEXT_";
/// Caller-supplied error code.
pub const ERROR_CODE_FIELD: &str = "_ERRORCODE_";
pub const FUNCTION_FIELD: &str = "__FUNCTION__";
pub const LINE_FIELD: &str = "__LINE__";
pub const FILE_FIELD: &str = "__FILE__";

/// Outcome of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Records written to disk.
    pub written: usize,
    /// Records lost because the file could not be opened or written.
    pub dropped: usize,
}

struct Inner {
    map: TallyMap,
    sink: FileSink,
    dirty: bool,
    ceiling_flushes: u64,
}

/// A deduplicating event log.
///
/// Events are keyed by their field sequence. The first occurrence of a key
/// is stored with its extras and a `_TIME_` stamp. Repeats only bump a
/// counter. [`flush`](TallyLog::flush) writes every entry, oldest first, as
/// one JSON object per entry:
///
/// ```text
/// {"_COUNT_":2,"port":22,"_LEVEL_":3,"_THREAD_":1,"_EXTRA_":{"rule":"learn","_TIME_":"2024-05-01 10:00:00.123"}},
/// {"_COUNT_":1,...}
/// ```
///
/// Objects are comma separated, not wrapped in an array. Wrap the file in
/// `[`…`]` to read it as a JSON document.
///
/// All state sits behind one lock, so a `TallyLog` can be shared between
/// threads (by reference or in an `Arc`). Failing to write is never fatal:
/// the affected records are dropped and a warning goes to the `log` facade.
///
/// # Examples
///
/// ```no_run
/// use eventtally::{fields, Level, TallyLog};
///
/// let log = TallyLog::builder().base_dir("/tmp/myapp").build();
///
/// let key = fields! { "port" => 22, "proto" => "tcp" };
/// let extras = fields! { "rule" => "learn" };
/// assert!(log.log_basic(Level::UserStatus, key.clone(), extras.clone()));
/// assert!(!log.log_basic(Level::UserStatus, key, extras)); // counted, not stored
///
/// log.flush();
/// ```
pub struct TallyLog {
    config: Config,
    clock: Arc<dyn Clock>,
    error_text: ErrorTextFn,
    inner: Mutex<Inner>,
}

impl TallyLog {
    /// Start configuring a new log.
    pub fn builder() -> TallyLogBuilder {
        TallyLogBuilder::new()
    }

    /// A log with the given config, the local clock and OS error texts.
    pub fn new(config: Config) -> Self {
        TallyLog::builder().config(config).build()
    }

    pub(crate) fn from_parts(config: Config, clock: Arc<dyn Clock>, error_text: ErrorTextFn) -> Self {
        let mut sink = FileSink::new(
            config.log_dir(),
            config.max_file_size,
            config.max_files,
            config.encrypt,
            config.write_through,
            Arc::clone(&clock),
        );
        if !config.open_per_flush {
            if let Err(e) = sink.open() {
                log::warn!("eventtally: {e}; events will not be persisted");
            }
        }

        TallyLog {
            config,
            clock,
            error_text,
            inner: Mutex::new(Inner {
                map: TallyMap::new(),
                sink,
                dirty: false,
                ceiling_flushes: 0,
            }),
        }
    }

    /// Record one occurrence of the event identified by `key`.
    ///
    /// Returns `true` if this is the first occurrence; `values` is then
    /// stored as the entry's extras, with a `_TIME_` stamp appended. Returns
    /// `false` if the key was already present; its count is incremented and
    /// `values` is discarded.
    ///
    /// When a new key arrives while the map already holds `max_items`
    /// entries, everything is flushed and the map starts over empty.
    pub fn add(&self, key: Fields, mut values: Fields) -> bool {
        let identity = Identity::of(&key);

        let mut inner = self.inner.lock();
        inner.dirty = true;
        if inner.map.increment(&identity) {
            return false;
        }

        if !inner.map.is_empty() && inner.map.len() >= self.config.max_items {
            log::debug!(
                "eventtally: {} events in memory, flushing before insert",
                inner.map.len()
            );
            inner.flush(self.config.open_per_flush);
            inner.map.clear();
            inner.ceiling_flushes += 1;
        }

        values.push(TIME_FIELD, clock::format_timestamp(&self.clock.now()));
        inner.map.insert(identity, key, values);
        true
    }

    /// Add `_LEVEL_` and `_THREAD_` to the key, then [`add`](TallyLog::add).
    pub fn log_basic(&self, level: Level, mut key: Fields, values: Fields) -> bool {
        key.push(LEVEL_FIELD, level);
        key.push(THREAD_FIELD, clock::thread_id());
        self.add(key, values)
    }

    /// Add a `_MSG_` to the key, then [`log_basic`](TallyLog::log_basic).
    pub fn log_message(&self, level: Level, message: &str, mut key: Fields, values: Fields) -> bool {
        key.push(MESSAGE_FIELD, message);
        self.log_basic(level, key, values)
    }

    /// Log an OS error code with its description.
    ///
    /// A `code` of `0` means success: nothing is logged and `false` is
    /// returned.
    pub fn log_os_error(
        &self,
        level: Level,
        code: i32,
        message: &str,
        mut key: Fields,
        values: Fields,
    ) -> bool {
        if code == 0 {
            return false;
        }
        key.push(OS_ERROR_FIELD, os::hex_code(code));
        key.push(
            OS_ERROR_TEXT_FIELD,
            os::error_text_or_code(self.error_text, code),
        );
        self.log_message(level, message, key, values)
    }

    /// [`log_os_error`](TallyLog::log_os_error) with the calling thread's
    /// last OS error.
    pub fn log_last_error(&self, level: Level, message: &str, key: Fields, values: Fields) -> bool {
        let code = os::last_os_error();
        self.log_os_error(level, code, message, key, values)
    }

    /// Log a formatted message. See also [`tally!`](macro@crate::tally).
    pub fn log_format(&self, level: Level, args: fmt::Arguments<'_>) -> bool {
        self.log_message(level, &args.to_string(), Fields::new(), Fields::new())
    }

    /// Log a formatted message with its call site, an error code and the
    /// last OS error. See also [`tally_source!`](macro@crate::tally_source).
    ///
    /// The source file path is only recorded in debug builds.
    pub fn log_source(
        &self,
        level: Level,
        site: CallSite,
        error_code: i32,
        args: fmt::Arguments<'_>,
    ) -> bool {
        let last_error = os::last_os_error();

        let mut key = Fields::new();
        key.push(FUNCTION_FIELD, site.function);
        key.push(LINE_FIELD, site.line);
        if cfg!(debug_assertions) {
            key.push(FILE_FIELD, site.file);
        }
        key.push(ERROR_CODE_FIELD, error_code);
        key.push(OS_ERROR_FIELD, os::hex_code(last_error));

        self.log_message(level, &args.to_string(), key, Fields::new())
    }

    /// Write every in-memory entry to disk, oldest first.
    ///
    /// The map is left intact: counts keep accumulating and the next flush
    /// writes the updated totals again. The lock is held throughout, so
    /// concurrent [`add`](TallyLog::add) calls wait for the flush to finish.
    pub fn flush(&self) -> FlushSummary {
        let mut inner = self.inner.lock();
        inner.dirty = false;
        inner.flush(self.config.open_per_flush)
    }

    /// Number of distinct events in memory.
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }

    /// Occurrences of `key` since it was last flushed out of memory.
    pub fn count(&self, key: &Fields) -> Option<u64> {
        let identity = Identity::of(key);
        self.inner.lock().map.get(&identity).map(|e| e.count())
    }

    /// The extras stored with the first occurrence of `key`.
    pub fn extras(&self, key: &Fields) -> Option<Fields> {
        let identity = Identity::of(key);
        self.inner
            .lock()
            .map
            .get(&identity)
            .map(|e| e.extras().clone())
    }

    /// How many times the item ceiling forced a flush.
    pub fn ceiling_flushes(&self) -> u64 {
        self.inner.lock().ceiling_flushes
    }

    /// How many times the output file was rotated for size.
    pub fn rotations(&self) -> u64 {
        self.inner.lock().sink.rotations()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory the log files are written to.
    pub fn dir(&self) -> PathBuf {
        self.inner.lock().sink.dir().to_path_buf()
    }

    /// The file currently open for writing, if any.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.inner.lock().sink.current_path().map(Path::to_path_buf)
    }
}

impl Inner {
    fn flush(&mut self, open_per_flush: bool) -> FlushSummary {
        let Inner { map, sink, .. } = self;
        let mut summary = FlushSummary::default();
        if map.is_empty() {
            return summary;
        }

        if open_per_flush || !sink.is_open() {
            if let Err(e) = sink.open() {
                log::warn!("eventtally: {e}");
            }
        }

        for entry in map.flush_order() {
            match sink.write_record(&render::render_record(entry)) {
                Ok(()) => summary.written += 1,
                Err(e) => {
                    if summary.dropped == 0 {
                        log::warn!("eventtally: dropping records: {e}");
                    }
                    summary.dropped += 1;
                }
            }
        }

        if open_per_flush {
            sink.close();
        }

        if summary.dropped > 0 {
            log::warn!(
                "eventtally: flush dropped {} of {} records",
                summary.dropped,
                summary.dropped + summary.written
            );
        }
        log::debug!("eventtally: flushed {} records", summary.written);
        summary
    }
}

impl Drop for TallyLog {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if self.config.flush_on_drop && inner.dirty {
            inner.flush(self.config.open_per_flush);
        }
        inner.sink.close();
    }
}

impl fmt::Debug for TallyLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TallyLog")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}

/// Log a formatted message: `tally!(log, Level::Trace, "cpu {}", n)`.
#[macro_export]
macro_rules! tally {
    ($log:expr, $level:expr, $($arg:tt)+) => {
        $log.log_format($level, format_args!($($arg)+))
    };
}

/// Log a formatted message with the caller's location and an error code:
/// `tally_source!(log, Level::Trace, code, "pid {}", pid)`.
#[macro_export]
macro_rules! tally_source {
    ($log:expr, $level:expr, $code:expr, $($arg:tt)+) => {
        $log.log_source($level, $crate::call_site!(), $code, format_args!($($arg)+))
    };
}
