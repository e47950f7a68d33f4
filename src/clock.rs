use chrono::{Datelike, NaiveDateTime, Timelike};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of wall-clock time for `_TIME_` stamps and file names.
///
/// The default is [`LocalClock`]. Tests inject their own to control
/// timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local time from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Format a `_TIME_` stamp: `YYYY-MM-DD HH:MM:SS.mmm`, zero padded so the
/// text sorts chronologically.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Format a log file stem: `YYYY-M-D_H_M_S.mmm`.
pub fn format_file_stem(t: &NaiveDateTime) -> String {
    format!(
        "{}-{}-{}_{}_{}_{}.{:03}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second(),
        t.nanosecond() / 1_000_000 % 1000
    )
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// A small process-unique number for the calling thread, stable for the
/// thread's lifetime.
pub fn thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}
