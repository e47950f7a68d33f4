#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use eventtally::{Clock, TallyLog, TallyLogBuilder};
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<NaiveDateTime>>);

impl ManualClock {
    pub fn new() -> Self {
        ManualClock(Arc::new(Mutex::new(at(0))))
    }

    pub fn set(&self, t: NaiveDateTime) {
        *self.0.lock().unwrap() = t;
    }

    pub fn advance_ms(&self, ms: i64) {
        *self.0.lock().unwrap() += Duration::milliseconds(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

/// 2024-05-01 10:00:00 plus `ms` milliseconds.
pub fn at(ms: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
        + Duration::milliseconds(ms)
}

/// A builder writing straight into `dir`, without per-write syncs.
pub fn builder(dir: &Path) -> TallyLogBuilder {
    TallyLog::builder()
        .base_dir(dir)
        .no_subfolders()
        .encrypt(false)
        .write_through(false)
}

/// Parse a flushed file by wrapping its comma-separated objects in an array.
pub fn read_records(path: &Path) -> Vec<Json> {
    let text = fs::read_to_string(path).unwrap();
    serde_json::from_str(&format!("[{text}]")).unwrap()
}

/// Records in the file the log currently writes to.
pub fn current_records(log: &TallyLog) -> Vec<Json> {
    read_records(&log.current_path().unwrap())
}

/// All `.json` files in `dir`, sorted by name.
pub fn json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// Records from every `.json` file in `dir`.
pub fn all_records(dir: &Path) -> Vec<Json> {
    json_files(dir)
        .iter()
        .flat_map(|path| read_records(path))
        .collect()
}
