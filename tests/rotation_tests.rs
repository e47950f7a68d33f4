mod common;

use common::{all_records, builder, json_files, read_records, ManualClock};
use eventtally::{fields, Fields, TallyLog};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// An event whose record is a little over 200 bytes.
fn padded(k: i32) -> Fields {
    fields! { "k" => k, "pad" => "x".repeat(150) }
}

fn add_padded(log: &TallyLog, clock: &ManualClock, n: i32) {
    for k in 0..n {
        clock.advance_ms(1);
        log.add(padded(k), Fields::new());
    }
}

fn file_count(dir: &Path) -> usize {
    json_files(dir).len()
}

#[test]
fn test_exceeding_max_size_rotates_once() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new();
    let log = builder(dir.path())
        .clock(clock.clone())
        .max_file_size(300)
        .max_files(5)
        .build();
    let first = log.current_path().unwrap();

    // two records fit under the limit, the third finds the file oversized
    add_padded(&log, &clock, 3);
    let summary = log.flush();

    assert_eq!(summary.written, 3);
    assert_eq!(log.rotations(), 1);
    assert_eq!(file_count(dir.path()), 2);
    assert_ne!(log.current_path().unwrap(), first);
    assert_eq!(read_records(&first).len(), 2);
    assert_eq!(read_records(&log.current_path().unwrap()).len(), 1);
}

#[test]
fn test_rotation_loses_no_records() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new();
    let log = builder(dir.path())
        .clock(clock.clone())
        .max_file_size(300)
        .max_files(0)
        .build();

    add_padded(&log, &clock, 10);
    log.flush();

    let mut keys: Vec<i64> = all_records(dir.path())
        .iter()
        .map(|r| r["k"].as_i64().unwrap())
        .collect();
    keys.sort();
    assert_eq!(keys, (0..10).collect::<Vec<_>>());
    assert_eq!(log.rotations(), 4);
}

#[test]
fn test_retention_keeps_max_files() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new();
    let log = builder(dir.path())
        .clock(clock.clone())
        .max_file_size(10)
        .max_files(3)
        .build();

    // every record after the first lands in a fresh file
    add_padded(&log, &clock, 8);
    log.flush();

    assert_eq!(log.rotations(), 7);
    assert_eq!(file_count(dir.path()), 3);
    assert!(log.current_path().unwrap().exists());
}

#[test]
fn test_retention_of_one_keeps_only_the_open_file() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new();
    let log = builder(dir.path())
        .clock(clock.clone())
        .max_file_size(10)
        .max_files(1)
        .build();

    add_padded(&log, &clock, 4);
    log.flush();

    let files = json_files(dir.path());
    assert_eq!(files, [log.current_path().unwrap()]);
    assert_eq!(read_records(&files[0]).len(), 1);
}

#[test]
fn test_retention_ignores_other_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("README.txt"), "not a log").unwrap();

    let clock = ManualClock::new();
    let log = builder(dir.path())
        .clock(clock.clone())
        .max_file_size(10)
        .max_files(2)
        .build();

    add_padded(&log, &clock, 5);
    log.flush();

    assert_eq!(file_count(dir.path()), 2);
    assert!(dir.path().join("README.txt").exists());
}

#[test]
fn test_zero_max_size_never_rotates() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new();
    let log = builder(dir.path())
        .clock(clock.clone())
        .max_file_size(0)
        .build();

    add_padded(&log, &clock, 20);
    log.flush();

    assert_eq!(log.rotations(), 0);
    assert_eq!(file_count(dir.path()), 1);
    assert_eq!(read_records(&log.current_path().unwrap()).len(), 20);
}

#[test]
fn test_files_land_in_nested_subfolders() {
    let dir = tempdir().unwrap();
    let log = TallyLog::builder()
        .base_dir(dir.path())
        .subfolders("GEN", "Logs")
        .encrypt(false)
        .write_through(false)
        .clock(ManualClock::new())
        .build();

    let expected = dir.path().join("GEN").join("Logs");
    assert_eq!(log.dir(), expected);

    let path = log.current_path().unwrap();
    assert_eq!(path.parent().unwrap(), expected);
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "2024-5-1_10_0_0.000.json"
    );
}

#[test]
fn test_write_through_still_writes() {
    let dir = tempdir().unwrap();
    let log = builder(dir.path()).write_through(true).build();

    log.add(fields! { "k" => 1 }, Fields::new());
    log.flush();

    assert_eq!(read_records(&log.current_path().unwrap()).len(), 1);
}
