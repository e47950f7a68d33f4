//! Firewall decisions, deduplicated.
//!
//! Logs a burst of repetitive connection events and prints the flushed file.
//! Only a handful of distinct records are written, each with its count.

use eventtally::{fields, tally, tally_source, Fields, Level, TallyLog};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log = TallyLog::builder()
        .base_dir(dir.path())
        .subfolders("firewall", "Logs")
        .encrypt(false)
        .max_file_size(64 << 10)
        .build();

    let rule = fields! { "context" => "firewall", "rule" => "learn", "timeout" => 4.5 };
    for i in 0..10_000u32 {
        let port = [22, 80, 443][(i % 3) as usize];
        let key = fields! {
            "port" => port,
            "host" => "example.com",
            "open" => port != 22,
            "proto" => "tcp",
        };
        log.log_basic(Level::UserStatus, key, rule.clone());
    }

    log.log_message(Level::Error, "hi!", fields! { "test" => 1 }, Fields::new());
    tally!(log, Level::Trace, "the current PID is {}", std::process::id());
    tally_source!(log, Level::Trace, 0xbaadf00du32 as i32, "loop finished");

    log.flush();

    let path = log.current_path().ok_or("no log file was opened")?;
    println!("{} distinct events written to {}", log.len(), path.display());
    println!("[{}]", fs::read_to_string(&path)?);
    Ok(())
}
