//! Platform collaborators: OS error text, the last OS error, and the default
//! base directory for log files.

use std::io;
use std::path::PathBuf;

/// Translates an OS error code to human-readable text.
///
/// Returns `None` when no text is available; callers then fall back to the
/// bare code (see [`error_text_or_code`]).
pub type ErrorTextFn = fn(i32) -> Option<String>;

/// Default [`ErrorTextFn`], built on the standard library's OS error
/// descriptions.
pub fn os_error_text(code: i32) -> Option<String> {
    let text = io::Error::from_raw_os_error(code).to_string();
    // std appends " (os error N)"; the code is logged separately
    let text = match text.rfind(" (os error ") {
        Some(pos) => text[..pos].to_string(),
        None => text,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Look up error text, falling back to `"<code>?"`.
pub fn error_text_or_code(lookup: ErrorTextFn, code: i32) -> String {
    lookup(code).unwrap_or_else(|| format!("{code}?"))
}

/// The calling thread's last OS error code, `0` if none.
pub fn last_os_error() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Render an error code as JSON-safe hex text, e.g. `0x2`.
pub fn hex_code(code: i32) -> String {
    format!("{:#x}", code as u32)
}

/// The directory logs go under when none is configured: the user's local
/// data directory, or the temp directory if there is none.
pub fn default_base_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(std::env::temp_dir)
}
