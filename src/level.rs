use std::fmt;

/// Severity of a logged event.
///
/// Rendered into the `_LEVEL_` key field as its numeric code, so events at
/// different levels never merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    UserInfo,
    UserNotification,
    UserStatus,
    Warning,
    Error,
    Verbose,
    Trace,
    Exception,
}

impl Level {
    /// The numeric code written to disk.
    pub fn code(self) -> u8 {
        match self {
            Level::UserInfo => 0x1,
            Level::UserNotification => 0x2,
            Level::UserStatus => 0x3,
            Level::Warning => 0x7,
            Level::Error => 0x8,
            Level::Verbose => 0x9,
            Level::Trace => 0xa,
            Level::Exception => 0xe,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x1 => Some(Level::UserInfo),
            0x2 => Some(Level::UserNotification),
            0x3 => Some(Level::UserStatus),
            0x7 => Some(Level::Warning),
            0x8 => Some(Level::Error),
            0x9 => Some(Level::Verbose),
            0xa => Some(Level::Trace),
            0xe => Some(Level::Exception),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::UserInfo => "user-info",
            Level::UserNotification => "user-notification",
            Level::UserStatus => "user-status",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Verbose => "verbose",
            Level::Trace => "trace",
            Level::Exception => "exception",
        };
        f.write_str(name)
    }
}

/// Where a [`log_source`](crate::TallyLog::log_source) call came from.
///
/// Usually built with [`call_site!`](macro@crate::call_site). The file path is only
/// written in debug builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub function: &'static str,
    pub line: u32,
    pub file: &'static str,
}

impl CallSite {
    pub const fn new(function: &'static str, line: u32, file: &'static str) -> Self {
        CallSite {
            function,
            line,
            file,
        }
    }
}

/// Capture the current module path, line and file as a [`CallSite`].
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(module_path!(), line!(), file!())
    };
}
