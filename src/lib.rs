//! A deduplicating structured event log.
//!
//! Repeated events are merged in memory and counted. A flush writes each
//! distinct event once, with its count, to a size-rotated JSON file.
//! See [`TallyLog`].

mod clock;
mod config;
mod error;
mod fields;
mod level;
mod map;
pub mod os;
pub mod render;
mod sink;
mod tally;
mod value;

pub use clock::{format_timestamp, thread_id, Clock, LocalClock};
pub use config::{Config, TallyLogBuilder};
pub use error::{Error, Result};
pub use fields::{Field, Fields};
pub use level::{CallSite, Level};
pub use map::{Entry, Identity, TallyMap, TIME_FIELD};
pub use render::{COUNT_FIELD, EXTRA_FIELD};
pub use sink::{EXTENSION, SEPARATOR};
pub use tally::{
    FlushSummary, TallyLog, ERROR_CODE_FIELD, FILE_FIELD, FUNCTION_FIELD, LEVEL_FIELD,
    LINE_FIELD, MESSAGE_FIELD, OS_ERROR_FIELD, OS_ERROR_TEXT_FIELD, THREAD_FIELD,
};
pub use value::{Value, ValueKind};
