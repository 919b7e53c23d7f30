// Pedantic lint configuration for the crate.
// - cast_possible_truncation: Durations in milliseconds fit in u64
// - missing_errors_doc: Error handling is self-evident from Result types
// - missing_panics_doc: Panics are limited to static regex compilation
// - module_name_repetitions: `worker::WorkerChannel` reads better at call sites
// - needless_pass_by_value: Responses are consumed by routing
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::needless_pass_by_value
)]

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod parser;
pub mod worker;

pub use dispatcher::{Dispatcher, FormatEvent, ProgressFn};
pub use error::{LingoError, Result};
pub use models::{Segment, SegmentKind, SegmentMetadata};
pub use parser::parse;
