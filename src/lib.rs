//! # line-processor
//!
//! A four-stage threaded line processor that emits fixed-width 80-byte
//! records.
//!
//! ## Overview
//!
//! Each stage runs on its own thread and hands lines to the next one through
//! a bounded, blocking queue:
//! - **Reader**: reads lines until a `STOP` line or end of input
//! - **Separator**: turns each line terminator into a space
//! - **Collapser**: rewrites every `++` as `^`
//! - **Writer**: packs the bytes into 80-byte records and writes each one
//!   as soon as it fills; a partial last record is dropped
//!
//! A single end-of-stream marker travels down the queues behind the last
//! line, so every stage finishes its work before it exits.
//!
//! ## Example
//!
//! ```
//! use line_processor::execute_pipeline;
//!
//! let input = format!("{}++\nSTOP\n", "a".repeat(78));
//! let (output, report) = execute_pipeline(&input).unwrap();
//!
//! assert_eq!(output, format!("{}^ \n", "a".repeat(78)));
//! assert_eq!(report.records_written, 1);
//! ```

pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod record;
pub mod stage;

pub use error::{PipelineError, Result};
pub use executor::{execute_serial, execute_serial_text};
pub use pipeline::{PipelineReport, execute_pipeline, run_pipeline, run_pipeline_with_capacity};
pub use queue::{BoundedQueue, Item, QUEUE_CAPACITY};
pub use record::{Frame, RECORD_WIDTH, Record};
pub use stage::{
    FrameStage, InputEnd, LineReader, LineStage, MAX_LINE_LENGTH, PlusCollapseStage, ReadOutcome,
    STOP_LINE, SeparatorStage, TextUnit, collapse_pairs,
};
