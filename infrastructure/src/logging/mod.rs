//! Logging infrastructure: progress-event persistence.
//!
//! Provides [`JsonlProgressLogger`], a JSONL file writer that implements
//! the [`ProgressListener`](vigil_application::ProgressListener) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlProgressLogger;
