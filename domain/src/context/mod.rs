//! Run context domain - the auditable record of one task run.
//!
//! [`AgenticContext`] is the aggregate root: task, plan, step results,
//! reflections, findings, errors and status. It is mutated only by the
//! application layer's context manager, which also emits a
//! [`ProgressEvent`] for every transition.

pub mod entities;
pub mod events;

pub use entities::{AgenticContext, ErrorEntry, NextStep, Progress, RunStatus, RunSummary};
pub use events::{ProgressEvent, ProgressEventKind};
