//! Task domain - the caller's request plus its execution constraints.

pub mod entities;

pub use entities::{ExecutionMode, Task, TaskConstraints};
