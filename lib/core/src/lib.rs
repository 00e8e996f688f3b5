//! Core types shared by the aiflow crates.
//!
//! This crate holds the identifiers for persisted workflows and their runs,
//! plus the `Result` alias used where errors cross crate boundaries.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, WorkflowId, WorkflowRunId};
