//! Errors reported by the command line runner.

use aiflow_workflow::{CatalogError, EditorError, ExecutionError, StoreError};
use std::fmt;

#[derive(Debug)]
pub enum RunnerError {
    /// Configuration could not be loaded or is incomplete.
    Config { details: String },
    /// A workflow could not be created, read or written.
    Store(StoreError),
    /// An editing action was rejected.
    Edit(EditorError),
    /// The workflow run failed.
    Run(ExecutionError),
    /// The output could not be rendered.
    Output { details: String },
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "configuration error: {}", details),
            Self::Store(e) => write!(f, "{}", e),
            Self::Edit(e) => write!(f, "{}", e),
            Self::Run(e) => write!(f, "run failed: {}", e),
            Self::Output { details } => write!(f, "failed to render output: {}", details),
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<config::ConfigError> for RunnerError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config {
            details: e.to_string(),
        }
    }
}

impl From<CatalogError> for RunnerError {
    fn from(e: CatalogError) -> Self {
        Self::Config {
            details: e.to_string(),
        }
    }
}

impl From<StoreError> for RunnerError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<EditorError> for RunnerError {
    fn from(e: EditorError) -> Self {
        match e {
            EditorError::Store(e) => Self::Store(e),
            EditorError::Execution(e) => Self::Run(e),
            other => Self::Edit(other),
        }
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Output {
            details: e.to_string(),
        }
    }
}
