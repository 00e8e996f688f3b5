//! Workflow persistence.
//!
//! A stored workflow is a [`WorkflowDocument`]: the node list plus edges in
//! their wire shape. Loading a document rebuilds a [`WorkflowGraph`], which
//! drops edges that no longer fit the nodes.
//!
//! The [`WorkflowStore`] trait is the seam between the editor and wherever
//! documents live. Three stores ship with the crate:
//!
//! - [`InMemoryWorkflowStore`] for tests and throwaway sessions
//! - [`FileWorkflowStore`], one JSON file per workflow in a directory
//! - [`HttpWorkflowStore`], a REST workflow service

mod file;
mod http;
mod memory;

pub use file::FileWorkflowStore;
pub use http::HttpWorkflowStore;
pub use memory::InMemoryWorkflowStore;

use crate::edge::{Connection, WireConnection};
use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use crate::node::Node;
use aiflow_core::WorkflowId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The persisted form of a workflow.
///
/// Older documents name the lists `canvasItems` and `connections`; both
/// spellings are accepted on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default, alias = "canvasItems")]
    pub nodes: Vec<Node>,
    #[serde(default, alias = "connections")]
    pub edges: Vec<WireConnection>,
}

impl WorkflowDocument {
    /// Rebuilds the graph, dropping edges that do not fit the nodes.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if two nodes share an id.
    pub fn into_graph(self) -> Result<WorkflowGraph, StoreError> {
        let edges = self.edges.into_iter().map(Connection::from).collect();
        WorkflowGraph::assemble(self.nodes, edges).map_err(|e| match e {
            GraphError::DuplicateNode { node_id } => StoreError::Malformed {
                message: format!("duplicate node id {node_id}"),
            },
            other => StoreError::Malformed {
                message: other.to_string(),
            },
        })
    }
}

impl From<&WorkflowGraph> for WorkflowDocument {
    fn from(graph: &WorkflowGraph) -> Self {
        Self {
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().iter().map(WireConnection::from).collect(),
        }
    }
}

/// One entry of a store listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
}

/// Errors from workflow stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No workflow with this id.
    NotFound { id: WorkflowId },
    /// Reading or writing local storage failed.
    Io { message: String },
    /// The stored document could not be understood.
    Malformed { message: String },
    /// The remote store could not be reached or answered badly.
    Transport { message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "workflow not found: {id}"),
            Self::Io { message } => write!(f, "workflow storage error: {message}"),
            Self::Malformed { message } => write!(f, "malformed workflow document: {message}"),
            Self::Transport { message } => write!(f, "workflow service unavailable: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed {
            message: e.to_string(),
        }
    }
}

/// Loads and saves workflows by id.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Creates an empty workflow and returns its id.
    async fn create(&self, name: &str) -> Result<WorkflowId, StoreError>;

    /// Loads a workflow.
    async fn load(&self, id: WorkflowId) -> Result<WorkflowGraph, StoreError>;

    /// Replaces the stored graph of an existing workflow.
    async fn save(&self, id: WorkflowId, graph: &WorkflowGraph) -> Result<(), StoreError>;

    /// Lists stored workflows.
    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError>;
}
