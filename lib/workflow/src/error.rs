//! Error types for the workflow crate.
//!
//! Errors are layered:
//! - `ConnectionError`: a proposed edge violates a wiring rule
//! - `GraphError`: a structural edit referenced something that is not there
//! - `CycleError`: the graph cannot be ordered
//! - `ExecutionError`: a run could not start or a module failed
//!
//! Store, catalog and editor errors live next to their modules.

use crate::backend::ModuleError;
use crate::edge::Connection;
use crate::node::NodeId;
use crate::port::{PortDirection, PortEndpoint, PortType};
use std::fmt;

/// Errors from structural graph edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given id is not in the graph.
    NodeNotFound { node_id: NodeId },
    /// A node with this id already exists.
    DuplicateNode { node_id: NodeId },
    /// The exact edge is not in the graph.
    EdgeNotFound { edge: Connection },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
            Self::DuplicateNode { node_id } => write!(f, "node already exists: {node_id}"),
            Self::EdgeNotFound { edge } => write!(f, "connection not found: {edge}"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Reasons a proposed connection is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Both ends are on the same node.
    SameNode { node_id: NodeId },
    /// Both ends are on the same side (two outputs or two inputs).
    DirectionMismatch {
        direction: PortDirection,
        from: PortEndpoint,
        to: PortEndpoint,
    },
    /// The port types cannot carry the same data.
    TypeMismatch {
        source: PortEndpoint,
        source_type: PortType,
        target: PortEndpoint,
        target_type: PortType,
    },
    /// An endpoint names a node that is not in the graph.
    UnknownNode { node_id: NodeId },
    /// An endpoint names a port that is not on the stated side of its node.
    UnknownPort {
        node_id: NodeId,
        port_id: String,
        direction: PortDirection,
    },
    /// The identical edge already exists.
    DuplicateEdge { edge: Connection },
    /// The target input already has an incoming edge.
    TargetAlreadyConnected {
        target: NodeId,
        port_id: String,
        existing: Connection,
    },
}

impl ConnectionError {
    /// Returns true for outcomes that leave the graph as the user wanted it.
    ///
    /// Re-drawing an existing edge is reported to the user but is not a
    /// failure.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::DuplicateEdge { .. })
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameNode { node_id } => {
                write!(f, "cannot connect node {node_id} to itself")
            }
            Self::DirectionMismatch {
                direction,
                from,
                to,
            } => {
                write!(
                    f,
                    "cannot connect {direction} port {from} to another {direction} port {to}"
                )
            }
            Self::TypeMismatch {
                source,
                source_type,
                target,
                target_type,
            } => {
                write!(
                    f,
                    "incompatible port types: {source} ({source_type}) -> {target} ({target_type})"
                )
            }
            Self::UnknownNode { node_id } => write!(f, "node not found: {node_id}"),
            Self::UnknownPort {
                node_id,
                port_id,
                direction,
            } => {
                write!(f, "{direction} port '{port_id}' not found on node {node_id}")
            }
            Self::DuplicateEdge { edge } => write!(f, "already connected: {edge}"),
            Self::TargetAlreadyConnected {
                target,
                port_id,
                existing,
            } => {
                write!(
                    f,
                    "input '{port_id}' on node {target} already has a connection ({existing})"
                )
            }
        }
    }
}

impl std::error::Error for ConnectionError {}

/// The graph contains at least one cycle and cannot be ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// Nodes that never reached in-degree zero, in node-list order.
    pub unresolved: Vec<NodeId>,
    /// Strongly connected components that form cycles.
    pub cycles: Vec<Vec<NodeId>>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workflow contains a cycle")?;
        if let Some(first) = self.cycles.first() {
            let names: Vec<&str> = first.iter().map(NodeId::as_str).collect();
            write!(f, " through {}", names.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CycleError {}

/// Errors that stop a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Ordering failed; no module was invoked.
    CycleDetected(CycleError),
    /// A module failed; the run was aborted at this node.
    ModuleFailed { node_id: NodeId, cause: ModuleError },
    /// Another run is already in progress.
    RunInProgress,
}

impl ExecutionError {
    /// The node the run stopped at, if any.
    #[must_use]
    pub fn failed_node(&self) -> Option<&NodeId> {
        match self {
            Self::ModuleFailed { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleDetected(e) => write!(f, "{e}"),
            Self::ModuleFailed { node_id, cause } => {
                write!(f, "module {node_id} failed: {cause}")
            }
            Self::RunInProgress => write!(f, "a workflow run is already in progress"),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CycleDetected(e) => Some(e),
            Self::ModuleFailed { cause, .. } => Some(cause),
            Self::RunInProgress => None,
        }
    }
}

impl From<CycleError> for ExecutionError {
    fn from(e: CycleError) -> Self {
        Self::CycleDetected(e)
    }
}
