//! Connection validation.
//!
//! [`can_connect`] decides whether a user gesture from one port to another
//! may become an edge. Checks short-circuit in a fixed order so the user is
//! always told about the most basic problem first:
//!
//! 1. both ends on the same node
//! 2. both ends on the same side
//! 3. incompatible port types
//! 4. an end that is not in the graph
//! 5. the identical edge already exists
//! 6. the target input is already fed
//!
//! A gesture may start at either side. When it starts at an input the roles
//! are swapped, so the resulting edge always runs output to input.

use crate::edge::Connection;
use crate::error::ConnectionError;
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use crate::port::{Port, PortDirection, PortReference};

/// Result of applying a valid or already-present connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new edge was added.
    Connected(Connection),
    /// The edge was already present; nothing changed.
    AlreadyConnected(Connection),
}

impl ConnectOutcome {
    /// The edge in question.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        match self {
            Self::Connected(edge) | Self::AlreadyConnected(edge) => edge,
        }
    }

    /// Returns true if the graph changed.
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Validates a connect gesture against the graph.
///
/// On success returns the normalized edge (source is the output side).
///
/// # Errors
///
/// Returns the first rule the gesture violates, in the order documented at
/// the top of this module.
pub fn can_connect(
    graph: &WorkflowGraph,
    from: &PortReference,
    to: &PortReference,
) -> Result<Connection, ConnectionError> {
    if from.item_id == to.item_id {
        return Err(ConnectionError::SameNode {
            node_id: from.item_id.clone(),
        });
    }

    if from.direction == to.direction {
        return Err(ConnectionError::DirectionMismatch {
            direction: from.direction,
            from: from.endpoint(),
            to: to.endpoint(),
        });
    }

    let (source, target) = match from.direction {
        PortDirection::Output => (from, to),
        PortDirection::Input => (to, from),
    };

    if !source.port_type.is_compatible_with(&target.port_type) {
        return Err(ConnectionError::TypeMismatch {
            source: source.endpoint(),
            source_type: source.port_type.clone(),
            target: target.endpoint(),
            target_type: target.port_type.clone(),
        });
    }

    resolve(graph, &source.item_id, &source.port_id, PortDirection::Output)?;
    resolve(graph, &target.item_id, &target.port_id, PortDirection::Input)?;

    let edge = Connection::new(
        source.item_id.clone(),
        source.port_id.clone(),
        target.item_id.clone(),
        target.port_id.clone(),
    );
    check_unique(graph, &edge)?;
    Ok(edge)
}

/// Validates an already-normalized edge, taking port types from the graph.
///
/// Used when edges arrive without a gesture, e.g. from a stored document.
pub(crate) fn admit(graph: &WorkflowGraph, edge: &Connection) -> Result<(), ConnectionError> {
    if edge.source_item_id == edge.target_item_id {
        return Err(ConnectionError::SameNode {
            node_id: edge.source_item_id.clone(),
        });
    }

    let source = resolve(
        graph,
        &edge.source_item_id,
        &edge.source_port_id,
        PortDirection::Output,
    )?;
    let target = resolve(
        graph,
        &edge.target_item_id,
        &edge.target_port_id,
        PortDirection::Input,
    )?;

    if !source.port_type.is_compatible_with(&target.port_type) {
        return Err(ConnectionError::TypeMismatch {
            source: edge.source(),
            source_type: source.port_type.clone(),
            target: edge.target(),
            target_type: target.port_type.clone(),
        });
    }

    check_unique(graph, edge)
}

fn resolve<'g>(
    graph: &'g WorkflowGraph,
    node_id: &NodeId,
    port_id: &str,
    direction: PortDirection,
) -> Result<&'g Port, ConnectionError> {
    let node = graph
        .node(node_id)
        .ok_or_else(|| ConnectionError::UnknownNode {
            node_id: node_id.clone(),
        })?;

    node.port(direction, port_id)
        .ok_or_else(|| ConnectionError::UnknownPort {
            node_id: node_id.clone(),
            port_id: port_id.to_string(),
            direction,
        })
}

fn check_unique(graph: &WorkflowGraph, edge: &Connection) -> Result<(), ConnectionError> {
    if graph.edges().contains(edge) {
        return Err(ConnectionError::DuplicateEdge { edge: edge.clone() });
    }

    if let Some(existing) = graph
        .edges()
        .iter()
        .find(|e| e.feeds(&edge.target_item_id, &edge.target_port_id))
    {
        return Err(ConnectionError::TargetAlreadyConnected {
            target: edge.target_item_id.clone(),
            port_id: edge.target_port_id.clone(),
            existing: existing.clone(),
        });
    }

    Ok(())
}
