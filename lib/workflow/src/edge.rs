//! Edges connecting node ports.
//!
//! A [`Connection`] always runs from an output port to an input port and is
//! identified by its full 4-tuple. [`WireConnection`] is the persisted form,
//! where port ids may be omitted by older documents.

use crate::node::NodeId;
use crate::port::PortEndpoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port id assumed when a stored edge omits its source port.
pub const DEFAULT_SOURCE_PORT: &str = "output-1";

/// Port id assumed when a stored edge omits its target port.
pub const DEFAULT_TARGET_PORT: &str = "input-1";

/// A directed edge from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source_item_id: NodeId,
    pub source_port_id: String,
    pub target_item_id: NodeId,
    pub target_port_id: String,
}

impl Connection {
    #[must_use]
    pub fn new(
        source_item_id: impl Into<NodeId>,
        source_port_id: impl Into<String>,
        target_item_id: impl Into<NodeId>,
        target_port_id: impl Into<String>,
    ) -> Self {
        Self {
            source_item_id: source_item_id.into(),
            source_port_id: source_port_id.into(),
            target_item_id: target_item_id.into(),
            target_port_id: target_port_id.into(),
        }
    }

    #[must_use]
    pub fn source(&self) -> PortEndpoint {
        PortEndpoint::new(self.source_item_id.clone(), self.source_port_id.clone())
    }

    #[must_use]
    pub fn target(&self) -> PortEndpoint {
        PortEndpoint::new(self.target_item_id.clone(), self.target_port_id.clone())
    }

    /// Returns true if either end is on the given node.
    #[must_use]
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source_item_id == node_id || &self.target_item_id == node_id
    }

    /// Returns true if this edge feeds the given input port.
    #[must_use]
    pub fn feeds(&self, node_id: &NodeId, port_id: &str) -> bool {
        &self.target_item_id == node_id && self.target_port_id == port_id
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.source_item_id, self.source_port_id, self.target_item_id, self.target_port_id
        )
    }
}

/// The persisted shape of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConnection {
    pub source: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_id: Option<String>,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port_id: Option<String>,
}

impl From<WireConnection> for Connection {
    fn from(wire: WireConnection) -> Self {
        Self {
            source_item_id: wire.source,
            source_port_id: wire
                .source_port_id
                .unwrap_or_else(|| DEFAULT_SOURCE_PORT.to_string()),
            target_item_id: wire.target,
            target_port_id: wire
                .target_port_id
                .unwrap_or_else(|| DEFAULT_TARGET_PORT.to_string()),
        }
    }
}

impl From<&Connection> for WireConnection {
    fn from(edge: &Connection) -> Self {
        Self {
            source: edge.source_item_id.clone(),
            source_port_id: Some(edge.source_port_id.clone()),
            target: edge.target_item_id.clone(),
            target_port_id: Some(edge.target_port_id.clone()),
        }
    }
}
