//! Port system for workflow nodes.
//!
//! Ports are the connection points on a node. Each port carries a free-form
//! type tag; two ports may be wired together when their tags are equal or
//! either side is the wildcard [`ANY_TYPE`].
//!
//! A port's `connected_to` list is a derived index of the graph's edges. Only
//! the graph recomputes it, so it is read-only from outside this crate.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The wildcard port type. Compatible with every other type.
pub const ANY_TYPE: &str = "any";

/// The data type tag carried by a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortType(String);

impl PortType {
    /// Creates a port type from a tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The wildcard type.
    #[must_use]
    pub fn any() -> Self {
        Self(ANY_TYPE.to_string())
    }

    /// Returns the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the wildcard type.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.0 == ANY_TYPE
    }

    /// Checks whether data of this type may flow into a port of `other`.
    ///
    /// The relation is symmetric: equal tags match, and the wildcard matches
    /// anything on either side.
    #[must_use]
    pub fn is_compatible_with(&self, other: &PortType) -> bool {
        self.is_any() || other.is_any() || self == other
    }
}

impl Default for PortType {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Which side of a node a port lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Receives data.
    Input,
    /// Produces data.
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// The far end of a connection as seen from a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortEndpoint {
    /// Node on the far end.
    pub item_id: NodeId,
    /// Port on the far end.
    pub port_id: String,
}

impl PortEndpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(item_id: NodeId, port_id: impl Into<String>) -> Self {
        Self {
            item_id,
            port_id: port_id.into(),
        }
    }
}

impl fmt::Display for PortEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item_id, self.port_id)
    }
}

/// A port as captured by a connect gesture.
///
/// The gesture records the port's type and side at the moment the user
/// pressed or released it, so validation can run before the graph is
/// consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortReference {
    /// Node owning the port.
    pub item_id: NodeId,
    /// Port id on that node.
    pub port_id: String,
    /// Side of the node.
    pub direction: PortDirection,
    /// Type tag captured with the gesture.
    pub port_type: PortType,
}

impl PortReference {
    /// References an output port.
    #[must_use]
    pub fn output(item_id: NodeId, port_id: impl Into<String>, port_type: impl Into<PortType>) -> Self {
        Self {
            item_id,
            port_id: port_id.into(),
            direction: PortDirection::Output,
            port_type: port_type.into(),
        }
    }

    /// References an input port.
    #[must_use]
    pub fn input(item_id: NodeId, port_id: impl Into<String>, port_type: impl Into<PortType>) -> Self {
        Self {
            item_id,
            port_id: port_id.into(),
            direction: PortDirection::Input,
            port_type: port_type.into(),
        }
    }

    /// Returns the endpoint this reference points at.
    #[must_use]
    pub fn endpoint(&self) -> PortEndpoint {
        PortEndpoint::new(self.item_id.clone(), self.port_id.clone())
    }
}

/// A connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Port id, unique within its side of the node.
    pub id: String,
    /// Data type tag. Missing tags deserialize as the wildcard.
    #[serde(rename = "type", default)]
    pub port_type: PortType,
    #[serde(default)]
    connected_to: Vec<PortEndpoint>,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Port {
    /// Creates an unconnected port.
    #[must_use]
    pub fn new(id: impl Into<String>, port_type: impl Into<PortType>) -> Self {
        Self {
            id: id.into(),
            port_type: port_type.into(),
            connected_to: Vec::new(),
            label: None,
            description: None,
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Endpoints this port is currently wired to.
    #[must_use]
    pub fn connected_to(&self) -> &[PortEndpoint] {
        &self.connected_to
    }

    /// Returns true if any edge touches this port.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.connected_to.is_empty()
    }

    pub(crate) fn set_connected_to(&mut self, endpoints: Vec<PortEndpoint>) {
        self.connected_to = endpoints;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_types_are_compatible() {
        assert!(PortType::new("text").is_compatible_with(&PortType::new("text")));
    }

    #[test]
    fn different_types_are_incompatible() {
        assert!(!PortType::new("text").is_compatible_with(&PortType::new("image")));
    }

    #[test]
    fn any_matches_on_either_side() {
        let any = PortType::any();
        let image = PortType::new("image");
        assert!(any.is_compatible_with(&image));
        assert!(image.is_compatible_with(&any));
    }

    #[test]
    fn missing_port_type_defaults_to_any() {
        let port: Port = serde_json::from_str(r#"{"id":"input-1"}"#).expect("deserialize");
        assert!(port.port_type.is_any());
        assert!(!port.is_connected());
    }

    #[test]
    fn port_wire_shape_uses_camel_case() {
        let mut port = Port::new("output-1", "text").with_label("Text");
        port.set_connected_to(vec![PortEndpoint::new(NodeId::new("b"), "input-1")]);
        let json = serde_json::to_value(&port).expect("serialize");
        assert_eq!(json["type"], "text");
        assert_eq!(json["connectedTo"][0]["itemId"], "b");
        assert_eq!(json["connectedTo"][0]["portId"], "input-1");
        assert!(json.get("description").is_none());
    }
}
