//! Workflow nodes.
//!
//! A node is one placed instance of a catalog module. Placement copies the
//! module's name, type, config, config schema and ports onto the node; after
//! that the node only keeps a weak `module_id` reference back to the catalog.

use crate::port::{Port, PortDirection};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Identifies a node within a workflow.
///
/// Freshly placed nodes get `item_<ULID>`. Ids read from a stored workflow
/// are kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, time-ordered id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("item_{}", Ulid::new()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The widget kind used to edit a config option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFieldType {
    Text,
    Textarea,
    Number,
    Boolean,
    Select,
}

/// Describes one editable config option of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSchemaItem {
    #[serde(rename = "type")]
    pub field_type: ConfigFieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConfigSchemaItem {
    /// Creates a schema item with no default or constraints.
    #[must_use]
    pub fn new(field_type: ConfigFieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            label: label.into(),
            default: None,
            options: None,
            min: None,
            max: None,
            step: None,
            placeholder: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }
}

/// Option values of a placed module.
pub type ModuleConfig = serde_json::Map<String, JsonValue>;

/// A placed module on the canvas.
///
/// Older canvases stored nodes without `moduleId` and with `top`/`left`
/// pixel offsets instead of `position`; both shapes are accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "NodeRecord")]
pub struct Node {
    pub id: NodeId,
    /// Catalog module this node was placed from.
    pub module_id: String,
    /// Module kind handed to the backend.
    #[serde(rename = "type", default)]
    pub module_type: String,
    pub name: String,
    #[serde(default)]
    pub config: ModuleConfig,
    #[serde(default)]
    pub config_schema: BTreeMap<String, ConfigSchemaItem>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
    #[serde(default)]
    pub position: Position,
    /// Output of the most recent run. Never affects ordering or validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<JsonValue>,
}

/// Stored node in either the current or the legacy canvas shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    id: NodeId,
    #[serde(default)]
    module_id: Option<String>,
    #[serde(rename = "type", default)]
    module_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    config: Option<ModuleConfig>,
    #[serde(default)]
    config_schema: Option<BTreeMap<String, ConfigSchemaItem>>,
    #[serde(default)]
    inputs: Option<Vec<Port>>,
    #[serde(default)]
    outputs: Option<Vec<Port>>,
    #[serde(default)]
    position: Option<Position>,
    #[serde(default)]
    top: Option<f64>,
    #[serde(default)]
    left: Option<f64>,
    #[serde(default)]
    execution_result: Option<JsonValue>,
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        let position = record.position.unwrap_or_else(|| {
            Position::new(record.left.unwrap_or_default(), record.top.unwrap_or_default())
        });
        Self {
            id: record.id,
            module_id: record
                .module_id
                .unwrap_or_else(|| record.module_type.clone()),
            module_type: record.module_type,
            name: record.name,
            config: record.config.unwrap_or_default(),
            config_schema: record.config_schema.unwrap_or_default(),
            inputs: record.inputs.unwrap_or_default(),
            outputs: record.outputs.unwrap_or_default(),
            position,
            execution_result: record.execution_result,
        }
    }
}

impl Node {
    /// Creates a bare node with no ports or config.
    #[must_use]
    pub fn new(
        id: impl Into<NodeId>,
        module_id: impl Into<String>,
        module_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            module_id: module_id.into(),
            module_type: module_type.into(),
            name: name.into(),
            config: ModuleConfig::new(),
            config_schema: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            position: Position::default(),
            execution_result: None,
        }
    }

    #[must_use]
    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    #[must_use]
    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ModuleConfig) -> Self {
        self.config = config;
        self
    }

    /// Looks up an input port by id.
    #[must_use]
    pub fn input_port(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    /// Looks up an output port by id.
    #[must_use]
    pub fn output_port(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    /// Looks up a port on the given side.
    #[must_use]
    pub fn port(&self, direction: PortDirection, port_id: &str) -> Option<&Port> {
        match direction {
            PortDirection::Input => self.input_port(port_id),
            PortDirection::Output => self.output_port(port_id),
        }
    }

    pub(crate) fn ports_mut(&mut self) -> impl Iterator<Item = (PortDirection, &mut Port)> {
        self.inputs
            .iter_mut()
            .map(|p| (PortDirection::Input, p))
            .chain(self.outputs.iter_mut().map(|p| (PortDirection::Output, p)))
    }
}
