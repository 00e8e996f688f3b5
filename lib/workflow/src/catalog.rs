//! The module catalog.
//!
//! The catalog lists the modules a user can place. Placing a module copies
//! its descriptor onto a fresh [`Node`]; the node never looks back at the
//! catalog except through its `module_id`.

use crate::node::{ConfigFieldType, ConfigSchemaItem, ModuleConfig, Node, NodeId, Position};
use crate::port::Port;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// A placeable module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub config: ModuleConfig,
    #[serde(default)]
    pub config_schema: BTreeMap<String, ConfigSchemaItem>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl ModuleDescriptor {
    /// Config for a new node: the module's own values, with schema defaults
    /// filling any key the module leaves unset.
    #[must_use]
    pub fn initial_config(&self) -> ModuleConfig {
        let mut config = self.config.clone();
        for (key, item) in &self.config_schema {
            if let Some(default) = &item.default {
                config
                    .entry(key.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        config
    }
}

/// Errors from catalog lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No module with this id.
    UnknownModule { module_id: String },
    /// The catalog document could not be parsed.
    Malformed { message: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownModule { module_id } => write!(f, "unknown module: {module_id}"),
            Self::Malformed { message } => write!(f, "malformed module catalog: {message}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// The set of placeable modules, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleCatalog {
    #[must_use]
    pub fn new(modules: Vec<ModuleDescriptor>) -> Self {
        Self { modules }
    }

    /// Parses a JSON array of module descriptors.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the document is not a descriptor list.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        serde_json::from_slice(bytes)
            .map(Self::new)
            .map_err(|e| CatalogError::Malformed {
                message: e.to_string(),
            })
    }

    /// The modules shipped with aiflow.
    #[must_use]
    pub fn builtin() -> Self {
        let text = ModuleDescriptor {
            id: "1".to_string(),
            name: "Text Generator".to_string(),
            module_type: "text_generation".to_string(),
            description: Some("Generates text based on prompts".to_string()),
            config: ModuleConfig::new(),
            config_schema: BTreeMap::from([
                (
                    "model".to_string(),
                    ConfigSchemaItem::new(ConfigFieldType::Select, "Model")
                        .with_options(["gpt-2", "default-model"])
                        .with_default(json!("gpt-2")),
                ),
                (
                    "max_tokens".to_string(),
                    ConfigSchemaItem::new(ConfigFieldType::Number, "Max tokens")
                        .with_range(1.0, 2048.0, 1.0)
                        .with_default(json!(100)),
                ),
                (
                    "prompt".to_string(),
                    ConfigSchemaItem::new(ConfigFieldType::Textarea, "Prompt"),
                ),
            ]),
            inputs: vec![Port::new("input-1", "text").with_label("Prompt")],
            outputs: vec![Port::new("output-1", "text").with_label("Text")],
        };

        let image = ModuleDescriptor {
            id: "2".to_string(),
            name: "Image Processor".to_string(),
            module_type: "image_classification".to_string(),
            description: Some("Processes images with AI filters".to_string()),
            config: ModuleConfig::new(),
            config_schema: BTreeMap::from([(
                "threshold".to_string(),
                ConfigSchemaItem::new(ConfigFieldType::Number, "Confidence threshold")
                    .with_range(0.0, 1.0, 0.05)
                    .with_default(json!(0.5)),
            )]),
            inputs: vec![Port::new("input-1", "image").with_label("Image")],
            outputs: vec![Port::new("output-1", "any").with_label("Labels")],
        };

        Self::new(vec![text, image])
    }

    #[must_use]
    pub fn get(&self, module_id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Places a module at `position` under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` if the id is not in the catalog.
    pub fn instantiate(&self, module_id: &str, position: Position) -> Result<Node, CatalogError> {
        self.instantiate_with_id(NodeId::generate(), module_id, position)
    }

    /// Places a module under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` if the id is not in the catalog.
    pub fn instantiate_with_id(
        &self,
        node_id: NodeId,
        module_id: &str,
        position: Position,
    ) -> Result<Node, CatalogError> {
        let module = self.get(module_id).ok_or_else(|| CatalogError::UnknownModule {
            module_id: module_id.to_string(),
        })?;

        let mut node = Node::new(
            node_id,
            module.id.clone(),
            module.module_type.clone(),
            module.name.clone(),
        )
        .with_config(module.initial_config())
        .with_position(position);
        node.config_schema = module.config_schema.clone();
        node.inputs = module.inputs.iter().map(fresh_port).collect();
        node.outputs = module.outputs.iter().map(fresh_port).collect();
        Ok(node)
    }
}

/// Copies a catalog port without any connections.
fn fresh_port(port: &Port) -> Port {
    let mut copy = Port::new(port.id.clone(), port.port_type.clone());
    copy.label = port.label.clone();
    copy.description = port.description.clone();
    copy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiate_copies_descriptor_and_fills_defaults() {
        let catalog = ModuleCatalog::builtin();
        let node = catalog
            .instantiate("1", Position::new(5.0, 6.0))
            .expect("instantiate");

        assert!(node.id.as_str().starts_with("item_"));
        assert_eq!(node.module_id, "1");
        assert_eq!(node.module_type, "text_generation");
        assert_eq!(node.name, "Text Generator");
        assert_eq!(node.config.get("model"), Some(&json!("gpt-2")));
        assert_eq!(node.config.get("max_tokens"), Some(&json!(100)));
        assert!(!node.config.contains_key("prompt"));
        assert_eq!(node.position, Position::new(5.0, 6.0));
        assert!(node.inputs.iter().all(|p| !p.is_connected()));
    }

    #[test]
    fn module_config_wins_over_schema_default() {
        let mut module = ModuleCatalog::builtin().get("1").cloned().expect("module");
        module.config.insert("model".to_string(), json!("default-model"));

        assert_eq!(module.initial_config().get("model"), Some(&json!("default-model")));
    }

    #[test]
    fn unknown_module_is_an_error() {
        let err = ModuleCatalog::builtin()
            .instantiate("404", Position::default())
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownModule {
                module_id: "404".to_string()
            }
        );
    }

    #[test]
    fn catalog_parses_from_json() {
        let catalog = ModuleCatalog::from_json(
            br#"[{"id":"7","name":"Summarizer","type":"summarize","inputs":[{"id":"input-1"}],"outputs":[{"id":"output-1","type":"text"}]}]"#,
        )
        .expect("parse");

        let module = catalog.get("7").expect("module");
        assert_eq!(module.module_type, "summarize");
        assert!(module.inputs[0].port_type.is_any());
        assert!(ModuleCatalog::from_json(b"{}").is_err());
    }
}
