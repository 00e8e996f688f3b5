//! Module backends.
//!
//! The engine never runs module logic itself. Each node is handed to a
//! [`ModuleBackend`] together with its config and the outputs of the nodes
//! that feed it. Backends are async so that remote execution fits the same
//! seam as in-process mocks.

use crate::node::{ModuleConfig, Node, NodeId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Inputs for one node, keyed by the id of the producing node.
///
/// Keys are producers, not input ports. A node with two inputs fed by two
/// different producers can tell them apart only by producer id; which port
/// each value arrived on is not recorded. Edges into a node are visited in
/// edge order, so if one producer feeds several inputs of the same node the
/// later edge's entry is the one kept (both carry the same value).
pub type NodeInputs = BTreeMap<NodeId, JsonValue>;

/// Everything a backend needs to execute one node.
#[derive(Debug, Clone, Copy)]
pub struct ModuleCall<'a> {
    pub node_id: &'a NodeId,
    pub module_id: &'a str,
    pub module_type: &'a str,
    pub config: &'a ModuleConfig,
    pub inputs: &'a NodeInputs,
}

impl<'a> ModuleCall<'a> {
    /// Builds a call for `node` with the given inputs.
    #[must_use]
    pub fn for_node(node: &'a Node, inputs: &'a NodeInputs) -> Self {
        Self {
            node_id: &node.id,
            module_id: &node.module_id,
            module_type: &node.module_type,
            config: &node.config,
            inputs,
        }
    }
}

/// Executes modules on behalf of the engine.
#[async_trait]
pub trait ModuleBackend: Send + Sync {
    /// Runs one module and returns its output.
    async fn invoke(&self, call: ModuleCall<'_>) -> Result<JsonValue, ModuleError>;
}

/// Errors from module execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleError {
    /// The inputs or config were rejected.
    InvalidInput { message: String },
    /// The module ran and failed.
    ExecutionFailed { message: String },
    /// The backend does not know this module type.
    UnsupportedModule { module_type: String },
    /// The backend could not be reached or answered badly.
    Transport { message: String },
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::ExecutionFailed { message } => write!(f, "execution failed: {message}"),
            Self::UnsupportedModule { module_type } => {
                write!(f, "unsupported module type: {module_type}")
            }
            Self::Transport { message } => write!(f, "module backend unavailable: {message}"),
        }
    }
}

impl std::error::Error for ModuleError {}

/// Default delay of [`SimulatedBackend`].
pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(500);

/// Produces canned outputs after a fixed delay.
///
/// Useful for demos and for exercising the editor without a module server.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    delay: Duration,
}

impl SimulatedBackend {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY)
    }
}

#[async_trait]
impl ModuleBackend for SimulatedBackend {
    async fn invoke(&self, call: ModuleCall<'_>) -> Result<JsonValue, ModuleError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let output = match call.module_type {
            "image_classification" => json!({ "label": "cat", "confidence": 0.9 }),
            "text_generation" => json!({ "generated_text": "This is a sample text." }),
            _ => json!({ "result": "success" }),
        };
        Ok(output)
    }
}

/// Returns the node's config and inputs as its output.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoBackend;

#[async_trait]
impl ModuleBackend for EchoBackend {
    async fn invoke(&self, call: ModuleCall<'_>) -> Result<JsonValue, ModuleError> {
        Ok(json!({
            "node": call.node_id,
            "config": call.config,
            "inputs": call.inputs,
        }))
    }
}

#[derive(Serialize)]
struct RunRequest<'a> {
    #[serde(rename = "type")]
    module_type: &'a str,
    config: &'a ModuleConfig,
    inputs: &'a NodeInputs,
}

#[derive(Deserialize)]
struct RunResponse {
    result: JsonValue,
}

/// Runs modules on a remote module server.
///
/// Each call is `POST {base_url}/ai-modules/run/{module_id}` with the module
/// type, config and inputs; the response's `result` field is the output.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a backend with a default client.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a backend using the given client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn run_url(&self, module_id: &str) -> String {
        format!("{}/ai-modules/run/{module_id}", self.base_url)
    }
}

#[async_trait]
impl ModuleBackend for HttpBackend {
    #[instrument(skip(self, call), fields(node_id = %call.node_id, module_id = call.module_id))]
    async fn invoke(&self, call: ModuleCall<'_>) -> Result<JsonValue, ModuleError> {
        let body = RunRequest {
            module_type: call.module_type,
            config: call.config,
            inputs: call.inputs,
        };

        let response = self
            .client
            .post(self.run_url(call.module_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| ModuleError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(%status, "module server responded");
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModuleError::InvalidInput { message });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModuleError::ExecutionFailed {
                message: format!("{status}: {message}"),
            });
        }

        let parsed: RunResponse = response.json().await.map_err(|e| ModuleError::Transport {
            message: e.to_string(),
        })?;
        Ok(parsed.result)
    }
}
