//! Subcommand handlers.
//!
//! Every editing command loads the workflow into a [`WorkflowEditor`],
//! applies one action and saves it back, so the same wiring rules apply on
//! the command line as on the canvas.

use crate::config::{BackendKind, RunnerConfig, StoreKind};
use crate::error::RunnerError;
use aiflow_core::WorkflowId;
use aiflow_workflow::{
    EchoBackend, EditorSettings, ExecutionError, FileWorkflowStore, HttpBackend,
    HttpWorkflowStore, InMemoryWorkflowStore, ModuleBackend, ModuleCatalog, NodeId, PortDirection,
    PortReference, PortType, Position, SimulatedBackend, WorkflowDocument, WorkflowEditor,
    WorkflowGraph, WorkflowStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Everything a command needs, built once from configuration.
pub struct Runner {
    store: Box<dyn WorkflowStore>,
    backend: Box<dyn ModuleBackend>,
    catalog: Arc<ModuleCatalog>,
    settings: EditorSettings,
}

impl Runner {
    /// Builds the store, backend and catalog named by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if an http store or backend has no base URL, or the
    /// catalog file cannot be read.
    pub fn from_config(config: &RunnerConfig) -> aiflow_core::Result<Self, RunnerError> {
        let store: Box<dyn WorkflowStore> = match config.store.kind {
            StoreKind::Memory => Box::new(InMemoryWorkflowStore::new()),
            StoreKind::File => Box::new(FileWorkflowStore::new(&config.store.dir)),
            StoreKind::Http => {
                let base_url = required(config.store.base_url.as_deref(), "store.base_url")?;
                Box::new(HttpWorkflowStore::new(base_url))
            }
        };

        let backend: Box<dyn ModuleBackend> = match config.backend.kind {
            BackendKind::Simulated => {
                Box::new(SimulatedBackend::new(config.backend.simulated_delay()))
            }
            BackendKind::Echo => Box::new(EchoBackend),
            BackendKind::Http => {
                let base_url = required(config.backend.base_url.as_deref(), "backend.base_url")?;
                Box::new(HttpBackend::new(base_url))
            }
        };

        let catalog = match &config.catalog_path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|e| RunnerError::Config {
                    details: format!("cannot read catalog {}: {}", path.display(), e),
                })?;
                ModuleCatalog::from_json(&bytes).map_err(RunnerError::from)?
            }
            None => ModuleCatalog::builtin(),
        };

        Ok(Self::new(
            store,
            backend,
            catalog,
            EditorSettings {
                history_limit: config.history_limit,
            },
        ))
    }

    #[must_use]
    pub fn new(
        store: Box<dyn WorkflowStore>,
        backend: Box<dyn ModuleBackend>,
        catalog: ModuleCatalog,
        settings: EditorSettings,
    ) -> Self {
        Self {
            store,
            backend,
            catalog: Arc::new(catalog),
            settings,
        }
    }

    /// Creates an empty workflow and prints its id.
    pub async fn create(&self, name: &str) -> aiflow_core::Result<WorkflowId, RunnerError> {
        let id = self.store.create(name).await.map_err(RunnerError::from)?;
        info!(workflow_id = %id, name, "workflow created");
        println!("{id}");
        Ok(id)
    }

    /// Prints every stored workflow.
    pub async fn list(&self) -> aiflow_core::Result<(), RunnerError> {
        for summary in self.store.list().await.map_err(RunnerError::from)? {
            println!("{}\t{}", summary.id, summary.name);
        }
        Ok(())
    }

    /// Prints a workflow document as JSON.
    pub async fn show(&self, id: WorkflowId) -> aiflow_core::Result<(), RunnerError> {
        let graph = self.load_graph(id).await?;
        let json =
            serde_json::to_string_pretty(&WorkflowDocument::from(&graph)).map_err(RunnerError::from)?;
        println!("{json}");
        Ok(())
    }

    /// Prints the order nodes would run in.
    pub async fn order(&self, id: WorkflowId) -> aiflow_core::Result<Vec<NodeId>, RunnerError> {
        let graph = self.load_graph(id).await?;
        let order = graph
            .execution_order()
            .map_err(|e| RunnerError::Run(ExecutionError::CycleDetected(e)))?;
        for (step, node_id) in order.iter().enumerate() {
            let name = graph.node(node_id).map(|n| n.name.as_str()).unwrap_or_default();
            println!("{}\t{}\t{}", step + 1, node_id, name);
        }
        Ok(order)
    }

    /// Prints the module catalog.
    pub fn catalog(&self) {
        for module in self.catalog.iter() {
            println!("{}\t{}\t{}", module.id, module.module_type, module.name);
        }
    }

    /// Places a module on the canvas and saves.
    pub async fn add(
        &self,
        id: WorkflowId,
        module_id: &str,
        position: Position,
    ) -> aiflow_core::Result<NodeId, RunnerError> {
        let mut editor = self.open(id).await?;
        let node_id = editor
            .drop_module(module_id, position)
            .map_err(RunnerError::from)?;
        editor.save(self.store.as_ref()).await.map_err(RunnerError::from)?;
        println!("{node_id}");
        Ok(node_id)
    }

    /// Connects an output port to an input port and saves.
    pub async fn connect(
        &self,
        id: WorkflowId,
        source: (&NodeId, &str),
        target: (&NodeId, &str),
    ) -> aiflow_core::Result<(), RunnerError> {
        let mut editor = self.open(id).await?;
        let from = port_reference(editor.graph(), source.0, source.1, PortDirection::Output);
        let to = port_reference(editor.graph(), target.0, target.1, PortDirection::Input);

        let outcome = editor.connect(&from, &to).map_err(RunnerError::from)?;
        if outcome.is_new() {
            editor.save(self.store.as_ref()).await.map_err(RunnerError::from)?;
            println!("connected {}", outcome.connection());
        } else {
            println!("already connected {}", outcome.connection());
        }
        Ok(())
    }

    /// Deletes a node with its edges and saves.
    pub async fn remove(&self, id: WorkflowId, node_id: &NodeId) -> aiflow_core::Result<(), RunnerError> {
        let mut editor = self.open(id).await?;
        editor.remove_node(node_id).map_err(RunnerError::from)?;
        editor.save(self.store.as_ref()).await.map_err(RunnerError::from)?;
        println!("removed {node_id}");
        Ok(())
    }

    /// Runs a workflow and prints each node's output.
    ///
    /// Results are written back onto the nodes and saved unless `save` is
    /// false.
    pub async fn run(&self, id: WorkflowId, save: bool) -> aiflow_core::Result<(), RunnerError> {
        let mut editor = self.open(id).await?;
        let outputs = editor
            .run(self.backend.as_ref())
            .await
            .map_err(RunnerError::from)?;

        if let Some(run) = editor.last_run() {
            info!(
                workflow_id = %id,
                run_id = %run.id,
                nodes = outputs.len(),
                "workflow run completed"
            );
        }

        let sorted: BTreeMap<_, _> = outputs.into_iter().collect();
        let json = serde_json::to_string_pretty(&sorted).map_err(RunnerError::from)?;
        println!("{json}");

        if save {
            editor.save(self.store.as_ref()).await.map_err(RunnerError::from)?;
        }
        Ok(())
    }

    async fn load_graph(&self, id: WorkflowId) -> aiflow_core::Result<WorkflowGraph, RunnerError> {
        Ok(self.store.load(id).await.map_err(RunnerError::from)?)
    }

    async fn open(&self, id: WorkflowId) -> aiflow_core::Result<WorkflowEditor, RunnerError> {
        let mut editor = WorkflowEditor::new(Arc::clone(&self.catalog), self.settings);
        editor
            .load(self.store.as_ref(), id)
            .await
            .map_err(RunnerError::from)?;
        Ok(editor)
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, RunnerError> {
    value.ok_or_else(|| RunnerError::Config {
        details: format!("{key} is required"),
    })
}

/// Describes one end of a connect gesture, typed from the graph when the
/// port exists.
fn port_reference(
    graph: &WorkflowGraph,
    node_id: &NodeId,
    port_id: &str,
    direction: PortDirection,
) -> PortReference {
    let port_type = graph
        .node(node_id)
        .and_then(|node| node.port(direction, port_id))
        .map_or_else(PortType::any, |port| port.port_type.clone());
    match direction {
        PortDirection::Output => PortReference::output(node_id.clone(), port_id, port_type),
        PortDirection::Input => PortReference::input(node_id.clone(), port_id, port_type),
    }
}
