//! The workflow editor.
//!
//! [`WorkflowEditor`] owns the current graph snapshot and its undo history
//! and is the only place user actions turn into graph changes. Each action
//! works on a copy-on-write clone of the current snapshot and commits it
//! only on success, so a rejected action never leaves a partial change
//! behind. Every error is also pushed as a user notification.
//!
//! Runs are split in three steps so a caller can keep the editor responsive
//! while the backend works:
//!
//! 1. [`WorkflowEditor::begin_run`] freezes the current snapshot and blocks
//!    further edits
//! 2. [`PendingRun::execute`] drives the engine without touching the editor
//! 3. [`WorkflowEditor::finish_run`] writes outputs back and unblocks edits
//!
//! [`WorkflowEditor::run`] does all three in one call.

use crate::backend::ModuleBackend;
use crate::catalog::{CatalogError, ModuleCatalog};
use crate::connect::{self, ConnectOutcome};
use crate::edge::Connection;
use crate::engine::{Engine, ExecutionListener, RunOutputs};
use crate::error::{ConnectionError, ExecutionError, GraphError};
use crate::execution::{ExecutionEvent, WorkflowRun};
use crate::graph::WorkflowGraph;
use crate::history::{DEFAULT_HISTORY_LIMIT, History};
use crate::node::{ModuleConfig, NodeId, Position};
use crate::notification::Notifications;
use crate::port::PortReference;
use crate::store::{StoreError, WorkflowStore};
use aiflow_core::{WorkflowId, WorkflowRunId};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Name given to workflows created by a first save.
pub const DEFAULT_WORKFLOW_NAME: &str = "Unnamed Workflow";

/// Editor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    /// Snapshots kept for undo, including the current one.
    pub history_limit: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Errors surfaced by editor actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    Connection(ConnectionError),
    Graph(GraphError),
    Catalog(CatalogError),
    Execution(ExecutionError),
    Store(StoreError),
    /// Edits are blocked while a run is in progress.
    RunInProgress,
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "{e}"),
            Self::Graph(e) => write!(f, "{e}"),
            Self::Catalog(e) => write!(f, "{e}"),
            Self::Execution(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::RunInProgress => write!(f, "cannot edit the workflow while it is running"),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::Graph(e) => Some(e),
            Self::Catalog(e) => Some(e),
            Self::Execution(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::RunInProgress => None,
        }
    }
}

impl From<ConnectionError> for EditorError {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

impl From<GraphError> for EditorError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

impl From<CatalogError> for EditorError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

impl From<ExecutionError> for EditorError {
    fn from(e: ExecutionError) -> Self {
        Self::Execution(e)
    }
}

impl From<StoreError> for EditorError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// A run that has been started but not yet executed.
#[derive(Debug, Clone)]
pub struct PendingRun {
    run_id: WorkflowRunId,
    workflow_id: Option<WorkflowId>,
    snapshot: Arc<WorkflowGraph>,
}

/// Outcome of executing a [`PendingRun`].
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run: WorkflowRun,
    pub outcome: Result<RunOutputs, ExecutionError>,
}

/// Folds engine events into a run record as they arrive.
struct RunRecorder(Mutex<WorkflowRun>);

impl ExecutionListener for RunRecorder {
    fn on_event(&self, event: &ExecutionEvent) {
        if let Ok(mut run) = self.0.lock() {
            run.apply(event);
        }
    }
}

impl PendingRun {
    #[must_use]
    pub fn run_id(&self) -> WorkflowRunId {
        self.run_id
    }

    /// The graph being run.
    #[must_use]
    pub fn snapshot(&self) -> &WorkflowGraph {
        &self.snapshot
    }

    /// Runs the frozen snapshot.
    pub async fn execute(&self, engine: &Engine, backend: &dyn ModuleBackend) -> RunResult {
        let recorder = RunRecorder(Mutex::new(WorkflowRun::new(self.run_id, self.workflow_id)));
        let outcome = engine
            .run_observed(self.run_id, &self.snapshot, backend, &recorder)
            .await;

        let mut run = recorder
            .0
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(ExecutionError::RunInProgress) = &outcome {
            run.apply(&ExecutionEvent::RunFailed {
                run_id: self.run_id,
                error: ExecutionError::RunInProgress.to_string(),
                timestamp: chrono::Utc::now(),
            });
        }
        RunResult { run, outcome }
    }
}

/// Owns the current workflow, its history and run state.
#[derive(Debug)]
pub struct WorkflowEditor {
    catalog: Arc<ModuleCatalog>,
    engine: Arc<Engine>,
    workflow_id: Option<WorkflowId>,
    current: Arc<WorkflowGraph>,
    saved: Arc<WorkflowGraph>,
    history: History,
    running: bool,
    notifications: Notifications,
    last_run: Option<WorkflowRun>,
}

impl WorkflowEditor {
    /// Starts an empty, unsaved workflow.
    #[must_use]
    pub fn new(catalog: Arc<ModuleCatalog>, settings: EditorSettings) -> Self {
        Self::with_graph(catalog, WorkflowGraph::new(), settings)
    }

    /// Starts from an existing graph, treated as unsaved.
    #[must_use]
    pub fn with_graph(
        catalog: Arc<ModuleCatalog>,
        graph: WorkflowGraph,
        settings: EditorSettings,
    ) -> Self {
        let current = Arc::new(graph);
        Self {
            catalog,
            engine: Arc::new(Engine::new()),
            workflow_id: None,
            saved: Arc::clone(&current),
            history: History::new(Arc::clone(&current), settings.history_limit),
            current,
            running: false,
            notifications: Notifications::new(),
            last_run: None,
        }
    }

    /// The current graph.
    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph {
        &self.current
    }

    /// A shared handle to the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<WorkflowGraph> {
        Arc::clone(&self.current)
    }

    #[must_use]
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn workflow_id(&self) -> Option<WorkflowId> {
        self.workflow_id
    }

    /// Returns true if the current snapshot differs from the last saved or
    /// loaded one.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !Arc::ptr_eq(&self.current, &self.saved)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Dismisses one notification.
    pub fn dismiss(&mut self, notification_id: u64) -> bool {
        self.notifications.dismiss(notification_id)
    }

    /// Record of the most recent finished run.
    #[must_use]
    pub fn last_run(&self) -> Option<&WorkflowRun> {
        self.last_run.as_ref()
    }

    /// Places a catalog module on the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Catalog` for an unknown module.
    pub fn drop_module(&mut self, module_id: &str, position: Position) -> Result<NodeId, EditorError> {
        let catalog = Arc::clone(&self.catalog);
        self.apply(|graph| {
            let node = catalog.instantiate(module_id, position)?;
            let node_id = node.id.clone();
            graph.add_node(node)?;
            Ok(node_id)
        })
    }

    /// Moves a node.
    ///
    /// # Errors
    ///
    /// Returns `Graph` if the node is absent.
    pub fn move_node(&mut self, node_id: &NodeId, position: Position) -> Result<(), EditorError> {
        self.apply(|graph| Ok(graph.move_node(node_id, position)?))
    }

    /// Replaces a node's option values.
    ///
    /// # Errors
    ///
    /// Returns `Graph` if the node is absent.
    pub fn update_node_config(
        &mut self,
        node_id: &NodeId,
        config: ModuleConfig,
    ) -> Result<(), EditorError> {
        self.apply(|graph| Ok(graph.update_node_config(node_id, config)?))
    }

    /// Renames a node.
    ///
    /// # Errors
    ///
    /// Returns `Graph` if the node is absent.
    pub fn rename_node(&mut self, node_id: &NodeId, name: &str) -> Result<(), EditorError> {
        self.apply(|graph| Ok(graph.rename_node(node_id, name)?))
    }

    /// Connects two ports.
    ///
    /// Re-drawing an existing edge succeeds without a history entry and
    /// posts an informational notification.
    ///
    /// # Errors
    ///
    /// Returns `Connection` naming the violated rule.
    pub fn connect(
        &mut self,
        from: &PortReference,
        to: &PortReference,
    ) -> Result<ConnectOutcome, EditorError> {
        self.ensure_idle()?;
        match connect::can_connect(&self.current, from, to) {
            Err(ConnectionError::DuplicateEdge { edge }) => {
                self.notifications.info(format!("Already connected: {edge}"));
                Ok(ConnectOutcome::AlreadyConnected(edge))
            }
            Err(e) => Err(self.report(e.into())),
            Ok(_) => self.apply(|graph| Ok(graph.connect(from, to)?)),
        }
    }

    /// Deletes one edge.
    ///
    /// # Errors
    ///
    /// Returns `Graph` if the edge is absent.
    pub fn remove_edge(&mut self, edge: &Connection) -> Result<(), EditorError> {
        self.apply(|graph| Ok(graph.remove_edge(edge)?))
    }

    /// Deletes a node and every edge touching it.
    ///
    /// # Errors
    ///
    /// Returns `Graph` if the node is absent.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<(), EditorError> {
        self.apply(|graph| {
            graph.remove_node(node_id)?;
            Ok(())
        })
    }

    /// Steps back one snapshot. Returns false if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns `RunInProgress` while a run is active.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.ensure_idle()?;
        Ok(match self.history.undo() {
            Some(snapshot) => {
                self.current = snapshot;
                true
            }
            None => false,
        })
    }

    /// Steps forward one snapshot. Returns false if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns `RunInProgress` while a run is active.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.ensure_idle()?;
        Ok(match self.history.redo() {
            Some(snapshot) => {
                self.current = snapshot;
                true
            }
            None => false,
        })
    }

    /// Freezes the current snapshot for a run and blocks edits.
    ///
    /// # Errors
    ///
    /// Returns `RunInProgress` if a run is already active.
    pub fn begin_run(&mut self) -> Result<PendingRun, EditorError> {
        self.ensure_idle()?;
        self.running = true;
        let pending = PendingRun {
            run_id: WorkflowRunId::new(),
            workflow_id: self.workflow_id,
            snapshot: Arc::clone(&self.current),
        };
        info!(run_id = %pending.run_id, nodes = pending.snapshot.node_count(), "run started");
        Ok(pending)
    }

    /// Ends a run, writing outputs onto nodes when it succeeded.
    ///
    /// Writing outputs is not an undo step. A failed run leaves the previous
    /// outputs in place.
    ///
    /// # Errors
    ///
    /// Returns `Execution` if the run failed.
    pub fn finish_run(&mut self, result: RunResult) -> Result<RunOutputs, EditorError> {
        self.running = false;
        self.last_run = Some(result.run);

        match result.outcome {
            Ok(outputs) => {
                let mut next = Arc::clone(&self.current);
                Arc::make_mut(&mut next).set_execution_results(&outputs);
                self.history.replace_current(Arc::clone(&next));
                self.current = next;
                info!(outputs = outputs.len(), "run finished");
                Ok(outputs)
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Unblocks edits without recording a result.
    pub fn abandon_run(&mut self) {
        self.running = false;
    }

    /// Runs the current snapshot to completion.
    ///
    /// # Errors
    ///
    /// Returns `RunInProgress` or `Execution`.
    pub async fn run(&mut self, backend: &dyn ModuleBackend) -> Result<RunOutputs, EditorError> {
        let pending = self.begin_run()?;
        let engine = Arc::clone(&self.engine);
        let result = pending.execute(&engine, backend).await;
        self.finish_run(result)
    }

    /// Saves the current snapshot, creating the workflow on first save.
    ///
    /// # Errors
    ///
    /// Returns `Store` on failure; the snapshot stays marked unsaved.
    pub async fn save(&mut self, store: &dyn WorkflowStore) -> Result<WorkflowId, EditorError> {
        let id = match self.workflow_id {
            Some(id) => id,
            None => match store.create(DEFAULT_WORKFLOW_NAME).await {
                Ok(id) => {
                    self.workflow_id = Some(id);
                    id
                }
                Err(e) => return Err(self.report(e.into())),
            },
        };

        let snapshot = Arc::clone(&self.current);
        if let Err(e) = store.save(id, &snapshot).await {
            return Err(self.report(e.into()));
        }

        self.saved = snapshot;
        self.notifications.info("Workflow saved");
        debug!(workflow_id = %id, "workflow saved");
        Ok(id)
    }

    /// Replaces the canvas with a stored workflow and starts a new history.
    ///
    /// # Errors
    ///
    /// Returns `Store` on failure; the current canvas is left untouched.
    pub async fn load(&mut self, store: &dyn WorkflowStore, id: WorkflowId) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let graph = match store.load(id).await {
            Ok(graph) => graph,
            Err(e) => return Err(self.report(e.into())),
        };

        let snapshot = Arc::new(graph);
        self.history.reset(Arc::clone(&snapshot));
        self.saved = Arc::clone(&snapshot);
        self.current = snapshot;
        self.workflow_id = Some(id);
        self.last_run = None;
        debug!(workflow_id = %id, nodes = self.current.node_count(), "workflow loaded");
        Ok(())
    }

    fn ensure_idle(&mut self) -> Result<(), EditorError> {
        if self.running {
            return Err(self.report(EditorError::RunInProgress));
        }
        Ok(())
    }

    fn report(&mut self, error: EditorError) -> EditorError {
        self.notifications.error(error.to_string());
        error
    }

    /// Applies `change` to a copy of the current snapshot and commits it as
    /// a new history entry on success.
    fn apply<T>(
        &mut self,
        change: impl FnOnce(&mut WorkflowGraph) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        self.ensure_idle()?;
        let mut next = Arc::clone(&self.current);
        match change(Arc::make_mut(&mut next)) {
            Ok(value) => {
                self.history.checkpoint(Arc::clone(&next));
                self.current = next;
                Ok(value)
            }
            Err(e) => Err(self.report(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EchoBackend, ModuleCall, ModuleError};
    use crate::execution::ExecutionState;
    use crate::notification::NotificationLevel;
    use crate::store::{InMemoryWorkflowStore, WorkflowSummary};
    use async_trait::async_trait;
    use serde_json::{Value as JsonValue, json};

    fn editor() -> WorkflowEditor {
        WorkflowEditor::new(Arc::new(ModuleCatalog::builtin()), EditorSettings::default())
    }

    fn text_out(id: &NodeId) -> PortReference {
        PortReference::output(id.clone(), "output-1", "text")
    }

    fn text_in(id: &NodeId) -> PortReference {
        PortReference::input(id.clone(), "input-1", "text")
    }

    #[test]
    fn drop_module_is_undoable() {
        let mut editor = editor();
        let id = editor.drop_module("1", Position::new(1.0, 2.0)).expect("drop");

        assert!(editor.graph().contains_node(&id));
        assert!(editor.is_dirty());
        assert!(editor.undo().expect("undo"));
        assert!(editor.graph().is_empty());
        assert!(!editor.is_dirty());
        assert!(editor.redo().expect("redo"));
        assert!(editor.graph().contains_node(&id));
    }

    #[test]
    fn rejected_edit_changes_nothing_and_notifies() {
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");
        let image = editor.drop_module("2", Position::default()).expect("image");
        let before = editor.snapshot();

        let err = editor
            .connect(&text_out(&a), &PortReference::input(image.clone(), "input-1", "image"))
            .unwrap_err();

        assert!(matches!(
            err,
            EditorError::Connection(ConnectionError::TypeMismatch { .. })
        ));
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));
        let note = editor.notifications().last().expect("notification");
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(note.message.contains("incompatible port types"));
        assert!(note.message.contains(&format!("{a}:output-1")));
        assert!(note.message.contains(&format!("{image}:input-1")));
    }

    #[test]
    fn same_side_notification_names_both_ports() {
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");
        let b = editor.drop_module("1", Position::default()).expect("b");

        editor.connect(&text_out(&a), &text_out(&b)).unwrap_err();

        let note = editor.notifications().last().expect("notification");
        assert_eq!(
            note.message,
            format!("cannot connect output port {a}:output-1 to another output port {b}:output-1")
        );
    }

    #[test]
    fn duplicate_connect_is_informational_and_not_a_checkpoint() {
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");
        let b = editor.drop_module("1", Position::default()).expect("b");
        editor.connect(&text_out(&a), &text_in(&b)).expect("connect");
        let before = editor.snapshot();

        let outcome = editor.connect(&text_in(&b), &text_out(&a)).expect("no-op");

        assert!(!outcome.is_new());
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));
        assert_eq!(
            editor.notifications().last().map(|n| n.level),
            Some(NotificationLevel::Info)
        );
        assert!(editor.undo().expect("undo"));
        assert_eq!(editor.graph().edge_count(), 0);
    }

    #[test]
    fn history_entries_are_not_mutated_by_later_edits() {
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");
        let first = editor.snapshot();
        editor.move_node(&a, Position::new(50.0, 50.0)).expect("move");

        let node = first.node(&a).expect("node in old snapshot");
        assert_eq!(node.position, Position::default());
    }

    #[test]
    fn history_limit_is_honored() {
        let mut editor = WorkflowEditor::new(
            Arc::new(ModuleCatalog::builtin()),
            EditorSettings { history_limit: 3 },
        );
        for _ in 0..5 {
            editor.drop_module("1", Position::default()).expect("drop");
        }
        let mut undone = 0;
        while editor.undo().expect("undo") {
            undone += 1;
        }
        assert_eq!(undone, 2);
        assert_eq!(editor.graph().node_count(), 3);
    }

    #[tokio::test]
    async fn run_writes_results_without_a_checkpoint() {
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");
        let b = editor.drop_module("1", Position::default()).expect("b");
        editor.connect(&text_out(&a), &text_in(&b)).expect("connect");

        let outputs = editor.run(&EchoBackend).await.expect("run");

        assert_eq!(outputs.len(), 2);
        let result_b = editor
            .graph()
            .node(&b)
            .and_then(|n| n.execution_result.clone())
            .expect("result on b");
        assert!(result_b["inputs"].get(a.as_str()).is_some());
        assert_eq!(
            editor.last_run().map(|r| r.state),
            Some(ExecutionState::Completed)
        );

        // Undo goes straight past the result write-back to before the edge.
        assert!(editor.undo().expect("undo"));
        assert_eq!(editor.graph().edge_count(), 0);
    }

    struct FailingBackend;

    #[async_trait]
    impl ModuleBackend for FailingBackend {
        async fn invoke(&self, _call: ModuleCall<'_>) -> Result<JsonValue, ModuleError> {
            Err(ModuleError::ExecutionFailed {
                message: "model offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn failed_run_keeps_previous_results() {
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");
        editor.run(&EchoBackend).await.expect("first run");

        let err = editor.run(&FailingBackend).await.unwrap_err();

        assert!(matches!(
            err,
            EditorError::Execution(ExecutionError::ModuleFailed { .. })
        ));
        assert!(editor.graph().node(&a).and_then(|n| n.execution_result.as_ref()).is_some());
        assert_eq!(editor.last_run().map(|r| r.state), Some(ExecutionState::Failed));
        assert!(!editor.is_running());
    }

    #[tokio::test]
    async fn edits_are_blocked_during_a_run() {
        let mut editor = editor();
        editor.drop_module("1", Position::default()).expect("a");

        let pending = editor.begin_run().expect("begin");
        assert_eq!(
            editor.drop_module("1", Position::default()),
            Err(EditorError::RunInProgress)
        );
        assert_eq!(editor.undo(), Err(EditorError::RunInProgress));
        assert!(matches!(editor.begin_run(), Err(EditorError::RunInProgress)));

        let engine = Engine::new();
        let result = pending.execute(&engine, &EchoBackend).await;
        editor.finish_run(result).expect("finish");
        assert!(editor.drop_module("1", Position::default()).is_ok());
    }

    #[test]
    fn abandoned_run_unblocks_edits() {
        let mut editor = editor();
        let _pending = editor.begin_run().expect("begin");
        editor.abandon_run();
        assert!(editor.drop_module("1", Position::default()).is_ok());
    }

    #[tokio::test]
    async fn first_save_creates_the_workflow() {
        let store = InMemoryWorkflowStore::new();
        let mut editor = editor();
        editor.drop_module("1", Position::default()).expect("a");

        let id = editor.save(&store).await.expect("save");

        assert!(!editor.is_dirty());
        assert_eq!(editor.workflow_id(), Some(id));
        assert_eq!(
            store.list().await.expect("list"),
            vec![WorkflowSummary {
                id,
                name: DEFAULT_WORKFLOW_NAME.to_string()
            }]
        );
    }

    #[tokio::test]
    async fn failed_load_keeps_the_canvas() {
        let store = InMemoryWorkflowStore::new();
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");

        let err = editor.load(&store, WorkflowId::new()).await.unwrap_err();

        assert!(matches!(err, EditorError::Store(StoreError::NotFound { .. })));
        assert!(editor.graph().contains_node(&a));
        assert!(editor.is_dirty());
    }

    #[tokio::test]
    async fn load_resets_history() {
        let store = InMemoryWorkflowStore::new();
        let mut editor = editor();
        editor.drop_module("1", Position::default()).expect("a");
        let id = editor.save(&store).await.expect("save");

        let mut other = self::editor();
        other.drop_module("2", Position::default()).expect("b");
        other.load(&store, id).await.expect("load");

        assert!(!other.can_undo());
        assert!(!other.is_dirty());
        assert_eq!(other.graph().node_count(), 1);
        assert_eq!(other.graph().nodes()[0].module_id, "1");
    }

    #[test]
    fn config_edit_is_a_checkpoint() {
        let mut editor = editor();
        let a = editor.drop_module("1", Position::default()).expect("a");
        let mut config = editor.graph().node(&a).expect("a").config.clone();
        config.insert("model".to_string(), json!("default-model"));

        editor.update_node_config(&a, config).expect("update");
        assert_eq!(
            editor.graph().node(&a).and_then(|n| n.config.get("model").cloned()),
            Some(json!("default-model"))
        );
        editor.undo().expect("undo");
        assert_eq!(
            editor.graph().node(&a).and_then(|n| n.config.get("model").cloned()),
            Some(json!("gpt-2"))
        );
    }

    #[test]
    fn dismissing_notifications() {
        let mut editor = editor();
        let _ = editor.remove_node(&NodeId::new("ghost"));
        let id = editor.notifications().last().map(|n| n.id).expect("notification");
        assert!(editor.dismiss(id));
        assert!(editor.notifications().is_empty());
    }
}
