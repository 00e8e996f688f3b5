//! Workflow graph model and execution engine for aiflow.
//!
//! This crate provides:
//!
//! - **Graph Model**: nodes placed from a module catalog, typed ports, and
//!   output-to-input connections with enforced wiring rules
//! - **Ordering**: deterministic topological ordering with cycle reporting
//! - **Execution**: a sequential run loop that feeds each node the outputs
//!   of its producers through a pluggable module backend
//! - **Editing**: copy-on-write snapshots with bounded undo/redo
//! - **Persistence**: a wire document and stores for memory, files and HTTP

pub mod backend;
pub mod catalog;
pub mod connect;
pub mod edge;
pub mod editor;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod execution;
pub mod graph;
pub mod history;
pub mod node;
pub mod notification;
pub mod order;
pub mod port;
pub mod store;

pub use backend::{
    EchoBackend, HttpBackend, ModuleBackend, ModuleCall, ModuleError, NodeInputs, SimulatedBackend,
};
pub use catalog::{CatalogError, ModuleCatalog, ModuleDescriptor};
pub use connect::{ConnectOutcome, can_connect};
pub use edge::{Connection, DEFAULT_SOURCE_PORT, DEFAULT_TARGET_PORT, WireConnection};
pub use editor::{EditorError, EditorSettings, PendingRun, RunResult, WorkflowEditor};
pub use engine::{Engine, ExecutionListener, RunOutputs};
pub use error::{ConnectionError, CycleError, ExecutionError, GraphError};
pub use execution::{ExecutionEvent, ExecutionState, NodeExecutionState, WorkflowRun};
pub use graph::WorkflowGraph;
pub use history::{DEFAULT_HISTORY_LIMIT, History};
pub use node::{ConfigFieldType, ConfigSchemaItem, ModuleConfig, Node, NodeId, Position};
pub use notification::{MAX_NOTIFICATIONS, Notification, NotificationLevel, Notifications};
pub use order::execution_order;
pub use port::{ANY_TYPE, Port, PortDirection, PortEndpoint, PortReference, PortType};
pub use store::{
    FileWorkflowStore, HttpWorkflowStore, InMemoryWorkflowStore, StoreError, WorkflowDocument,
    WorkflowStore, WorkflowSummary,
};
