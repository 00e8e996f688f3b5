//! Run records and execution events.
//!
//! The engine reports progress as a stream of [`ExecutionEvent`]s. A
//! [`WorkflowRun`] is the fold of those events: the overall state, when it
//! started and finished, and the state of every node in execution order.

use crate::backend::NodeInputs;
use crate::node::NodeId;
use aiflow_core::{WorkflowId, WorkflowRunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The overall state of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Created but not yet ordered.
    Queued,
    /// Nodes are being invoked.
    Running,
    /// Every node produced an output.
    Completed,
    /// Ordering failed or a node failed.
    Failed,
}

impl ExecutionState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The state of a single node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeExecutionState {
    /// Waiting for its turn.
    Pending,
    /// Backend call in flight.
    Running,
    /// Produced an output.
    Completed,
    /// The backend reported an error.
    Failed,
    /// Never invoked because the run stopped earlier.
    Skipped,
}

impl NodeExecutionState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// Execution record for a single node within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecution {
    pub node_id: NodeId,
    pub state: NodeExecutionState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl NodeExecution {
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            state: NodeExecutionState::Pending,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }
}

/// A record of a single workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: WorkflowRunId,
    /// The stored workflow this run belongs to, if it has been saved.
    pub workflow_id: Option<WorkflowId>,
    pub state: ExecutionState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-node records, in execution order once the run has started.
    pub nodes: Vec<NodeExecution>,
    pub error: Option<String>,
}

impl WorkflowRun {
    /// Creates a queued run.
    #[must_use]
    pub fn new(id: WorkflowRunId, workflow_id: Option<WorkflowId>) -> Self {
        Self {
            id,
            workflow_id,
            state: ExecutionState::Queued,
            started_at: None,
            finished_at: None,
            nodes: Vec::new(),
            error: None,
        }
    }

    /// Folds one event into the record. Events for other runs are ignored.
    pub fn apply(&mut self, event: &ExecutionEvent) {
        if event.run_id() != self.id {
            return;
        }

        match event {
            ExecutionEvent::RunStarted {
                order, timestamp, ..
            } => {
                self.state = ExecutionState::Running;
                self.started_at = Some(*timestamp);
                self.nodes = order.iter().cloned().map(NodeExecution::new).collect();
            }
            ExecutionEvent::NodeStarted {
                node_id, timestamp, ..
            } => {
                if let Some(node) = self.node_mut(node_id) {
                    node.state = NodeExecutionState::Running;
                    node.started_at = Some(*timestamp);
                }
            }
            ExecutionEvent::NodeCompleted {
                node_id, timestamp, ..
            } => {
                if let Some(node) = self.node_mut(node_id) {
                    node.state = NodeExecutionState::Completed;
                    node.finished_at = Some(*timestamp);
                }
            }
            ExecutionEvent::NodeFailed {
                node_id,
                error,
                timestamp,
                ..
            } => {
                if let Some(node) = self.node_mut(node_id) {
                    node.state = NodeExecutionState::Failed;
                    node.finished_at = Some(*timestamp);
                    node.error = Some(error.clone());
                }
            }
            ExecutionEvent::RunCompleted { timestamp, .. } => {
                self.state = ExecutionState::Completed;
                self.finished_at = Some(*timestamp);
            }
            ExecutionEvent::RunFailed {
                error, timestamp, ..
            } => {
                self.state = ExecutionState::Failed;
                self.finished_at = Some(*timestamp);
                self.error = Some(error.clone());
                for node in &mut self.nodes {
                    if node.state == NodeExecutionState::Pending {
                        node.state = NodeExecutionState::Skipped;
                    }
                }
            }
        }
    }

    /// Returns the record for a node.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&NodeExecution> {
        self.nodes.iter().find(|n| &n.node_id == node_id)
    }

    fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut NodeExecution> {
        self.nodes.iter_mut().find(|n| &n.node_id == node_id)
    }

    /// Returns the duration of the run, if it has started.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end - start)
    }
}

/// Progress reported by the engine while a run executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// Ordering succeeded; nodes will run in `order`.
    RunStarted {
        run_id: WorkflowRunId,
        order: Vec<NodeId>,
        timestamp: DateTime<Utc>,
    },
    /// A node is about to be invoked.
    NodeStarted {
        run_id: WorkflowRunId,
        node_id: NodeId,
        inputs: NodeInputs,
        timestamp: DateTime<Utc>,
    },
    /// A node produced an output.
    NodeCompleted {
        run_id: WorkflowRunId,
        node_id: NodeId,
        output: JsonValue,
        timestamp: DateTime<Utc>,
    },
    /// A node failed.
    NodeFailed {
        run_id: WorkflowRunId,
        node_id: NodeId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// Every node completed.
    RunCompleted {
        run_id: WorkflowRunId,
        timestamp: DateTime<Utc>,
    },
    /// The run stopped; no further nodes will be invoked.
    RunFailed {
        run_id: WorkflowRunId,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    /// Returns the run ID associated with this event.
    #[must_use]
    pub fn run_id(&self) -> WorkflowRunId {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::NodeStarted { run_id, .. }
            | Self::NodeCompleted { run_id, .. }
            | Self::NodeFailed { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunFailed { run_id, .. } => *run_id,
        }
    }

    /// Returns the timestamp of this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::RunStarted { timestamp, .. }
            | Self::NodeStarted { timestamp, .. }
            | Self::NodeCompleted { timestamp, .. }
            | Self::NodeFailed { timestamp, .. }
            | Self::RunCompleted { timestamp, .. }
            | Self::RunFailed { timestamp, .. } => *timestamp,
        }
    }
}
