//! The execution engine.
//!
//! A run orders the graph, then invokes each node through the backend one
//! at a time. Each node receives the outputs of the nodes feeding it. The
//! first failure aborts the run; nodes after it are never invoked.
//!
//! The engine never mutates the graph it is given. Callers decide what to do
//! with the returned outputs.

use crate::backend::{ModuleBackend, ModuleCall, NodeInputs};
use crate::edge::Connection;
use crate::error::ExecutionError;
use crate::execution::ExecutionEvent;
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use aiflow_core::WorkflowRunId;
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, instrument, warn};

/// Outputs of a completed run, keyed by node.
pub type RunOutputs = HashMap<NodeId, JsonValue>;

/// Receives progress events during a run.
///
/// Listeners observe every node output as it is produced, so they can keep
/// partial results even when the run later fails.
pub trait ExecutionListener: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

impl ExecutionListener for () {
    fn on_event(&self, _event: &ExecutionEvent) {}
}

impl ExecutionListener for mpsc::UnboundedSender<ExecutionEvent> {
    fn on_event(&self, event: &ExecutionEvent) {
        // A closed receiver means nobody is watching any more.
        let _ = self.send(event.clone());
    }
}

/// Runs workflows, one at a time.
#[derive(Debug, Default)]
pub struct Engine {
    gate: Mutex<()>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a run holds the engine.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Runs the graph and returns every node's output.
    ///
    /// # Errors
    ///
    /// - `CycleDetected` if the graph cannot be ordered; nothing is invoked
    /// - `ModuleFailed` naming the first node whose module failed
    /// - `RunInProgress` if this engine is already running a workflow
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        backend: &dyn ModuleBackend,
    ) -> Result<RunOutputs, ExecutionError> {
        self.run_observed(WorkflowRunId::new(), graph, backend, &())
            .await
    }

    /// Runs the graph, reporting progress to `listener`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::run`].
    #[instrument(skip(self, graph, backend, listener), fields(run_id = %run_id, nodes = graph.node_count()))]
    pub async fn run_observed(
        &self,
        run_id: WorkflowRunId,
        graph: &WorkflowGraph,
        backend: &dyn ModuleBackend,
        listener: &dyn ExecutionListener,
    ) -> Result<RunOutputs, ExecutionError> {
        let Ok(_guard) = self.gate.try_lock() else {
            warn!("rejecting run while another is in progress");
            return Err(ExecutionError::RunInProgress);
        };

        let order = match graph.execution_order() {
            Ok(order) => order,
            Err(cycle) => {
                let error = ExecutionError::CycleDetected(cycle);
                listener.on_event(&ExecutionEvent::RunFailed {
                    run_id,
                    error: error.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(error);
            }
        };

        info!(order_len = order.len(), "starting run");
        listener.on_event(&ExecutionEvent::RunStarted {
            run_id,
            order: order.clone(),
            timestamp: Utc::now(),
        });

        let mut outputs = RunOutputs::with_capacity(order.len());
        for node_id in &order {
            let Some(node) = graph.node(node_id) else {
                continue;
            };

            let inputs = assemble_inputs(graph.edges(), node_id, &outputs);
            debug!(node_id = %node_id, inputs = inputs.len(), "invoking module");
            listener.on_event(&ExecutionEvent::NodeStarted {
                run_id,
                node_id: node_id.clone(),
                inputs: inputs.clone(),
                timestamp: Utc::now(),
            });

            match backend.invoke(ModuleCall::for_node(node, &inputs)).await {
                Ok(output) => {
                    listener.on_event(&ExecutionEvent::NodeCompleted {
                        run_id,
                        node_id: node_id.clone(),
                        output: output.clone(),
                        timestamp: Utc::now(),
                    });
                    outputs.insert(node_id.clone(), output);
                }
                Err(cause) => {
                    warn!(node_id = %node_id, error = %cause, "module failed; aborting run");
                    listener.on_event(&ExecutionEvent::NodeFailed {
                        run_id,
                        node_id: node_id.clone(),
                        error: cause.to_string(),
                        timestamp: Utc::now(),
                    });
                    let error = ExecutionError::ModuleFailed {
                        node_id: node_id.clone(),
                        cause,
                    };
                    listener.on_event(&ExecutionEvent::RunFailed {
                        run_id,
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(error);
                }
            }
        }

        info!("run completed");
        listener.on_event(&ExecutionEvent::RunCompleted {
            run_id,
            timestamp: Utc::now(),
        });
        Ok(outputs)
    }
}

/// Collects the inputs of `node_id` from the outputs produced so far.
///
/// Every edge into the node contributes its producer's output under the
/// producer's id. Producers without an output are left out.
#[must_use]
pub fn assemble_inputs(edges: &[Connection], node_id: &NodeId, outputs: &RunOutputs) -> NodeInputs {
    edges
        .iter()
        .filter(|edge| &edge.target_item_id == node_id)
        .filter_map(|edge| {
            outputs
                .get(&edge.source_item_id)
                .map(|output| (edge.source_item_id.clone(), output.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ModuleError;
    use crate::node::Node;
    use crate::port::{Port, PortReference};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::Notify;

    /// Records every call and answers from a fixed table.
    #[derive(Default)]
    struct MockBackend {
        outputs: HashMap<String, JsonValue>,
        failing: HashSet<String>,
        calls: StdMutex<Vec<(NodeId, NodeInputs)>>,
    }

    impl MockBackend {
        fn with_output(mut self, node: &str, output: JsonValue) -> Self {
            self.outputs.insert(node.to_string(), output);
            self
        }

        fn failing_at(mut self, node: &str) -> Self {
            self.failing.insert(node.to_string());
            self
        }

        fn calls(&self) -> Vec<(NodeId, NodeInputs)> {
            self.calls.lock().expect("lock").clone()
        }

        fn called_ids(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .map(|(id, _)| id.as_str().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl ModuleBackend for MockBackend {
        async fn invoke(&self, call: ModuleCall<'_>) -> Result<JsonValue, ModuleError> {
            self.calls
                .lock()
                .expect("lock")
                .push((call.node_id.clone(), call.inputs.clone()));

            if self.failing.contains(call.node_id.as_str()) {
                return Err(ModuleError::ExecutionFailed {
                    message: "mock failure".to_string(),
                });
            }
            Ok(self
                .outputs
                .get(call.node_id.as_str())
                .cloned()
                .unwrap_or_else(|| json!(call.node_id.as_str())))
        }
    }

    fn node(id: &str) -> Node {
        Node::new(id, "1", "test", id)
            .with_input(Port::new("input-1", "any"))
            .with_input(Port::new("input-2", "any"))
            .with_output(Port::new("output-1", "any"))
    }

    fn graph(ids: &[&str], edges: &[(&str, &str, &str)]) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new();
        for id in ids {
            graph.add_node(node(id)).expect("add node");
        }
        for (source, target, port) in edges {
            graph
                .connect(
                    &PortReference::output(NodeId::new(*source), "output-1", "any"),
                    &PortReference::input(NodeId::new(*target), *port, "any"),
                )
                .expect("connect");
        }
        graph
    }

    #[tokio::test]
    async fn cycle_fails_before_any_invocation() {
        let graph = WorkflowGraph::assemble(
            vec![node("a"), node("b")],
            vec![
                Connection::new("a", "output-1", "b", "input-1"),
                Connection::new("b", "output-1", "a", "input-1"),
            ],
        )
        .expect("assemble");
        let backend = MockBackend::default();

        let err = Engine::new().run(&graph, &backend).await.unwrap_err();

        assert!(matches!(err, ExecutionError::CycleDetected(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn downstream_receives_upstream_output_keyed_by_producer() {
        let graph = graph(&["a", "b"], &[("a", "b", "input-1")]);
        let backend = MockBackend::default().with_output("a", json!("X"));

        let outputs = Engine::new().run(&graph, &backend).await.expect("run");

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.is_empty());
        assert_eq!(calls[1].0, NodeId::new("b"));
        assert_eq!(calls[1].1.get(&NodeId::new("a")), Some(&json!("X")));
        assert_eq!(calls[1].1.len(), 1);
        assert_eq!(outputs.len(), 2);
    }

    #[tokio::test]
    async fn two_producers_are_distinguished_by_id() {
        let graph = graph(&["a", "b", "c"], &[("a", "c", "input-1"), ("b", "c", "input-2")]);
        let backend = MockBackend::default()
            .with_output("a", json!(1))
            .with_output("b", json!(2));

        Engine::new().run(&graph, &backend).await.expect("run");

        let calls = backend.calls();
        let inputs = &calls[2].1;
        assert_eq!(inputs.get(&NodeId::new("a")), Some(&json!(1)));
        assert_eq!(inputs.get(&NodeId::new("b")), Some(&json!(2)));
    }

    #[tokio::test]
    async fn failure_aborts_and_names_the_node() {
        let graph = graph(&["a", "b", "c"], &[("a", "b", "input-1"), ("b", "c", "input-1")]);
        let backend = MockBackend::default().failing_at("b");

        let err = Engine::new().run(&graph, &backend).await.unwrap_err();

        assert_eq!(err.failed_node(), Some(&NodeId::new("b")));
        assert_eq!(backend.called_ids(), ["a", "b"]);
    }

    #[tokio::test]
    async fn listener_sees_partial_results_before_failure() {
        let graph = graph(&["a", "b"], &[("a", "b", "input-1")]);
        let backend = MockBackend::default()
            .with_output("a", json!("X"))
            .failing_at("b");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let run_id = WorkflowRunId::new();
        let result = Engine::new()
            .run_observed(run_id, &graph, &backend, &tx)
            .await;
        assert!(result.is_err());
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert!(events.iter().all(|e| e.run_id() == run_id));
        assert!(events.iter().any(|e| matches!(
            e,
            ExecutionEvent::NodeCompleted { node_id, output, .. }
                if node_id.as_str() == "a" && output == &json!("X")
        )));
        assert!(matches!(events.last(), Some(ExecutionEvent::RunFailed { .. })));
    }

    #[tokio::test]
    async fn empty_graph_runs_to_nothing() {
        let outputs = Engine::new()
            .run(&WorkflowGraph::new(), &MockBackend::default())
            .await
            .expect("run");
        assert!(outputs.is_empty());
    }

    /// Blocks inside `invoke` until released.
    struct GatedBackend {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ModuleBackend for GatedBackend {
        async fn invoke(&self, _call: ModuleCall<'_>) -> Result<JsonValue, ModuleError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(json!(null))
        }
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let engine = Arc::new(Engine::new());
        let graph = Arc::new(graph(&["a"], &[]));
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let backend = Arc::new(GatedBackend {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });

        let first = {
            let engine = Arc::clone(&engine);
            let graph = Arc::clone(&graph);
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { engine.run(&graph, backend.as_ref()).await })
        };

        entered.notified().await;
        assert!(engine.is_running());
        let second = engine.run(&graph, backend.as_ref()).await;
        assert_eq!(second, Err(ExecutionError::RunInProgress));

        release.notify_one();
        let first = first.await.expect("join");
        assert!(first.is_ok());
        assert!(!engine.is_running());
    }

    #[test]
    fn inputs_skip_producers_without_output() {
        let edges = vec![
            Connection::new("a", "output-1", "c", "input-1"),
            Connection::new("b", "output-1", "c", "input-2"),
        ];
        let mut outputs = RunOutputs::new();
        outputs.insert(NodeId::new("a"), json!(1));

        let inputs = assemble_inputs(&edges, &NodeId::new("c"), &outputs);

        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs.get(&NodeId::new("a")), Some(&json!(1)));
    }
}
