//! In-process workflow store.

use super::{StoreError, WorkflowDocument, WorkflowStore, WorkflowSummary};
use crate::graph::WorkflowGraph;
use aiflow_core::WorkflowId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredWorkflow {
    name: String,
    document: WorkflowDocument,
}

/// Keeps workflows in memory for the lifetime of the value.
///
/// Documents are stored in wire form, so a load goes through the same
/// sanitizing path as the other stores.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<BTreeMap<WorkflowId, StoredWorkflow>>,
}

impl InMemoryWorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw document under a new id.
    pub async fn insert_document(&self, name: &str, document: WorkflowDocument) -> WorkflowId {
        let id = WorkflowId::new();
        self.workflows.write().await.insert(
            id,
            StoredWorkflow {
                name: name.to_string(),
                document,
            },
        );
        id
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn create(&self, name: &str) -> Result<WorkflowId, StoreError> {
        let id = self.insert_document(name, WorkflowDocument::default()).await;
        debug!(workflow_id = %id, name, "created workflow");
        Ok(id)
    }

    async fn load(&self, id: WorkflowId) -> Result<WorkflowGraph, StoreError> {
        let document = self
            .workflows
            .read()
            .await
            .get(&id)
            .map(|w| w.document.clone())
            .ok_or(StoreError::NotFound { id })?;
        document.into_graph()
    }

    async fn save(&self, id: WorkflowId, graph: &WorkflowGraph) -> Result<(), StoreError> {
        let mut workflows = self.workflows.write().await;
        let stored = workflows.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        stored.document = WorkflowDocument::from(graph);
        debug!(workflow_id = %id, nodes = graph.node_count(), "saved workflow");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        Ok(self
            .workflows
            .read()
            .await
            .iter()
            .map(|(id, w)| WorkflowSummary {
                id: *id,
                name: w.name.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[tokio::test]
    async fn create_save_load() {
        let store = InMemoryWorkflowStore::new();
        let id = store.create("demo").await.expect("create");
        assert!(store.load(id).await.expect("load").is_empty());

        let mut graph = WorkflowGraph::new();
        graph.add_node(Node::new("a", "1", "t", "A")).expect("add");
        store.save(id, &graph).await.expect("save");

        assert_eq!(store.load(id).await.expect("load"), graph);
        let listed = store.list().await.expect("list");
        assert_eq!(listed, vec![WorkflowSummary { id, name: "demo".to_string() }]);
    }

    #[tokio::test]
    async fn missing_workflow_is_not_found() {
        let store = InMemoryWorkflowStore::new();
        let id = WorkflowId::new();
        assert_eq!(store.load(id).await, Err(StoreError::NotFound { id }));
        assert_eq!(
            store.save(id, &WorkflowGraph::new()).await,
            Err(StoreError::NotFound { id })
        );
    }
}
