//! REST-backed workflow store.
//!
//! Talks to a workflow service exposing:
//!
//! - `POST {base}/workflows` with `{name}`, answering `{id}`
//! - `GET {base}/workflows/{id}` answering a workflow document
//! - `PUT {base}/workflows/{id}` with a workflow document
//! - `GET {base}/workflows` answering `[{id, name}]`

use super::{StoreError, WorkflowDocument, WorkflowStore, WorkflowSummary};
use crate::graph::WorkflowGraph;
use aiflow_core::WorkflowId;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: WorkflowId,
}

/// A workflow store behind an HTTP API.
#[derive(Debug, Clone)]
pub struct HttpWorkflowStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWorkflowStore {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection_url(&self) -> String {
        format!("{}/workflows", self.base_url)
    }

    fn workflow_url(&self, id: WorkflowId) -> String {
        format!("{}/workflows/{id}", self.base_url)
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport {
        message: e.to_string(),
    }
}

/// Maps non-success statuses onto store errors.
async fn check(response: Response, id: Option<WorkflowId>) -> Result<Response, StoreError> {
    let status = response.status();
    debug!(%status, "workflow service responded");
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => Err(StoreError::NotFound { id }),
        (s, _) if s.is_success() => Ok(response),
        (s, _) => {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Transport {
                message: format!("{s}: {body}"),
            })
        }
    }
}

#[async_trait]
impl WorkflowStore for HttpWorkflowStore {
    #[instrument(skip(self))]
    async fn create(&self, name: &str) -> Result<WorkflowId, StoreError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(&CreateRequest { name })
            .send()
            .await
            .map_err(transport)?;
        let created: CreateResponse = check(response, None)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                message: e.to_string(),
            })?;
        Ok(created.id)
    }

    #[instrument(skip(self))]
    async fn load(&self, id: WorkflowId) -> Result<WorkflowGraph, StoreError> {
        let response = self
            .client
            .get(self.workflow_url(id))
            .send()
            .await
            .map_err(transport)?;
        let document: WorkflowDocument = check(response, Some(id))
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                message: e.to_string(),
            })?;
        document.into_graph()
    }

    #[instrument(skip(self, graph), fields(nodes = graph.node_count()))]
    async fn save(&self, id: WorkflowId, graph: &WorkflowGraph) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.workflow_url(id))
            .json(&WorkflowDocument::from(graph))
            .send()
            .await
            .map_err(transport)?;
        check(response, Some(id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(transport)?;
        check(response, None)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_base() {
        let store = HttpWorkflowStore::new("http://localhost:3001/api/");
        let id = WorkflowId::new();
        assert_eq!(store.collection_url(), "http://localhost:3001/api/workflows");
        assert_eq!(
            store.workflow_url(id),
            format!("http://localhost:3001/api/workflows/{id}")
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        // A port that was just released has nothing listening on it.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr").port()
        };
        let store = HttpWorkflowStore::new(format!("http://127.0.0.1:{port}"));
        let err = store.load(WorkflowId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport { .. }));
    }
}
