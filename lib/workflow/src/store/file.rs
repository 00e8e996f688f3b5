//! Directory-backed workflow store.
//!
//! Each workflow is one `<id>.json` file holding a versioned envelope around
//! the workflow's name and document. Writes go to a temporary file that is
//! renamed into place, so a crash never leaves a half-written workflow.

use super::{StoreError, WorkflowDocument, WorkflowStore, WorkflowSummary};
use crate::envelope::{CURRENT_VERSION, Envelope, RawEnvelope};
use crate::graph::WorkflowGraph;
use aiflow_core::WorkflowId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

const EXTENSION: &str = "json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FileRecord {
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    document: WorkflowDocument,
}

/// Stores workflows as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileWorkflowStore {
    dir: PathBuf,
}

impl FileWorkflowStore {
    /// Uses `dir`, which is created on first write if missing.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: WorkflowId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    async fn read_record(&self, id: WorkflowId) -> Result<FileRecord, StoreError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound { id }),
            Err(e) => return Err(e.into()),
        };

        let raw = RawEnvelope::sniff(&bytes)?;
        if raw.version > CURRENT_VERSION {
            return Err(StoreError::Malformed {
                message: format!("unsupported document version {}", raw.version),
            });
        }
        Ok(raw.decode::<FileRecord>()?.into_payload())
    }

    async fn write_record(&self, id: WorkflowId, record: FileRecord) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = Envelope::new(record).to_json_bytes()?;

        let path = self.path_for(id);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowStore for FileWorkflowStore {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn create(&self, name: &str) -> Result<WorkflowId, StoreError> {
        let id = WorkflowId::new();
        self.write_record(
            id,
            FileRecord {
                name: name.to_string(),
                document: WorkflowDocument::default(),
            },
        )
        .await?;
        debug!(workflow_id = %id, "created workflow file");
        Ok(id)
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load(&self, id: WorkflowId) -> Result<WorkflowGraph, StoreError> {
        self.read_record(id).await?.document.into_graph()
    }

    #[instrument(skip(self, graph), fields(dir = %self.dir.display(), nodes = graph.node_count()))]
    async fn save(&self, id: WorkflowId, graph: &WorkflowGraph) -> Result<(), StoreError> {
        let mut record = self.read_record(id).await?;
        record.document = WorkflowDocument::from(graph);
        self.write_record(id, record).await?;
        debug!(workflow_id = %id, "saved workflow file");
        Ok(())
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<WorkflowId>() {
                Ok(id) => ids.push(id),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unrecognized file"),
            }
        }
        ids.sort();

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self.read_record(id).await?;
            summaries.push(WorkflowSummary {
                id,
                name: record.name,
            });
        }
        Ok(summaries)
    }
}
