// ABOUTME: Persistence backends for per-document revision lists.
// ABOUTME: In-memory map for tests and a JSON file written atomically via tmp + rename.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Get/set access to the ordered string list stored for each document.
#[async_trait]
pub trait RevisionBackend: Send + Sync {
    /// Stored list for `document_id`, or `None` if nothing was ever saved.
    async fn load(&self, document_id: &str) -> anyhow::Result<Option<Vec<String>>>;

    /// Replace the stored list for `document_id`.
    async fn save(&self, document_id: &str, revisions: &[String]) -> anyhow::Result<()>;
}

/// Backend that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryBackend {
    documents: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevisionBackend for MemoryBackend {
    async fn load(&self, document_id: &str) -> anyhow::Result<Option<Vec<String>>> {
        Ok(self.documents.lock().await.get(document_id).cloned())
    }

    async fn save(&self, document_id: &str, revisions: &[String]) -> anyhow::Result<()> {
        self.documents
            .lock()
            .await
            .insert(document_id.to_string(), revisions.to_vec());
        Ok(())
    }
}

/// On-disk layout of the revisions file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionsFile {
    /// Schema version for forward compatibility.
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Revision lists keyed by document id.
    #[serde(default)]
    pub documents: BTreeMap<String, Vec<String>>,
}

impl Default for RevisionsFile {
    fn default() -> Self {
        Self {
            version: 1,
            updated_at: None,
            documents: BTreeMap::new(),
        }
    }
}

impl RevisionsFile {
    /// Load from disk. Returns an empty file if the path doesn't exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let file: Self = serde_json::from_str(&content)?;
        Ok(file)
    }

    /// Save to disk (atomic write via tmp + rename), creating parent directories.
    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&tmp_path, &content).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

/// Backend storing every document's list in a single JSON file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RevisionBackend for JsonFileBackend {
    async fn load(&self, document_id: &str) -> anyhow::Result<Option<Vec<String>>> {
        let file = RevisionsFile::load(&self.path).await?;
        Ok(file.documents.get(document_id).cloned())
    }

    async fn save(&self, document_id: &str, revisions: &[String]) -> anyhow::Result<()> {
        let mut file = RevisionsFile::load(&self.path).await?;
        file.documents
            .insert(document_id.to_string(), revisions.to_vec());
        file.updated_at = Some(Utc::now());
        file.save(&self.path).await
    }
}
