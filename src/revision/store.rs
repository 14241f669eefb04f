// ABOUTME: Revision store: appends block identities to a per-document, duplicate-free history.
// ABOUTME: Appends are serialized so concurrent callers never overwrite each other's writes.

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::backend::RevisionBackend;
use crate::identity::Identity;

/// Result of appending an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("failed to persist revisions for '{document_id}': {source}")]
    Persistence {
        document_id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("stored revision for '{document_id}' is not a valid identity: {value}")]
    Corrupt { document_id: String, value: String },
}

/// Ordered revision history per document on top of a persistence backend.
pub struct RevisionStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: RevisionBackend> RevisionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Append `identity` to the history of `document_id` unless already present.
    pub async fn append(
        &self,
        document_id: &str,
        identity: &Identity,
    ) -> Result<AppendOutcome, RevisionError> {
        let _guard = self.write_lock.lock().await;

        let mut revisions = self
            .backend
            .load(document_id)
            .await
            .map_err(|source| persistence(document_id, source))?
            .unwrap_or_default();

        if revisions.iter().any(|r| r == identity.as_str()) {
            debug!(document = document_id, "revision already present");
            return Ok(AppendOutcome::AlreadyPresent);
        }

        revisions.push(identity.as_str().to_string());
        self.backend
            .save(document_id, &revisions)
            .await
            .map_err(|source| {
                warn!(document = document_id, error = %source, "failed to save revision");
                persistence(document_id, source)
            })?;
        debug!(document = document_id, count = revisions.len(), "revision added");
        Ok(AppendOutcome::Added)
    }

    /// Stored history of `document_id`, oldest first.
    pub async fn list(&self, document_id: &str) -> Result<Vec<Identity>, RevisionError> {
        let revisions = self
            .backend
            .load(document_id)
            .await
            .map_err(|source| persistence(document_id, source))?
            .unwrap_or_default();

        revisions
            .into_iter()
            .map(|value| {
                Identity::parse(&value).map_err(|_| RevisionError::Corrupt {
                    document_id: document_id.to_string(),
                    value,
                })
            })
            .collect()
    }
}

fn persistence(document_id: &str, source: anyhow::Error) -> RevisionError {
    RevisionError::Persistence {
        document_id: document_id.to_string(),
        source,
    }
}
