//! Artifact store seam between the orchestrator and its transports.
//!
//! The orchestrator only ever needs two operations against the engine's hot
//! directories: put one file, delete one file. Implementations live in
//! `gedsys-transport` (SFTP for real deployments, a local directory for
//! tests and dry runs).

use async_trait::async_trait;

/// Errors raised by artifact store implementations.
///
/// These never escape the store boundary as panics; callers receive the
/// variant and the orchestrator folds it into the deployment report.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("private key file not found: {path}")]
    KeyFileNotFound { path: String },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("remote operation failed on {path}: {cause}")]
    Remote { path: String, cause: String },

    #[error("remote path not found: {0}")]
    NotFound(String),

    #[error("http error: {0}")]
    Http(String),
}

/// Moves exactly one artifact's serialized text to or from a remote path.
///
/// Every call is an independent round trip; implementations must release
/// their session on every exit path and must not batch, retry, or reuse
/// connections.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Create (or overwrite) `remote_path` with `content`.
    async fn upload(&self, remote_path: &str, content: &str) -> Result<(), TransportError>;

    /// Delete `remote_path`.
    async fn remove(&self, remote_path: &str) -> Result<(), TransportError>;
}

/// In-memory artifact store fakes for tests.
pub mod fakes {
    use super::{ArtifactStore, TransportError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryInner {
        files: HashMap<String, String>,
        upload_order: Vec<String>,
    }

    /// Artifact store backed by a mutex-guarded map. Tracks upload order.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<MemoryInner>,
        /// Uploads whose remote path contains any of these substrings fail.
        fail_upload_on: Vec<String>,
        /// Removals whose remote path contains any of these substrings fail.
        fail_remove_on: Vec<String>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// A store that rejects uploads whose path contains any of the given
        /// substrings.
        pub fn failing_uploads_on(substrings: Vec<String>) -> Self {
            Self {
                fail_upload_on: substrings,
                ..Self::default()
            }
        }

        /// A store that rejects removals whose path contains any of the
        /// given substrings.
        pub fn failing_removals_on(substrings: Vec<String>) -> Self {
            Self {
                fail_remove_on: substrings,
                ..Self::default()
            }
        }

        pub fn read(&self, remote_path: &str) -> Option<String> {
            self.inner
                .lock()
                .expect("memory store lock")
                .files
                .get(remote_path)
                .cloned()
        }

        /// Remote paths in the order they were uploaded.
        pub fn upload_order(&self) -> Vec<String> {
            self.inner
                .lock()
                .expect("memory store lock")
                .upload_order
                .clone()
        }

        pub fn len(&self) -> usize {
            self.inner.lock().expect("memory store lock").files.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn rejects_upload(&self, remote_path: &str) -> bool {
            self.fail_upload_on.iter().any(|s| remote_path.contains(s))
        }

        fn rejects_removal(&self, remote_path: &str) -> bool {
            self.fail_remove_on.iter().any(|s| remote_path.contains(s))
        }
    }

    #[async_trait]
    impl ArtifactStore for MemoryStore {
        async fn upload(&self, remote_path: &str, content: &str) -> Result<(), TransportError> {
            if self.rejects_upload(remote_path) {
                return Err(TransportError::Remote {
                    path: remote_path.to_string(),
                    cause: "injected failure".to_string(),
                });
            }
            let mut inner = self.inner.lock().expect("memory store lock");
            inner
                .files
                .insert(remote_path.to_string(), content.to_string());
            inner.upload_order.push(remote_path.to_string());
            Ok(())
        }

        async fn remove(&self, remote_path: &str) -> Result<(), TransportError> {
            if self.rejects_removal(remote_path) {
                return Err(TransportError::Remote {
                    path: remote_path.to_string(),
                    cause: "injected failure".to_string(),
                });
            }
            let mut inner = self.inner.lock().expect("memory store lock");
            inner
                .files
                .remove(remote_path)
                .map(|_| ())
                .ok_or_else(|| TransportError::NotFound(remote_path.to_string()))
        }
    }
}
