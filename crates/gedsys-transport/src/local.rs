//! Local-directory artifact store.
//!
//! Same contract as the SFTP store, rooted at a directory on this machine.
//! Used by tests and by `render`/dry-run flows that want to inspect the
//! generated artifacts without a CEP server.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use gedsys_core::store::{ArtifactStore, TransportError};

/// Artifact store rooted at a local directory.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a remote-style absolute path under the local root.
    fn resolve(&self, remote_path: &str) -> PathBuf {
        let relative = remote_path.trim_start_matches('/');
        self.root.join(relative)
    }

    /// Read back an artifact, `NotFound` when it does not exist.
    pub fn read(&self, remote_path: &str) -> Result<String, TransportError> {
        let path = self.resolve(remote_path);
        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransportError::NotFound(remote_path.to_string())
            } else {
                remote_error(&path, e)
            }
        })
    }
}

fn remote_error(path: &Path, cause: std::io::Error) -> TransportError {
    TransportError::Remote {
        path: path.display().to_string(),
        cause: cause.to_string(),
    }
}

#[async_trait]
impl ArtifactStore for LocalDirStore {
    async fn upload(&self, remote_path: &str, content: &str) -> Result<(), TransportError> {
        let path = self.resolve(remote_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| remote_error(parent, e))?;
        }
        std::fs::write(&path, content).map_err(|e| remote_error(&path, e))?;
        debug!(remote_path = %remote_path, "wrote artifact to local store");
        Ok(())
    }

    async fn remove(&self, remote_path: &str) -> Result<(), TransportError> {
        let path = self.resolve(remote_path);
        std::fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransportError::NotFound(remote_path.to_string())
            } else {
                remote_error(&path, e)
            }
        })
    }
}
