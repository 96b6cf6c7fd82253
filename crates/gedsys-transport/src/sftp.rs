//! SFTP-backed artifact store.
//!
//! Every call opens its own authenticated session, performs the single
//! operation, and releases the session on every exit path (the session is
//! dropped before the call returns, success or failure). No batching, retry,
//! or connection reuse: each artifact transfer is an independent round trip,
//! which dominates deployment latency for multi-artifact events.

use async_trait::async_trait;
use ssh2::Session;
use std::io::Write;
use std::net::TcpStream;
use std::path::Path;
use tracing::{debug, warn};

use gedsys_core::config::CepConfig;
use gedsys_core::store::{ArtifactStore, TransportError};

/// Artifact store writing into the CEP server's hot directories over SFTP,
/// authenticated by private key + passphrase.
pub struct SftpStore {
    config: CepConfig,
}

impl SftpStore {
    pub fn new(config: CepConfig) -> Self {
        Self { config }
    }
}

fn open_session(config: &CepConfig) -> Result<Session, TransportError> {
    if !config.private_key.exists() {
        return Err(TransportError::KeyFileNotFound {
            path: config.private_key.display().to_string(),
        });
    }

    let tcp = TcpStream::connect((config.hostname.as_str(), config.port))
        .map_err(|e| TransportError::Session(format!("connect {}: {e}", config.hostname)))?;
    let mut session =
        Session::new().map_err(|e| TransportError::Session(format!("session init: {e}")))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| TransportError::Session(format!("handshake: {e}")))?;
    session
        .userauth_pubkey_file(
            &config.username,
            None,
            &config.private_key,
            Some(&config.passphrase),
        )
        .map_err(|e| TransportError::Authentication(e.to_string()))?;
    if !session.authenticated() {
        return Err(TransportError::Authentication(format!(
            "key was rejected for user {}",
            config.username
        )));
    }
    Ok(session)
}

fn upload_blocking(config: &CepConfig, remote_path: &str, content: &str) -> Result<(), TransportError> {
    let session = open_session(config)?;
    let sftp = session
        .sftp()
        .map_err(|e| TransportError::Session(format!("sftp subsystem: {e}")))?;
    let mut file = sftp.create(Path::new(remote_path)).map_err(|e| {
        TransportError::Remote {
            path: remote_path.to_string(),
            cause: e.to_string(),
        }
    })?;
    file.write_all(content.as_bytes())
        .map_err(|e| TransportError::Remote {
            path: remote_path.to_string(),
            cause: e.to_string(),
        })?;
    debug!(remote_path = %remote_path, bytes = content.len(), "uploaded artifact");
    Ok(())
}

fn remove_blocking(config: &CepConfig, remote_path: &str) -> Result<(), TransportError> {
    let session = open_session(config)?;
    let sftp = session
        .sftp()
        .map_err(|e| TransportError::Session(format!("sftp subsystem: {e}")))?;
    sftp.unlink(Path::new(remote_path))
        .map_err(|e| TransportError::Remote {
            path: remote_path.to_string(),
            cause: e.to_string(),
        })?;
    debug!(remote_path = %remote_path, "removed artifact");
    Ok(())
}

#[async_trait]
impl ArtifactStore for SftpStore {
    async fn upload(&self, remote_path: &str, content: &str) -> Result<(), TransportError> {
        let config = self.config.clone();
        let remote_path = remote_path.to_string();
        let content = content.to_string();
        let result = tokio::task::spawn_blocking(move || {
            upload_blocking(&config, &remote_path, &content)
        })
        .await
        .map_err(|e| TransportError::Session(format!("upload task: {e}")))?;
        if let Err(e) = &result {
            warn!(cause = %e, "sftp upload failed");
        }
        result
    }

    async fn remove(&self, remote_path: &str) -> Result<(), TransportError> {
        let config = self.config.clone();
        let remote_path = remote_path.to_string();
        let result =
            tokio::task::spawn_blocking(move || remove_blocking(&config, &remote_path))
                .await
                .map_err(|e| TransportError::Session(format!("remove task: {e}")))?;
        if let Err(e) = &result {
            warn!(cause = %e, "sftp remove failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_missing_key() -> CepConfig {
        let json = serde_json::json!({
            "hostname": "127.0.0.1",
            "port": 2222,
            "username": "geosmartsys",
            "passphrase": "secret",
            "private key": "/nonexistent/id_rsa",
            "root url": "http://127.0.0.1:9763/endpoints",
            "home directory": "/cep",
            "stream subdir": "/streams",
            "receiver subdir": "/receivers",
            "plan subdir": "/plans",
            "publisher subdir": "/publishers"
        });
        serde_json::from_value(json).expect("parse config")
    }

    #[tokio::test]
    async fn missing_key_file_is_reported_not_raised() {
        let store = SftpStore::new(config_with_missing_key());
        let err = store.upload("/cep/streams/x.json", "{}").await.unwrap_err();
        assert!(matches!(err, TransportError::KeyFileNotFound { .. }));

        let err = store.remove("/cep/streams/x.json").await.unwrap_err();
        assert!(matches!(err, TransportError::KeyFileNotFound { .. }));
    }
}
