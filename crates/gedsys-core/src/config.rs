//! Configuration loading.
//!
//! The on-disk layout mirrors the historical `config.json` (keys with
//! spaces included), loaded once at process start and passed down
//! explicitly — no global mutable state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::artifact::HttpCredentials;
use crate::domain::error::{GedsysError, Result};
use crate::domain::record::ArtifactKind;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GedsysConfig {
    #[serde(rename = "geosmart.sys")]
    pub system: SystemConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub cep: CepConfig,
    pub handler: HandlerConfig,
}

/// Connection and file layout of the CEP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CepConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub passphrase: String,

    #[serde(rename = "private key")]
    pub private_key: PathBuf,

    /// Base URL of the engine's HTTP receiver endpoints.
    #[serde(rename = "root url")]
    pub root_url: String,

    #[serde(rename = "home directory")]
    pub home_directory: String,

    #[serde(rename = "stream subdir")]
    pub stream_subdir: String,

    #[serde(rename = "receiver subdir")]
    pub receiver_subdir: String,

    #[serde(rename = "plan subdir")]
    pub plan_subdir: String,

    #[serde(rename = "publisher subdir")]
    pub publisher_subdir: String,

    /// Prefix for generated stream and plan names.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(rename = "http username", default = "default_http_username")]
    pub http_username: String,

    /// Pre-encrypted password string the engine expects in publisher
    /// definitions.
    #[serde(rename = "http password", default)]
    pub http_password: String,
}

fn default_namespace() -> String {
    "geosmart".to_string()
}

fn default_http_username() -> String {
    "admin".to_string()
}

/// Event handler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub logs: PathBuf,
}

impl GedsysConfig {
    /// Load and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GedsysError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| GedsysError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

impl CepConfig {
    /// Remote hot directory for one artifact category.
    pub fn remote_dir(&self, kind: ArtifactKind) -> String {
        let subdir = match kind {
            ArtifactKind::Stream => &self.stream_subdir,
            ArtifactKind::Receiver => &self.receiver_subdir,
            ArtifactKind::Plan => &self.plan_subdir,
            ArtifactKind::Publisher => &self.publisher_subdir,
        };
        format!("{}{}", self.home_directory, subdir)
    }

    /// Credentials for generated HTTP publishers.
    pub fn credentials(&self) -> HttpCredentials {
        HttpCredentials {
            username: self.http_username.clone(),
            encrypted_password: self.http_password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_config_json() -> String {
        serde_json::json!({
            "geosmart.sys": {
                "cep": {
                    "hostname": "cep.example.org",
                    "port": 22,
                    "username": "geosmartsys",
                    "passphrase": "secret",
                    "private key": "/home/geosmart/.ssh/id_rsa",
                    "root url": "http://cep.example.org:9763/endpoints",
                    "home directory": "/opt/wso2cep/repository/deployment/server",
                    "stream subdir": "/eventstreams",
                    "receiver subdir": "/eventreceivers",
                    "plan subdir": "/executionplans",
                    "publisher subdir": "/eventpublishers",
                    "http username": "admin",
                    "http password": "ENCRYPTED"
                },
                "handler": {
                    "logs": "/var/log/gedsys/handler.log"
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_config_parses_historical_layout() {
        let config: GedsysConfig =
            serde_json::from_str(&test_config_json()).expect("parse config");
        let cep = &config.system.cep;
        assert_eq!(cep.hostname, "cep.example.org");
        assert_eq!(cep.port, 22);
        assert_eq!(cep.namespace, "geosmart");
        assert_eq!(
            cep.remote_dir(ArtifactKind::Stream),
            "/opt/wso2cep/repository/deployment/server/eventstreams"
        );
        assert_eq!(
            cep.remote_dir(ArtifactKind::Publisher),
            "/opt/wso2cep/repository/deployment/server/eventpublishers"
        );
        assert_eq!(cep.credentials().username, "admin");
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let err = GedsysConfig::from_file(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, GedsysError::Config(_)));
    }
}
