//! Structured observability hooks for the deployment lifecycle.
//!
//! Events are emitted at `info!` level; transfer failures at `warn!`.
//! Set `RUST_LOG` to filter.

use tracing::{info, warn};

use crate::domain::record::ArtifactKind;

/// RAII guard that enters an event-scoped tracing span for one deploy or
/// undeploy walk.
pub struct DeploySpan {
    _span: tracing::span::EnteredSpan,
}

impl DeploySpan {
    /// Create and enter a span tagged with the event id.
    pub fn enter(event_id: &str) -> Self {
        let span = tracing::info_span!("gedsys.deploy", event_id = %event_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: deploy walk started with the number of artifacts to upload.
pub fn emit_deploy_started(event_id: &str, artifacts: usize) {
    info!(event = "deploy.started", event_id = %event_id, artifacts = artifacts);
}

/// Emit event: one artifact uploaded.
pub fn emit_artifact_uploaded(kind: ArtifactKind, remote_path: &str) {
    info!(event = "artifact.uploaded", kind = %kind, remote_path = %remote_path);
}

/// Emit event: one artifact transfer failed (walk continues).
pub fn emit_artifact_failed(kind: ArtifactKind, remote_path: &str, cause: &dyn std::fmt::Display) {
    warn!(event = "artifact.failed", kind = %kind, remote_path = %remote_path, cause = %cause);
}

/// Emit event: one artifact removed during teardown.
pub fn emit_artifact_removed(kind: ArtifactKind, remote_path: &str) {
    info!(event = "artifact.removed", kind = %kind, remote_path = %remote_path);
}

/// Emit event: deploy walk finished with per-outcome counts.
pub fn emit_deploy_finished(event_id: &str, uploaded: usize, failed: usize) {
    info!(
        event = "deploy.finished",
        event_id = %event_id,
        uploaded = uploaded,
        failed = failed,
    );
}

/// Emit event: undeploy walk finished with per-outcome counts.
pub fn emit_undeploy_finished(event_id: &str, removed: usize, failed: usize) {
    info!(
        event = "undeploy.finished",
        event_id = %event_id,
        removed = removed,
        failed = failed,
    );
}

/// Emit event: one observation pushed to a receiver endpoint.
pub fn emit_observation_pushed(generator_id: &str, receiver: &str) {
    info!(event = "observation.pushed", generator_id = %generator_id, receiver = %receiver);
}
