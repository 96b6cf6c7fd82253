//! Deployment bookkeeping: what was uploaded where, and how each artifact
//! transfer went.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four CEP artifact categories, in their deployment order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Stream,
    Receiver,
    Plan,
    Publisher,
}

impl ArtifactKind {
    /// Remote filename prefix for this category.
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Stream => "stream",
            ArtifactKind::Receiver => "receiver",
            ArtifactKind::Plan => "plan",
            ArtifactKind::Publisher => "pub",
        }
    }

    /// Separator between the event id and the artifact counter.
    ///
    /// Receivers historically use `_` (drivers parse the receiver id back
    /// out of the filename); everything else uses `-`.
    pub fn separator(&self) -> char {
        match self {
            ArtifactKind::Receiver => '_',
            _ => '-',
        }
    }

    /// Remote file extension for this category.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Stream => "json",
            ArtifactKind::Receiver | ArtifactKind::Publisher => "xml",
            ArtifactKind::Plan => "siddhiql",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Outcome of one artifact transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ArtifactStatus {
    Uploaded,
    Removed,
    Failed { cause: String },
}

/// One artifact transfer, tagged with its category and remote path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactOutcome {
    pub kind: ArtifactKind,
    pub remote_path: String,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

/// Per-artifact report of one deploy or undeploy walk.
///
/// Partial failure is explicit here instead of being swallowed: the walk is
/// best-effort, but every failed transfer carries its cause and the overall
/// verdict is only a success when every transfer succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub event_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<ArtifactOutcome>,
}

impl DeploymentReport {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: ArtifactKind, remote_path: impl Into<String>, status: ArtifactStatus) {
        self.outcomes.push(ArtifactOutcome {
            kind,
            remote_path: remote_path.into(),
            status,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True when every transfer in the walk succeeded.
    pub fn fully_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| !matches!(o.status, ArtifactStatus::Failed { .. }))
    }

    /// The transfers that failed, with their causes.
    pub fn failures(&self) -> Vec<&ArtifactOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ArtifactStatus::Failed { .. }))
            .collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.len() - self.failures().len()
    }
}

/// Remote paths of successfully deployed artifacts, per category, plus the
/// shared counter used to keep generated filenames unique within one
/// deployment.
///
/// Owned exclusively by one orchestrator instance; serializable so a CLI
/// invocation can persist it between `deploy` and `undeploy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeploymentRecord {
    pub event_id: String,
    pub streams: Vec<String>,
    pub receivers: Vec<String>,
    pub plans: Vec<String>,
    pub publishers: Vec<String>,
    pub counter: u64,
    pub deployed: bool,
}

impl DeploymentRecord {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            ..Default::default()
        }
    }

    /// Next artifact counter value, advancing the shared counter.
    pub fn next_counter(&mut self) -> u64 {
        let n = self.counter;
        self.counter += 1;
        n
    }

    pub fn record_upload(&mut self, kind: ArtifactKind, remote_path: String) {
        self.paths_mut(kind).push(remote_path);
    }

    fn paths_mut(&mut self, kind: ArtifactKind) -> &mut Vec<String> {
        match kind {
            ArtifactKind::Stream => &mut self.streams,
            ArtifactKind::Receiver => &mut self.receivers,
            ArtifactKind::Plan => &mut self.plans,
            ArtifactKind::Publisher => &mut self.publishers,
        }
    }

    /// Take all recorded paths for one category, leaving it empty.
    pub fn take_paths(&mut self, kind: ArtifactKind) -> Vec<String> {
        std::mem::take(self.paths_mut(kind))
    }

    /// Replace the recorded paths for one category.
    pub fn set_paths(&mut self, kind: ArtifactKind, paths: Vec<String>) {
        *self.paths_mut(kind) = paths;
    }

    /// Recorded paths for one category.
    pub fn paths(&self, kind: ArtifactKind) -> &[String] {
        match kind {
            ArtifactKind::Stream => &self.streams,
            ArtifactKind::Receiver => &self.receivers,
            ArtifactKind::Plan => &self.plans,
            ArtifactKind::Publisher => &self.publishers,
        }
    }

    /// True when no artifact path remains recorded.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
            && self.receivers.is_empty()
            && self.plans.is_empty()
            && self.publishers.is_empty()
    }

    pub fn total_artifacts(&self) -> usize {
        self.streams.len() + self.receivers.len() + self.plans.len() + self.publishers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_kind_naming() {
        assert_eq!(ArtifactKind::Stream.prefix(), "stream");
        assert_eq!(ArtifactKind::Stream.extension(), "json");
        assert_eq!(ArtifactKind::Stream.separator(), '-');
        assert_eq!(ArtifactKind::Receiver.separator(), '_');
        assert_eq!(ArtifactKind::Plan.extension(), "siddhiql");
        assert_eq!(ArtifactKind::Publisher.prefix(), "pub");
        assert_eq!(ArtifactKind::Publisher.extension(), "xml");
    }

    #[test]
    fn test_record_counter_is_monotonic() {
        let mut record = DeploymentRecord::new("abc");
        assert_eq!(record.next_counter(), 0);
        assert_eq!(record.next_counter(), 1);
        assert_eq!(record.next_counter(), 2);
        assert_eq!(record.counter, 3);
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let mut record = DeploymentRecord::new("abc123");
        record.record_upload(ArtifactKind::Stream, "/cep/streams/stream-abc123-0.json".into());
        record.record_upload(ArtifactKind::Receiver, "/cep/receivers/receiver-abc123_1.xml".into());
        record.deployed = true;

        let json = serde_json::to_string(&record).expect("serialize");
        let parsed: DeploymentRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(record, parsed);
    }

    #[test]
    fn test_report_verdicts() {
        let mut report = DeploymentReport::new("abc");
        report.push(ArtifactKind::Stream, "/a", ArtifactStatus::Uploaded);
        assert!(report.fully_succeeded());

        report.push(
            ArtifactKind::Plan,
            "/b",
            ArtifactStatus::Failed {
                cause: "authentication failed".to_string(),
            },
        );
        assert!(!report.fully_succeeded());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.succeeded_count(), 1);
    }
}
