//! Event handler: turns one geographic event into a fully deployed (or
//! fully torn down) set of CEP artifacts.
//!
//! The deploy walk is best-effort: a failed upload never aborts the
//! remaining uploads and never rolls back, but every outcome lands in the
//! [`DeploymentReport`] and the record's `deployed` flag is only set when
//! the whole walk succeeded. Undeploy mirrors this: every recorded path is
//! attempted, paths that fail to be removed stay in the record so a later
//! retry can finish the teardown.

use crate::artifact::{
    render_execution_plan, render_publisher, render_receiver, render_stream, PublisherKind,
};
use crate::config::CepConfig;
use crate::domain::error::Result;
use crate::domain::event::GeographicEvent;
use crate::domain::record::{
    ArtifactKind, ArtifactStatus, DeploymentRecord, DeploymentReport,
};
use crate::domain::stream::{StreamDefinition, StreamField};
use crate::obs::{
    emit_artifact_failed, emit_artifact_removed, emit_artifact_uploaded, emit_deploy_finished,
    emit_deploy_started, emit_undeploy_finished, DeploySpan,
};
use crate::store::ArtifactStore;

/// Version assigned to every generated stream.
pub const STREAM_VERSION: &str = "1.0.0";

/// The full artifact set generated for one event, before deployment.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub streams_in: Vec<StreamDefinition>,
    pub streams_out: Vec<StreamDefinition>,
    pub receivers: Vec<String>,
    pub plans: Vec<String>,
    pub publisher: String,
}

impl ArtifactSet {
    pub fn total(&self) -> usize {
        self.streams_in.len() + self.streams_out.len() + self.receivers.len() + self.plans.len() + 1
    }
}

/// Deployment orchestrator for one geographic event.
pub struct EventHandler {
    event: GeographicEvent,
    config: CepConfig,
    record: DeploymentRecord,
}

impl EventHandler {
    pub fn new(event: GeographicEvent, config: CepConfig) -> Self {
        let record = DeploymentRecord::new(event.id());
        Self {
            event,
            config,
            record,
        }
    }

    /// Rebuild a handler around a previously persisted record.
    pub fn with_record(event: GeographicEvent, config: CepConfig, record: DeploymentRecord) -> Self {
        Self {
            event,
            config,
            record,
        }
    }

    pub fn event(&self) -> &GeographicEvent {
        &self.event
    }

    pub fn record(&self) -> &DeploymentRecord {
        &self.record
    }

    /// URL of the receiver endpoint for the k-th phenomenon (1-based).
    pub fn receiver_endpoint(&self, index: usize) -> String {
        format!(
            "{}/httpReceiver{}{}",
            self.config.root_url,
            self.event.id(),
            index
        )
    }

    /// Render the full artifact set without touching the network.
    ///
    /// Per phenomenon (in event-model order): one input stream
    /// `<namespace>.stream.in.<eventId>_<k>` with its paired receiver
    /// (id `<eventId><k>`), one output stream
    /// `<namespace>.stream.out.<eventId>_<k>`, and one execution plan
    /// `<namespace>.plan.<eventId><k>` filtering the input into the output
    /// with the phenomenon's own condition. One shared `http` publisher
    /// sourced from the first output stream.
    pub fn build_artifacts(&self, publisher_target: &str) -> Result<ArtifactSet> {
        let namespace = &self.config.namespace;
        let event_id = self.event.id();
        let phenomena = self.event.phenomena_names();

        let mut streams_in = Vec::with_capacity(phenomena.len());
        let mut receivers = Vec::with_capacity(phenomena.len());
        for (k, phenomenon) in phenomena.iter().enumerate() {
            let k = k + 1;
            let field =
                StreamField::new(*phenomenon, self.event.phenomenon_engine_type(phenomenon)?);
            let stream_name = format!("{namespace}.stream.in.{event_id}_{k}");
            let stream = render_stream(&stream_name, &field, STREAM_VERSION, "");
            let receiver_id = format!("{event_id}{k}");
            receivers.push(render_receiver(&receiver_id, &stream.name, &stream.version));
            streams_in.push(stream);
        }

        let mut streams_out = Vec::with_capacity(phenomena.len());
        let mut plans = Vec::with_capacity(phenomena.len());
        for (k, phenomenon) in phenomena.iter().enumerate() {
            let k = k + 1;
            let field =
                StreamField::new(*phenomenon, self.event.phenomenon_engine_type(phenomenon)?);
            let stream_name = format!("{namespace}.stream.out.{event_id}_{k}");
            let stream_out = render_stream(&stream_name, &field, STREAM_VERSION, "");

            // Plans are paired with conditions by phenomenon name, not by
            // position in the conditions mapping.
            let condition = self.event.condition_for(phenomenon).ok_or_else(|| {
                crate::domain::error::GedsysError::PhenomenonNotFound(phenomenon.to_string())
            })?;
            let plan_name = format!("{namespace}.plan.{event_id}{k}");
            let plan = render_execution_plan(
                &plan_name,
                std::slice::from_ref(&streams_in[k - 1]),
                &stream_out,
                condition,
                "",
            )?;
            streams_out.push(stream_out);
            plans.push(plan);
        }

        let publisher = render_publisher(
            &format!("pub-{event_id}"),
            &streams_out[0].name,
            &streams_out[0].version,
            PublisherKind::Http,
            Some(publisher_target),
            &self.config.credentials(),
        )?;

        Ok(ArtifactSet {
            streams_in,
            streams_out,
            receivers,
            plans,
            publisher,
        })
    }

    /// Deploy the event's full artifact set.
    ///
    /// Upload order is fixed: input and output streams, then receivers,
    /// then plans, then the publisher. Each successful upload is recorded
    /// for later teardown; failures are reported but do not abort the walk.
    pub async fn deploy(
        &mut self,
        publisher_target: &str,
        store: &dyn ArtifactStore,
    ) -> Result<DeploymentReport> {
        let artifacts = self.build_artifacts(publisher_target)?;
        let _span = DeploySpan::enter(self.event.id());
        emit_deploy_started(self.event.id(), artifacts.total());
        let mut report = DeploymentReport::new(self.event.id());

        for stream in artifacts.streams_in.iter().chain(artifacts.streams_out.iter()) {
            let body = serde_json::to_string(stream)?;
            self.transfer(store, &mut report, ArtifactKind::Stream, &body)
                .await;
        }
        for receiver in &artifacts.receivers {
            self.transfer(store, &mut report, ArtifactKind::Receiver, receiver)
                .await;
        }
        for plan in &artifacts.plans {
            self.transfer(store, &mut report, ArtifactKind::Plan, plan)
                .await;
        }
        self.transfer(store, &mut report, ArtifactKind::Publisher, &artifacts.publisher)
            .await;

        self.record.deployed = report.fully_succeeded();
        report.finish();
        emit_deploy_finished(
            self.event.id(),
            report.succeeded_count(),
            report.failures().len(),
        );
        Ok(report)
    }

    async fn transfer(
        &mut self,
        store: &dyn ArtifactStore,
        report: &mut DeploymentReport,
        kind: ArtifactKind,
        body: &str,
    ) {
        let counter = self.record.next_counter();
        let file_name = format!(
            "{}-{}{}{}.{}",
            kind.prefix(),
            self.event.id(),
            kind.separator(),
            counter,
            kind.extension()
        );
        let remote_path = format!("{}/{}", self.config.remote_dir(kind), file_name);

        match store.upload(&remote_path, body).await {
            Ok(()) => {
                emit_artifact_uploaded(kind, &remote_path);
                self.record.record_upload(kind, remote_path.clone());
                report.push(kind, remote_path, ArtifactStatus::Uploaded);
            }
            Err(e) => {
                emit_artifact_failed(kind, &remote_path, &e);
                report.push(
                    kind,
                    remote_path,
                    ArtifactStatus::Failed {
                        cause: e.to_string(),
                    },
                );
            }
        }
    }

    /// Tear down everything this handler's record lists.
    pub async fn undeploy(&mut self, store: &dyn ArtifactStore) -> DeploymentReport {
        undeploy_record(&mut self.record, store).await
    }

    /// Consume the handler, yielding its record for persistence.
    pub fn into_record(self) -> DeploymentRecord {
        self.record
    }
}

/// Remove every path a deployment record lists, category by category
/// (streams, receivers, plans, publishers).
///
/// Best-effort: a failed removal is reported and its path retained in the
/// record; the walk continues. The record only resets (`deployed = false`,
/// counter back to zero) when the teardown was fully clean.
pub async fn undeploy_record(
    record: &mut DeploymentRecord,
    store: &dyn ArtifactStore,
) -> DeploymentReport {
    let _span = DeploySpan::enter(&record.event_id);
    let mut report = DeploymentReport::new(record.event_id.clone());

    for kind in [
        ArtifactKind::Stream,
        ArtifactKind::Receiver,
        ArtifactKind::Plan,
        ArtifactKind::Publisher,
    ] {
        let mut remaining = Vec::new();
        for path in record.take_paths(kind) {
            match store.remove(&path).await {
                Ok(()) => {
                    emit_artifact_removed(kind, &path);
                    report.push(kind, path, ArtifactStatus::Removed);
                }
                Err(e) => {
                    emit_artifact_failed(kind, &path, &e);
                    report.push(
                        kind,
                        path.clone(),
                        ArtifactStatus::Failed {
                            cause: e.to_string(),
                        },
                    );
                    remaining.push(path);
                }
            }
        }
        record.set_paths(kind, remaining);
    }

    if record.is_empty() {
        record.deployed = false;
        record.counter = 0;
    }
    report.finish();
    emit_undeploy_finished(
        &record.event_id,
        report.succeeded_count(),
        report.failures().len(),
    );
    report
}
