//! GEDSys Core Library
//!
//! Domain model, artifact templating, and deployment orchestration for
//! bridging geographic event definitions into a CEP engine.

pub mod artifact;
pub mod config;
pub mod domain;
pub mod handler;
pub mod obs;
pub mod store;
pub mod telemetry;

pub use artifact::{
    cep_query, processor_schema, render_execution_plan, render_publisher, render_receiver,
    render_stream, HttpCredentials, PublisherKind,
};

pub use config::{CepConfig, GedsysConfig, HandlerConfig, SystemConfig};

pub use domain::{
    ArtifactKind, ArtifactOutcome, ArtifactStatus, ComparisonOperator, Condition, ConditionValue,
    DeploymentRecord, DeploymentReport, EngineType, GedsysError, GeographicEvent, Granularity,
    Result, StreamDefinition, StreamField, TemporalProperties,
};

pub use handler::{undeploy_record, ArtifactSet, EventHandler, STREAM_VERSION};

pub use obs::{
    emit_artifact_failed, emit_artifact_removed, emit_artifact_uploaded, emit_deploy_finished,
    emit_deploy_started, emit_observation_pushed, emit_undeploy_finished, DeploySpan,
};

pub use store::{ArtifactStore, TransportError};
pub use telemetry::init_tracing;

/// GEDSys version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
