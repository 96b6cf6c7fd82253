//! Domain models for GEDSys.
//!
//! Canonical definitions for the core entities:
//! - `GeographicEvent`: Immutable, validated event definition
//! - `StreamDefinition`: Typed event stream schema
//! - `DeploymentRecord` / `DeploymentReport`: Deployment bookkeeping

pub mod error;
pub mod event;
pub mod record;
pub mod stream;

// Re-export main types and errors
pub use error::{GedsysError, Result};
pub use event::{
    ComparisonOperator, Condition, ConditionValue, GeographicEvent, Granularity,
    TemporalProperties,
};
pub use record::{
    ArtifactKind, ArtifactOutcome, ArtifactStatus, DeploymentRecord, DeploymentReport,
};
pub use stream::{EngineType, StreamDefinition, StreamField};
