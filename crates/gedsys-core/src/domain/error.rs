//! Domain-level error taxonomy for GEDSys.

use crate::store::TransportError;

/// GEDSys domain errors.
///
/// Validation variants reject bad input at construction time; nothing in the
/// templating or event-model layer silently substitutes a default.
#[derive(Debug, thiserror::Error)]
pub enum GedsysError {
    #[error("invalid event definition: {0}")]
    InvalidEventDefinition(String),

    #[error("invalid condition '{key}': {cause}")]
    InvalidCondition { key: String, cause: String },

    #[error("no engine type mapping for value of phenomenon '{phenomenon}': {value_type}")]
    UnsupportedValueType {
        phenomenon: String,
        value_type: String,
    },

    #[error("no condition references phenomenon: {0}")]
    PhenomenonNotFound(String),

    #[error("input and output streams must differ: both are {name}:{version}")]
    StreamIdentityConflict { name: String, version: String },

    #[error("publisher kind is not defined (kinds are case sensitive): {0}")]
    UnsupportedPublisherKind(String),

    #[error("publisher of kind 'http' requires a non-empty target URL")]
    MissingPublisherTarget,

    #[error("malformed observation payload: {0}")]
    MalformedObservation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for GEDSys domain operations.
pub type Result<T> = std::result::Result<T, GedsysError>;
