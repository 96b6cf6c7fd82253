//! Stream definition templating.

use crate::domain::stream::{EngineType, StreamDefinition, StreamField};

/// Build a stream definition for one phenomenon.
///
/// Metadata and correlation fields are fixed by the engine's observation
/// envelope; the payload carries the phenomenon plus the observation
/// coordinates.
pub fn render_stream(
    name: &str,
    phenomenon: &StreamField,
    version: &str,
    description: &str,
) -> StreamDefinition {
    StreamDefinition {
        name: name.to_string(),
        version: version.to_string(),
        nick_name: String::new(),
        description: description.to_string(),
        meta_data: vec![
            StreamField::new("observation_id", EngineType::Long),
            StreamField::new("result_time", EngineType::String),
            StreamField::new("symbol", EngineType::String),
        ],
        correlation_data: vec![StreamField::new("event_id", EngineType::String)],
        payload_data: vec![
            phenomenon.clone(),
            StreamField::new("x_coord", EngineType::Double),
            StreamField::new("y_coord", EngineType::Double),
        ],
    }
}
