//! Typed event stream schemas for the CEP engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine attribute types supported by the stream mapper.
///
/// Serialized UPPERCASE in stream definition JSON; lower-cased when a stream
/// is flattened into a processor schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineType {
    Long,
    String,
    Double,
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineType::Long => "long",
            EngineType::String => "string",
            EngineType::Double => "double",
        };
        f.write_str(name)
    }
}

/// One named, typed attribute of a stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamField {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: EngineType,
}

impl StreamField {
    pub fn new(name: impl Into<String>, field_type: EngineType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A named, versioned event stream schema.
///
/// `name` + `version` is the stream's identity within the engine's
/// namespace. Instances are produced by the templating layer and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamDefinition {
    pub name: String,
    pub version: String,

    #[serde(rename = "nickName")]
    pub nick_name: String,

    pub description: String,

    #[serde(rename = "metaData")]
    pub meta_data: Vec<StreamField>,

    #[serde(rename = "correlationData")]
    pub correlation_data: Vec<StreamField>,

    #[serde(rename = "payloadData")]
    pub payload_data: Vec<StreamField>,
}

impl StreamDefinition {
    /// The `name:version` identity used by execution plan imports/exports.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    /// Name of the phenomenon field, by convention the first payload field.
    pub fn phenomenon_field(&self) -> Option<&StreamField> {
        self.payload_data.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_type_serde_uppercase() {
        assert_eq!(
            serde_json::to_string(&EngineType::Double).expect("serialize"),
            "\"DOUBLE\""
        );
        let parsed: EngineType = serde_json::from_str("\"LONG\"").expect("deserialize");
        assert_eq!(parsed, EngineType::Long);
    }

    #[test]
    fn test_engine_type_display_is_lowercase() {
        assert_eq!(EngineType::Long.to_string(), "long");
        assert_eq!(EngineType::String.to_string(), "string");
        assert_eq!(EngineType::Double.to_string(), "double");
    }

    #[test]
    fn test_stream_field_serde_uses_type_key() {
        let field = StreamField::new("x_coord", EngineType::Double);
        let json = serde_json::to_value(&field).expect("serialize");
        assert_eq!(json["name"], "x_coord");
        assert_eq!(json["type"], "DOUBLE");
    }

    #[test]
    fn test_stream_identity() {
        let stream = StreamDefinition {
            name: "geosmart.stream.in.abc_1".to_string(),
            version: "1.0.0".to_string(),
            nick_name: String::new(),
            description: String::new(),
            meta_data: vec![],
            correlation_data: vec![],
            payload_data: vec![StreamField::new("temperature", EngineType::Double)],
        };
        assert_eq!(stream.identity(), "geosmart.stream.in.abc_1:1.0.0");
        assert_eq!(
            stream.phenomenon_field().map(|f| f.name.as_str()),
            Some("temperature")
        );
    }
}
