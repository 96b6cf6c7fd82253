//! Geographic event model.
//!
//! A `GeographicEvent` is the validated, immutable view of a user-supplied
//! JSON event definition: a spatial extent, a temporal window, and a set of
//! attributive conditions over observed phenomena. Everything the deployment
//! orchestrator needs is derived from here.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::error::{GedsysError, Result};
use crate::domain::stream::EngineType;

/// Comparison operators accepted in event conditions.
///
/// This is a closed set; any other operator string is rejected when the
/// definition is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            ">" => Ok(ComparisonOperator::Gt),
            "<" => Ok(ComparisonOperator::Lt),
            ">=" => Ok(ComparisonOperator::Ge),
            "<=" => Ok(ComparisonOperator::Le),
            "=" => Ok(ComparisonOperator::Eq),
            "!=" => Ok(ComparisonOperator::Ne),
            other => Err(format!("unsupported comparison operator: {other}")),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
        };
        f.write_str(symbol)
    }
}

/// Threshold value of a condition.
///
/// Only numeric and textual thresholds have an engine type mapping; anything
/// else fails event construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
}

impl ConditionValue {
    /// Engine type inferred from the sampled threshold value.
    pub fn engine_type(&self) -> EngineType {
        match self {
            ConditionValue::Number(_) => EngineType::Double,
            ConditionValue::Text(_) => EngineType::String,
        }
    }

    fn from_json(phenomenon: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => {
                let v = n.as_f64().ok_or_else(|| GedsysError::UnsupportedValueType {
                    phenomenon: phenomenon.to_string(),
                    value_type: "number out of range".to_string(),
                })?;
                Ok(ConditionValue::Number(v))
            }
            Value::String(s) => Ok(ConditionValue::Text(s.clone())),
            other => Err(GedsysError::UnsupportedValueType {
                phenomenon: phenomenon.to_string(),
                value_type: json_type_name(other).to_string(),
            }),
        }
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral thresholds print without a fractional part so the
            // compiled filter reads `temperature > 20`, not `> 20.0`.
            ConditionValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{}", *n as i64)
            }
            ConditionValue::Number(n) => write!(f, "{n}"),
            ConditionValue::Text(s) => write!(f, "'{s}'"),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One attributive condition: `<phenomenon> <operator> <value>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Key of this condition within the definition's conditions mapping.
    pub key: String,
    pub phenomenon: String,
    pub operator: ComparisonOperator,
    pub value: ConditionValue,
}

impl Condition {
    /// Parse one `key: [phenomenon, operator, value]` entry.
    fn from_entry(key: &str, entry: &Value) -> Result<Self> {
        let invalid = |cause: &str| GedsysError::InvalidCondition {
            key: key.to_string(),
            cause: cause.to_string(),
        };

        let triple = entry
            .as_array()
            .ok_or_else(|| invalid("expected a [phenomenon, operator, value] triple"))?;
        if triple.len() != 3 {
            return Err(invalid("expected exactly three elements"));
        }

        let phenomenon = triple[0]
            .as_str()
            .ok_or_else(|| invalid("phenomenon name must be a string"))?;
        let operator = triple[1]
            .as_str()
            .ok_or_else(|| invalid("operator must be a string"))?;
        let operator =
            ComparisonOperator::from_str(operator).map_err(|cause| GedsysError::InvalidCondition {
                key: key.to_string(),
                cause,
            })?;
        let value = ConditionValue::from_json(phenomenon, &triple[2])?;

        Ok(Condition {
            key: key.to_string(),
            phenomenon: phenomenon.to_string(),
            operator,
            value,
        })
    }
}

/// Spatial granularity of the detection extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Granularity {
    pub distance: f64,
    pub units: String,
}

/// Temporal properties of an event definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalProperties {
    pub kind: String,
    pub time: String,
    pub validity: String,
}

/// A geographic event: spatial extent + temporal window + attributive
/// conditions, parsed once from a JSON definition and immutable afterwards.
#[derive(Debug, Clone)]
pub struct GeographicEvent {
    id: String,
    pub name: String,
    pub update_frequency: u64,
    /// One or more polygon geometries in Well-Known Text.
    pub extent: Vec<String>,
    pub granularity: Granularity,
    pub topology: String,
    pub temporal: TemporalProperties,
    conditions: Vec<Condition>,
}

impl GeographicEvent {
    /// Parse and validate a JSON event definition.
    ///
    /// Fails when the required `properties.spatial` / `.temporal` /
    /// `.attributive` sections are absent, when the update frequency is
    /// missing or not an integer, when a condition is malformed, or when a
    /// threshold value has no engine type mapping. Nothing is silently
    /// defaulted.
    pub fn from_value(definition: &Value) -> Result<Self> {
        let missing =
            |section: &str| GedsysError::InvalidEventDefinition(format!("missing {section}"));

        let name = definition
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("event name"))?;
        let update_frequency = definition
            .get("update frequency")
            .ok_or_else(|| missing("'update frequency'"))?
            .as_u64()
            .ok_or_else(|| {
                GedsysError::InvalidEventDefinition(
                    "'update frequency' must be a non-negative integer of milliseconds"
                        .to_string(),
                )
            })?;

        let properties = definition
            .get("properties")
            .ok_or_else(|| missing("'properties' section"))?;
        let spatial = properties
            .get("spatial")
            .ok_or_else(|| missing("'properties.spatial' section"))?;
        let temporal = properties
            .get("temporal")
            .ok_or_else(|| missing("'properties.temporal' section"))?;
        let attributive = properties
            .get("attributive")
            .ok_or_else(|| missing("'properties.attributive' section"))?;

        let extent: Vec<String> = match spatial.get("extent") {
            Some(Value::String(wkt)) => vec![wkt.clone()],
            Some(Value::Array(polygons)) => polygons
                .iter()
                .map(|p| {
                    p.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| missing("WKT string in 'spatial.extent'"))
                })
                .collect::<Result<_>>()?,
            _ => return Err(missing("'spatial.extent'")),
        };
        if extent.is_empty() {
            return Err(GedsysError::InvalidEventDefinition(
                "'spatial.extent' must list at least one polygon".to_string(),
            ));
        }

        let granularity = spatial
            .get("granularity")
            .ok_or_else(|| missing("'spatial.granularity'"))?;
        let granularity = Granularity {
            distance: granularity
                .get("distance")
                .and_then(Value::as_f64)
                .ok_or_else(|| missing("'granularity.distance'"))?,
            units: granularity
                .get("units")
                .and_then(Value::as_str)
                .ok_or_else(|| missing("'granularity.units'"))?
                .to_string(),
        };
        let topology = spatial
            .get("topology")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("'spatial.topology'"))?
            .to_string();

        let temporal = TemporalProperties {
            kind: field_as_string(temporal, "type").ok_or_else(|| missing("'temporal.type'"))?,
            time: field_as_string(temporal, "time").ok_or_else(|| missing("'temporal.time'"))?,
            validity: field_as_string(temporal, "validity")
                .ok_or_else(|| missing("'temporal.validity'"))?,
        };

        let condition_map = attributive
            .get("conditions")
            .and_then(Value::as_object)
            .ok_or_else(|| missing("'attributive.conditions' mapping"))?;
        if condition_map.is_empty() {
            return Err(GedsysError::InvalidEventDefinition(
                "'attributive.conditions' must not be empty".to_string(),
            ));
        }
        // serde_json is built with preserve_order, so this walk sees the
        // conditions in their definition-file insertion order.
        let conditions = condition_map
            .iter()
            .map(|(key, entry)| Condition::from_entry(key, entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(GeographicEvent {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            update_frequency,
            extent,
            granularity,
            topology,
            temporal,
            conditions,
        })
    }

    /// Parse a definition from JSON text.
    pub fn from_json(definition: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(definition)?;
        Self::from_value(&value)
    }

    /// Process-unique identifier assigned at construction (hex, no hyphens).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Conditions in definition-file insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Distinct phenomenon names referenced across all conditions, in
    /// insertion order, deduplicated.
    pub fn phenomena_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for condition in &self.conditions {
            if !names.contains(&condition.phenomenon.as_str()) {
                names.push(&condition.phenomenon);
            }
        }
        names
    }

    /// First condition referencing `phenomenon`, if any.
    pub fn condition_for(&self, phenomenon: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.phenomenon == phenomenon)
    }

    /// Engine type inferred for `phenomenon` from its condition's threshold.
    ///
    /// A phenomenon referenced by no condition is a hard error, never a
    /// silent placeholder.
    pub fn phenomenon_engine_type(&self, phenomenon: &str) -> Result<EngineType> {
        self.condition_for(phenomenon)
            .map(|c| c.value.engine_type())
            .ok_or_else(|| GedsysError::PhenomenonNotFound(phenomenon.to_string()))
    }
}

fn field_as_string(value: &Value, key: &str) -> Option<String> {
    value.get(key).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
