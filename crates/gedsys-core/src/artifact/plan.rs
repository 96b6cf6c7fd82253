//! Execution plan templating: processor schemas and filter queries.

use crate::domain::error::{GedsysError, Result};
use crate::domain::event::Condition;
use crate::domain::stream::StreamDefinition;

/// Flatten a stream definition into the event processor's schema grammar.
///
/// Metadata fields are prefixed `meta_`, correlation fields `correlation_`,
/// payload fields are unprefixed; engine types are lower-cased. Output is
/// `(f1 t1, f2 t2, ..., fn tn)` with no trailing comma or space.
pub fn processor_schema(stream: &StreamDefinition) -> String {
    let mut fields = Vec::with_capacity(
        stream.meta_data.len() + stream.correlation_data.len() + stream.payload_data.len(),
    );
    for field in &stream.meta_data {
        fields.push(format!("meta_{} {}", field.name, field.field_type));
    }
    for field in &stream.correlation_data {
        fields.push(format!("correlation_{} {}", field.name, field.field_type));
    }
    for field in &stream.payload_data {
        fields.push(format!("{} {}", field.name, field.field_type));
    }
    format!("({})", fields.join(", "))
}

/// Compile one condition into a filter query over aliased streams.
///
/// Fixed grammar: `from <in> [<field> <op> <value>] select * insert into <out>`.
pub fn cep_query(condition: &Condition, in_alias: &str, out_alias: &str) -> String {
    format!(
        "from {in_alias} [{} {} {}] select * insert into {out_alias}",
        condition.phenomenon, condition.operator, condition.value
    )
}

/// Render a complete execution plan in the engine's query language.
///
/// Declares one aliased input per stream (`input_<k>`, 1-based) and one
/// output (`output_1`), then the compiled filter query as the final line.
/// Fails when any input stream's identity equals the output's.
pub fn render_execution_plan(
    name: &str,
    input_streams: &[StreamDefinition],
    output_stream: &StreamDefinition,
    condition: &Condition,
    description: &str,
) -> Result<String> {
    for stream in input_streams {
        if stream.identity() == output_stream.identity() {
            return Err(GedsysError::StreamIdentityConflict {
                name: stream.name.clone(),
                version: stream.version.clone(),
            });
        }
    }

    let description = if description.is_empty() {
        name
    } else {
        description
    };

    let mut plan = String::new();
    plan.push_str(&format!("@Plan:name('{name}')\n"));
    plan.push_str(&format!("-- @Plan:description('{description}')\n\n"));

    let mut input_aliases = Vec::with_capacity(input_streams.len());
    for (k, stream) in input_streams.iter().enumerate() {
        let alias = format!("input_{}", k + 1);
        plan.push_str(&format!(
            "@Import('{}') define stream {} {};\n",
            stream.identity(),
            alias,
            processor_schema(stream)
        ));
        input_aliases.push(alias);
    }

    let output_alias = "output_1";
    plan.push_str(&format!(
        "@Export('{}') define stream {} {};\n\n",
        output_stream.identity(),
        output_alias,
        processor_schema(output_stream)
    ));

    plan.push_str(&cep_query(condition, &input_aliases[0], output_alias));
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{ComparisonOperator, ConditionValue};
    use crate::domain::stream::{EngineType, StreamField};

    fn condition(phenomenon: &str, operator: ComparisonOperator, value: ConditionValue) -> Condition {
        Condition {
            key: "c1".to_string(),
            phenomenon: phenomenon.to_string(),
            operator,
            value,
        }
    }

    fn stream(name: &str, phenomenon: &str) -> StreamDefinition {
        crate::artifact::render_stream(
            name,
            &StreamField::new(phenomenon, EngineType::Double),
            "1.0.0",
            "",
        )
    }

    #[test]
    fn test_processor_schema_canonical_stream() {
        let canonical = StreamDefinition {
            name: "geosmart.remote.test100".to_string(),
            version: "1.0.0".to_string(),
            nick_name: "streamTest".to_string(),
            description: "stream test".to_string(),
            meta_data: vec![
                StreamField::new("observation_id", EngineType::Long),
                StreamField::new("result_time", EngineType::String),
                StreamField::new("symbol", EngineType::String),
            ],
            correlation_data: vec![StreamField::new("generator_id", EngineType::String)],
            payload_data: vec![
                StreamField::new("temperature", EngineType::Double),
                StreamField::new("x_coord", EngineType::Double),
                StreamField::new("y_coord", EngineType::Double),
            ],
        };
        assert_eq!(
            processor_schema(&canonical),
            "(meta_observation_id long, meta_result_time string, meta_symbol string, \
             correlation_generator_id string, temperature double, x_coord double, \
             y_coord double)"
        );
    }

    #[test]
    fn test_cep_query_literal_value() {
        let c = condition(
            "Temperature",
            ComparisonOperator::Eq,
            ConditionValue::Number(-1000.0),
        );
        assert_eq!(
            cep_query(&c, "inputs", "outputs"),
            "from inputs [Temperature = -1000] select * insert into outputs"
        );
    }

    #[test]
    fn test_plan_final_line_is_the_query() {
        let c = condition(
            "temperature",
            ComparisonOperator::Gt,
            ConditionValue::Number(20.0),
        );
        let input = stream("geosmart.stream.in.abc_1", "temperature");
        let output = stream("geosmart.stream.out.abc_1", "temperature");

        let plan =
            render_execution_plan("geosmart.plan.abc1", &[input], &output, &c, "").expect("plan");
        assert_eq!(
            plan.lines().last().expect("non-empty plan"),
            "from input_1 [temperature > 20] select * insert into output_1"
        );
    }

    #[test]
    fn test_plan_embeds_aliases_and_identities() {
        let c = condition(
            "temperature",
            ComparisonOperator::Gt,
            ConditionValue::Number(20.0),
        );
        let input = stream("geosmart.stream.in.abc_1", "temperature");
        let output = stream("geosmart.stream.out.abc_1", "temperature");

        let plan = render_execution_plan("geosmart.plan.abc1", &[input], &output, &c, "")
            .expect("plan");
        assert!(plan.contains("@Plan:name('geosmart.plan.abc1')"));
        assert!(plan.contains("@Import('geosmart.stream.in.abc_1:1.0.0') define stream input_1 ("));
        assert!(plan.contains("@Export('geosmart.stream.out.abc_1:1.0.0') define stream output_1 ("));
    }

    #[test]
    fn test_plan_rejects_identical_input_and_output() {
        let c = condition(
            "temperature",
            ComparisonOperator::Gt,
            ConditionValue::Number(20.0),
        );
        let input = stream("geosmart.stream.in.abc_1", "temperature");
        let output = input.clone();

        let err = render_execution_plan("p", &[input], &output, &c, "").unwrap_err();
        assert!(matches!(err, GedsysError::StreamIdentityConflict { .. }));
    }

    #[test]
    fn test_plan_description_defaults_to_name() {
        let c = condition(
            "temperature",
            ComparisonOperator::Gt,
            ConditionValue::Number(20.0),
        );
        let input = stream("geosmart.stream.in.abc_1", "temperature");
        let output = stream("geosmart.stream.out.abc_1", "temperature");

        let plan = render_execution_plan("plan.x", &[input], &output, &c, "").expect("plan");
        assert!(plan.contains("-- @Plan:description('plan.x')"));
    }
}
