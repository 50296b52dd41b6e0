//! Bind planned tool parameters to a descriptor before execution.
//!
//! Planners are loose about argument shapes: a bare scalar for a one-argument
//! tool, arguments wrapped under the tool's name, numbers quoted as strings.
//! Binding normalizes these shapes, validates names, required parameters and
//! types, and fills declared defaults.

use serde_json::{Map, Number, Value};

use super::arguments::ToolArguments;
use super::descriptor::{ParamType, ToolDescriptor, ToolParameter};
use crate::error::ArcheError;

#[derive(Debug)]
enum BindError {
    /// Wrong set of argument names.
    Arity(String),
    /// Right names, unusable value.
    Value(String),
}

impl BindError {
    fn message(self) -> String {
        match self {
            Self::Arity(msg) | Self::Value(msg) => msg,
        }
    }
}

/// Normalize, validate and bind `raw` against `descriptor`.
///
/// When the argument names do not line up with the declared parameters, the
/// values are re-bound once positionally in declaration order.
pub fn bind_arguments(descriptor: &ToolDescriptor, raw: &Value) -> Result<ToolArguments, ArcheError> {
    let normalized = normalize_parameters(descriptor, raw);

    let first = match validate_arguments(descriptor, &normalized) {
        Ok(args) => return Ok(args),
        Err(BindError::Value(msg)) => return Err(ArcheError::tool(descriptor.name(), msg)),
        Err(BindError::Arity(msg)) => msg,
    };

    let Some(positional) = bind_positionally(descriptor, &normalized) else {
        return Err(ArcheError::tool(descriptor.name(), first));
    };
    tracing::debug!(tool = descriptor.name(), reason = %first, "retrying with positional binding");

    validate_arguments(descriptor, &positional)
        .map_err(|e| ArcheError::tool(descriptor.name(), e.message()))
}

/// Reshape a planned `parameter` value into an argument mapping.
///
/// * `""` and `null` mean no arguments.
/// * A mapping whose values include exactly one nested mapping, under a key
///   that is not a declared `object` parameter, is replaced by that mapping.
/// * A scalar or array binds to the first declared parameter.
pub fn normalize_parameters(descriptor: &ToolDescriptor, raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Null => Map::new(),
        Value::String(s) if s.trim().is_empty() => Map::new(),
        Value::Object(map) => {
            let mut nested = map.iter().filter_map(|(key, value)| match value {
                Value::Object(inner) => Some((key, inner)),
                _ => None,
            });
            match (nested.next(), nested.next()) {
                (Some((key, inner)), None) if !is_object_parameter(descriptor, key) => inner.clone(),
                _ => map.clone(),
            }
        }
        scalar => match descriptor.parameters().first() {
            Some(first) => {
                let mut map = Map::new();
                map.insert(first.name.clone(), scalar.clone());
                map
            }
            None => Map::new(),
        },
    }
}

fn is_object_parameter(descriptor: &ToolDescriptor, name: &str) -> bool {
    descriptor
        .parameter(name)
        .is_some_and(|p| p.param_type == ParamType::Object)
}

fn bind_positionally(descriptor: &ToolDescriptor, args: &Map<String, Value>) -> Option<Map<String, Value>> {
    if args.is_empty() || args.len() > descriptor.parameters().len() {
        return None;
    }
    Some(
        descriptor
            .parameters()
            .iter()
            .zip(args.values())
            .map(|(param, value)| (param.name.clone(), value.clone()))
            .collect(),
    )
}

fn validate_arguments(descriptor: &ToolDescriptor, args: &Map<String, Value>) -> Result<ToolArguments, BindError> {
    if let Some(unknown) = args.keys().find(|k| descriptor.parameter(k).is_none()) {
        return Err(BindError::Arity(format!("unexpected argument '{unknown}'")));
    }

    let mut bound = Map::new();
    for param in descriptor.parameters() {
        match args.get(&param.name) {
            Some(value) => {
                let value = coerce(param, value).map_err(BindError::Value)?;
                bound.insert(param.name.clone(), value);
            }
            None if param.required => {
                return Err(BindError::Arity(format!(
                    "missing required argument '{}'",
                    param.name
                )));
            }
            None => {
                if let Some(default) = &param.default {
                    bound.insert(param.name.clone(), default.clone());
                }
            }
        }
    }
    Ok(ToolArguments::new(bound))
}

fn coerce(param: &ToolParameter, value: &Value) -> Result<Value, String> {
    let coerced = match (param.param_type, value) {
        (ParamType::String, Value::String(_)) => Some(value.clone()),
        (ParamType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ParamType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (ParamType::Integer, Value::Number(n)) => integer_from_number(n),
        (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (ParamType::Number, Value::Number(_)) => Some(value.clone()),
        (ParamType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),

        (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },

        (ParamType::Enum, Value::String(s)) => {
            if param.options.iter().any(|o| o == s) {
                Some(value.clone())
            } else {
                return Err(format!(
                    "argument '{}' must be one of [{}], got '{s}'",
                    param.name,
                    param.options.join(", ")
                ));
            }
        }

        (ParamType::Array, Value::Array(_)) | (ParamType::Object, Value::Object(_)) => {
            Some(value.clone())
        }
        _ => None,
    };

    coerced.ok_or_else(|| {
        format!(
            "argument '{}' expected type '{}', got {}",
            param.name,
            param.param_type,
            json_type_name(value)
        )
    })
}

fn integer_from_number(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| Value::from(f as i64))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParameterSpec;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn gcd_descriptor() -> ToolDescriptor {
        ToolDescriptor::builder("gcd", "Greatest common divisor")
            .param(ParameterSpec::new("a").with_type_alias("int"))
            .param(ParameterSpec::new("b").with_type_alias("int"))
            .build()
            .unwrap()
    }

    #[test]
    fn binds_named_arguments() {
        let args = bind_arguments(&gcd_descriptor(), &json!({"a": 48, "b": 12})).unwrap();
        assert_eq!(args.to_value(), json!({"a": 48, "b": 12}));
    }

    #[test]
    fn coerces_numeric_strings() {
        let args = bind_arguments(&gcd_descriptor(), &json!({"a": "48", "b": 12.0})).unwrap();
        assert_eq!(args.get_i64("a").unwrap(), 48);
        assert_eq!(args.get_i64("b").unwrap(), 12);
    }

    #[test]
    fn flattens_arguments_nested_under_tool_name() {
        let args = bind_arguments(&gcd_descriptor(), &json!({"gcd": {"a": 9, "b": 6}})).unwrap();
        assert_eq!(args.to_value(), json!({"a": 9, "b": 6}));
    }

    #[test]
    fn flattens_single_nested_mapping_beside_sibling_keys() {
        let raw = json!({"args": {"a": 48, "b": 12}, "reason": "compute"});
        let args = bind_arguments(&gcd_descriptor(), &raw).unwrap();
        assert_eq!(args.to_value(), json!({"a": 48, "b": 12}));
    }

    #[test]
    fn two_nested_mappings_are_left_alone() {
        let raw = json!({"x": {"a": 1}, "y": {"b": 2}});
        assert_eq!(normalize_parameters(&gcd_descriptor(), &raw), raw.as_object().unwrap().clone());
    }

    #[test]
    fn declared_object_parameter_is_not_flattened() {
        let descriptor = ToolDescriptor::builder("configure", "Apply settings")
            .param(ParameterSpec::new("settings").with_type_alias("dict"))
            .build()
            .unwrap();
        let args = bind_arguments(&descriptor, &json!({"settings": {"debug": true}})).unwrap();
        assert_eq!(args.to_value(), json!({"settings": {"debug": true}}));
    }

    #[test]
    fn scalar_binds_to_first_parameter() {
        let descriptor = ToolDescriptor::builder("weather", "Weather for a city")
            .param(ParameterSpec::new("city"))
            .param(ParameterSpec::new("unit").default_value("celsius"))
            .build()
            .unwrap();
        let args = bind_arguments(&descriptor, &json!("New York")).unwrap();
        assert_eq!(args.to_value(), json!({"city": "New York", "unit": "celsius"}));
    }

    #[test]
    fn empty_parameter_means_no_arguments() {
        let descriptor = ToolDescriptor::builder("time", "Current time").build().unwrap();
        assert!(bind_arguments(&descriptor, &json!("")).unwrap().is_empty());
        assert!(bind_arguments(&descriptor, &Value::Null).unwrap().is_empty());
    }

    #[test]
    fn mismatched_names_rebind_positionally() {
        let args = bind_arguments(&gcd_descriptor(), &json!({"x": 48, "y": 12})).unwrap();
        assert_eq!(args.to_value(), json!({"a": 48, "b": 12}));
    }

    #[test]
    fn second_binding_failure_is_an_invocation_error() {
        let err = bind_arguments(&gcd_descriptor(), &json!({"x": 1, "y": 2, "z": 3})).unwrap_err();
        match err {
            ArcheError::ToolInvocation { tool_name, message } => {
                assert_eq!(tool_name, "gcd");
                assert!(message.contains("unexpected argument 'x'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn type_errors_are_not_retried() {
        let err = bind_arguments(&gcd_descriptor(), &json!({"a": "many", "b": 2})).unwrap_err();
        assert!(err.to_string().contains("expected type 'integer'"));
    }

    #[test]
    fn enum_values_must_be_listed() {
        let descriptor = ToolDescriptor::builder("convert", "Convert temperature")
            .param(
                ParameterSpec::new("unit")
                    .with_type(ParamType::Enum)
                    .options(["c", "f"]),
            )
            .build()
            .unwrap();
        assert!(bind_arguments(&descriptor, &json!({"unit": "c"})).is_ok());
        assert!(bind_arguments(&descriptor, &json!({"unit": "k"})).is_err());
    }
}
