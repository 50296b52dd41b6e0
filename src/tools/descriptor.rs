//! Tool descriptors: name, description, typed parameters and the schema
//! rendered for the model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{Display, EnumString};

use crate::error::ArcheError;

/// Canonical parameter types understood by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Enum,
    Array,
    Object,
}

impl ParamType {
    /// Normalize a loose type alias ("int", "str", "num", ...).
    ///
    /// Returns `None` for unrecognized aliases.
    pub fn from_alias(alias: &str) -> Option<Self> {
        let normalized = alias.trim().to_ascii_lowercase();
        let ty = match normalized.as_str() {
            "str" | "string" | "text" => Self::String,
            "int" | "integer" => Self::Integer,
            "num" | "number" | "float" | "double" => Self::Number,
            "bool" | "boolean" => Self::Boolean,
            "list" | "array" | "tuple" | "vec" => Self::Array,
            "dict" | "object" | "map" => Self::Object,
            "enum" | "choice" => Self::Enum,
            _ => return None,
        };
        Some(ty)
    }

    /// Infer a type from a default value.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
            Value::String(_) | Value::Null => Self::String,
        }
    }

    /// JSON-schema type name. Enums are string-valued.
    pub fn json_type(self) -> &'static str {
        match self {
            Self::String | Self::Enum => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Whether a tool produces a value for synthesis or only performs an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Value,
    Action,
}

#[derive(Debug, Clone)]
enum TypeTag {
    Canonical(ParamType),
    Alias(String),
}

/// Declaration of one parameter, resolved when the descriptor is built.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    type_tag: Option<TypeTag>,
    description: Option<String>,
    required: Option<bool>,
    default: Option<Value>,
    options: Option<Vec<String>>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: None,
            description: None,
            required: None,
            default: None,
            options: None,
        }
    }

    pub fn with_type(mut self, ty: ParamType) -> Self {
        self.type_tag = Some(TypeTag::Canonical(ty));
        self
    }

    /// Declare the type with a loose alias such as `"int"` or `"str"`.
    pub fn with_type_alias(mut self, alias: impl Into<String>) -> Self {
        self.type_tag = Some(TypeTag::Alias(alias.into()));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    fn resolve(self, tool_name: &str) -> Result<ToolParameter, ArcheError> {
        let param_type = match self.type_tag {
            Some(TypeTag::Canonical(ty)) => ty,
            Some(TypeTag::Alias(alias)) => ParamType::from_alias(&alias).unwrap_or_else(|| {
                tracing::warn!(
                    tool = tool_name,
                    parameter = %self.name,
                    alias = %alias,
                    "unknown parameter type, defaulting to string"
                );
                ParamType::String
            }),
            None => self
                .default
                .as_ref()
                .map(ParamType::infer)
                .unwrap_or(ParamType::String),
        };

        let options = match (param_type, self.options) {
            (ParamType::Enum, Some(options)) if !options.is_empty() => options,
            (ParamType::Enum, _) => {
                return Err(ArcheError::EnumOptionsMissing {
                    tool_name: tool_name.to_string(),
                    parameter: self.name,
                })
            }
            (_, options) => options.unwrap_or_default(),
        };

        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("No description provided for '{}'.", self.name));
        let required = self.required.unwrap_or(self.default.is_none());

        Ok(ToolParameter {
            name: self.name,
            param_type,
            description,
            required,
            default: self.default,
            options,
        })
    }
}

/// A resolved parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<String>,
}

impl ToolParameter {
    fn schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".into(), json!(self.param_type.json_type()));
        property.insert("description".into(), json!(self.description));
        if self.param_type == ParamType::Enum {
            property.insert("enum".into(), json!(self.options));
        }
        if let Some(default) = &self.default {
            property.insert("default".into(), default.clone());
        }
        Value::Object(property)
    }
}

/// Immutable description of a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    kind: ToolKind,
}

impl ToolDescriptor {
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            kind: ToolKind::Value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> &[ToolParameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Function schema shown to the model.
    pub fn schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

/// Builder returned by [`ToolDescriptor::builder`].
#[derive(Debug, Clone)]
pub struct ToolDescriptorBuilder {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    kind: ToolKind,
}

impl ToolDescriptorBuilder {
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Mark the tool as side-effecting.
    pub fn action(mut self) -> Self {
        self.kind = ToolKind::Action;
        self
    }

    pub fn kind(mut self, kind: ToolKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn build(self) -> Result<ToolDescriptor, ArcheError> {
        let mut seen = HashSet::new();
        let mut parameters = Vec::with_capacity(self.parameters.len());
        for spec in self.parameters {
            if !seen.insert(spec.name.clone()) {
                return Err(ArcheError::DuplicateParameter {
                    tool_name: self.name,
                    parameter: spec.name,
                });
            }
            parameters.push(spec.resolve(&self.name)?);
        }

        let description = if self.description.trim().is_empty() {
            format!("No description provided for '{}'.", self.name)
        } else {
            self.description
        };

        Ok(ToolDescriptor {
            name: self.name,
            description,
            parameters,
            kind: self.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn aliases_normalize_to_canonical_types() {
        assert_eq!(ParamType::from_alias("int"), Some(ParamType::Integer));
        assert_eq!(ParamType::from_alias("Str"), Some(ParamType::String));
        assert_eq!(ParamType::from_alias("num"), Some(ParamType::Number));
        assert_eq!(ParamType::from_alias("dict"), Some(ParamType::Object));
        assert_eq!(ParamType::from_alias("tuple"), Some(ParamType::Array));
        assert_eq!(ParamType::from_alias("decimal128"), None);
    }

    #[test]
    fn unknown_alias_falls_back_to_string() {
        let descriptor = ToolDescriptor::builder("lookup", "Look things up")
            .param(ParameterSpec::new("query").with_type_alias("blob"))
            .build()
            .unwrap();
        assert_eq!(descriptor.parameters()[0].param_type, ParamType::String);
    }

    #[test]
    fn type_is_inferred_from_default() {
        let descriptor = ToolDescriptor::builder("search", "Search the web")
            .param(ParameterSpec::new("query").with_type(ParamType::String))
            .param(ParameterSpec::new("limit").default_value(5))
            .param(ParameterSpec::new("safe").default_value(true))
            .build()
            .unwrap();

        let limit = descriptor.parameter("limit").unwrap();
        assert_eq!(limit.param_type, ParamType::Integer);
        assert!(!limit.required);
        assert_eq!(descriptor.parameter("safe").unwrap().param_type, ParamType::Boolean);
        assert!(descriptor.parameter("query").unwrap().required);
    }

    #[test]
    fn enum_without_options_is_rejected() {
        let err = ToolDescriptor::builder("units", "Convert units")
            .param(ParameterSpec::new("unit").with_type(ParamType::Enum))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ArcheError::EnumOptionsMissing { ref parameter, .. } if parameter == "unit"
        ));
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let err = ToolDescriptor::builder("add", "Add numbers")
            .param(ParameterSpec::new("a"))
            .param(ParameterSpec::new("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ArcheError::DuplicateParameter { .. }));
    }

    #[test]
    fn schema_has_function_shape() {
        let descriptor = ToolDescriptor::builder("weather", "Current weather")
            .param(
                ParameterSpec::new("city")
                    .with_type_alias("str")
                    .description("City name"),
            )
            .param(
                ParameterSpec::new("unit")
                    .with_type(ParamType::Enum)
                    .options(["celsius", "fahrenheit"])
                    .required(false),
            )
            .build()
            .unwrap();

        assert_eq!(
            descriptor.schema(),
            json!({
                "type": "function",
                "function": {
                    "name": "weather",
                    "description": "Current weather",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "city": {"type": "string", "description": "City name"},
                            "unit": {
                                "type": "string",
                                "description": "No description provided for 'unit'.",
                                "enum": ["celsius", "fahrenheit"]
                            }
                        },
                        "required": ["city"]
                    }
                }
            })
        );
    }
}
