// aicommit-core/src/tools/definition.rs

use super::ToolResult;
use crate::errors::AdapterError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Represents the type of a tool parameter.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    Boolean,
    Integer,
}

impl ToolParameterType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ToolParameterType::Boolean => value.is_boolean(),
            ToolParameterType::Integer => value.as_u64().is_some(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            ToolParameterType::Boolean => "a boolean",
            ToolParameterType::Integer => "a non-negative integer",
        }
    }
}

/// Defines a single parameter within a tool's schema.
#[derive(Serialize, Debug, Clone)]
pub struct ToolParameter {
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: String,
    pub default: Value,
}

impl ToolParameter {
    pub fn boolean(description: &str, default: bool) -> Self {
        Self {
            param_type: ToolParameterType::Boolean,
            description: description.to_string(),
            default: Value::Bool(default),
        }
    }

    pub fn integer(description: &str, default: u64) -> Self {
        Self {
            param_type: ToolParameterType::Integer,
            description: description.to_string(),
            default: Value::from(default),
        }
    }
}

/// Defines the parameters structure for a tool. Every parameter has a
/// default, so `required` is always empty.
#[derive(Serialize, Debug, Clone)]
pub struct ToolParametersDefinition {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: BTreeMap<String, ToolParameter>,
    pub required: Vec<String>,
}

impl ToolParametersDefinition {
    pub fn new(properties: Vec<(&str, ToolParameter)>) -> Self {
        Self {
            param_type: "object".to_string(),
            properties: properties
                .into_iter()
                .map(|(name, param)| (name.to_string(), param))
                .collect(),
            required: Vec::new(),
        }
    }

    /// Merges caller arguments over the defaults and type-checks the result.
    /// Arguments the schema does not know about are dropped; `null` counts
    /// as not supplied.
    pub fn validate(&self, mut supplied: Map<String, Value>) -> Result<ToolArgs, AdapterError> {
        let mut values = Map::new();
        for (name, param) in &self.properties {
            let value = match supplied.remove(name) {
                None | Some(Value::Null) => param.default.clone(),
                Some(value) => value,
            };
            if !param.param_type.accepts(&value) {
                return Err(AdapterError::invalid_params(format!(
                    "'{}' must be {}, got {}",
                    name,
                    param.param_type.label(),
                    value
                )));
            }
            values.insert(name.clone(), value);
        }
        if !supplied.is_empty() {
            debug!(ignored = ?supplied.keys().collect::<Vec<_>>(), "Ignoring unknown tool arguments");
        }
        Ok(ToolArgs { values })
    }
}

/// Arguments after defaults have been applied and types checked.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn bool(&self, name: &str) -> Result<bool, AdapterError> {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| AdapterError::invalid_params(format!("Missing boolean argument: {}", name)))
    }

    pub fn u64(&self, name: &str) -> Result<u64, AdapterError> {
        self.values
            .get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| AdapterError::invalid_params(format!("Missing integer argument: {}", name)))
    }
}

/// The function implementing one tool's behavior.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ToolArgs) -> Result<ToolResult, AdapterError>;
}

/// A named, schema-described tool and the handler behind it.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParametersDefinition,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    /// JSON-Schema object describing the tool's input.
    pub fn input_schema(&self) -> Map<String, Value> {
        match serde_json::to_value(&self.parameters) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
