//! Parameter specs and argument validation.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::ToolError;

/// JSON type a parameter must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            // Models often send whole numbers as floats.
            ParamType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0)
            }
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }
}

/// One declared tool parameter.
///
/// Parameters are required unless [`optional`](Self::optional) is called.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Allowed values for string parameters; empty means any.
    pub allowed: Vec<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            required: true,
            minimum: None,
            maximum: None,
            allowed: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    fn check(&self, value: &Value) -> Result<(), ToolError> {
        if !self.kind.accepts(value) {
            return Err(ToolError::InvalidArguments(format!(
                "'{}' must be of type {}, got {}",
                self.name,
                self.kind.label(),
                value
            )));
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.minimum.filter(|&min| n < min) {
                return Err(ToolError::InvalidArguments(format!(
                    "'{}' must be >= {}, got {}",
                    self.name, min, value
                )));
            }
            if let Some(max) = self.maximum.filter(|&max| n > max) {
                return Err(ToolError::InvalidArguments(format!(
                    "'{}' must be <= {}, got {}",
                    self.name, max, value
                )));
            }
        }

        if let (Some(s), false) = (value.as_str(), self.allowed.is_empty()) {
            if !self.allowed.iter().any(|a| a == s) {
                return Err(ToolError::InvalidArguments(format!(
                    "'{}' must be one of {:?}, got '{}'",
                    self.name, self.allowed, s
                )));
            }
        }

        Ok(())
    }

    fn to_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.kind));
        if !self.description.is_empty() {
            schema.insert("description".into(), json!(self.description));
        }
        if let Some(min) = self.minimum {
            schema.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.maximum {
            schema.insert("maximum".into(), json!(max));
        }
        if !self.allowed.is_empty() {
            schema.insert("enum".into(), json!(self.allowed));
        }
        Value::Object(schema)
    }
}

/// Renders parameter specs as a JSON-schema object.
pub(crate) fn params_to_schema(params: &[ParamSpec]) -> Value {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.name.clone(), p.to_schema()))
        .collect();
    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Checks call arguments against the declared parameters.
///
/// `null` counts as an empty object. Keys without a declared parameter are
/// ignored; a `null` value counts as absent.
pub fn validate_arguments(params: &[ParamSpec], args: &Value) -> Result<(), ToolError> {
    let empty = Map::new();
    let object = match args {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(ToolError::InvalidArguments(format!(
                "arguments must be a JSON object, got {}",
                other
            )))
        }
    };

    for param in params {
        match object.get(&param.name) {
            None | Some(Value::Null) if param.required => {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required parameter '{}'",
                    param.name
                )));
            }
            None | Some(Value::Null) => continue,
            Some(value) => param.check(value)?,
        }
    }

    Ok(())
}
