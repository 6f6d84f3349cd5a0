/// Tool Descriptors and Argument Validation
///
/// A `ToolDescriptor` is the static, serializable half of a tool: its name,
/// description and an ordered list of `ParameterSpec`s. The dispatcher validates
/// every inbound argument map against the descriptor before any handler runs and
/// hands the handler a typed `Arguments` map instead of raw JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::error::ValidationError;

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
}

impl ParameterKind {
    /// JSON Schema type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }

    /// Type name with its indefinite article, for error messages.
    pub fn with_article(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Object => "an object",
        }
    }

    /// Convert a JSON value to this kind.
    ///
    /// Numbers and booleans also accept their string spelling, since command-line
    /// clients send every positional argument as a string.
    pub fn coerce(&self, value: &Value) -> Option<ArgValue> {
        match (self, value) {
            (Self::String, Value::String(s)) => Some(ArgValue::String(s.clone())),
            (Self::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral))
                .map(ArgValue::Integer),
            (Self::Integer, Value::String(s)) => s.trim().parse().ok().map(ArgValue::Integer),
            (Self::Number, Value::Number(n)) => n.as_f64().map(ArgValue::Number),
            (Self::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(ArgValue::Number),
            (Self::Boolean, Value::Bool(b)) => Some(ArgValue::Boolean(*b)),
            (Self::Boolean, Value::String(s)) => match s.trim() {
                "true" => Some(ArgValue::Boolean(true)),
                "false" => Some(ArgValue::Boolean(false)),
                _ => None,
            },
            (Self::Object, Value::Object(map)) => Some(ArgValue::Object(map.clone())),
            _ => None,
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub required: bool,
    pub description: String,
    /// Alternative argument names accepted on input. Not advertised.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, kind: ParameterKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
            aliases: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Integer, description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Number, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Boolean, description)
    }

    pub fn object(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Object, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// First non-null value supplied under the name or one of its aliases.
    fn lookup<'a>(&self, raw: &'a Map<String, Value>) -> Option<&'a Value> {
        std::iter::once(&self.name)
            .chain(&self.aliases)
            .filter_map(|name| raw.get(name))
            .find(|v| !v.is_null())
    }
}

/// Static metadata for one tool. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// JSON Schema for the tool's input, as advertised by `tools/list`.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.kind.as_str(),
                        "description": p.description,
                    }),
                )
            })
            .collect();

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate a raw argument map against the declared parameters.
    ///
    /// Required parameters must be present, non-null and convertible to their
    /// kind. Optional parameters are checked only when supplied. Values given
    /// under an alias are stored under the canonical name. Arguments the
    /// descriptor does not declare are dropped.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<Arguments, ValidationError> {
        let mut values = BTreeMap::new();

        for param in &self.parameters {
            let supplied = param.lookup(raw);

            match (supplied, param.required) {
                (None, true) => {
                    return Err(ValidationError::Required {
                        name: param.name.clone(),
                        kind: param.kind,
                    });
                }
                (None, false) => {}
                (Some(value), required) => match param.kind.coerce(value) {
                    Some(arg) => {
                        values.insert(param.name.clone(), arg);
                    }
                    None if required => {
                        return Err(ValidationError::Required {
                            name: param.name.clone(),
                            kind: param.kind,
                        });
                    }
                    None => {
                        return Err(ValidationError::WrongType {
                            name: param.name.clone(),
                            kind: param.kind,
                        });
                    }
                },
            }
        }

        Ok(Arguments { values })
    }
}

/// A validated argument value, tagged with the kind it was converted to.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Object(Map<String, Value>),
}

impl From<&ArgValue> for Value {
    fn from(arg: &ArgValue) -> Self {
        match arg {
            ArgValue::String(s) => Value::String(s.clone()),
            ArgValue::Integer(i) => Value::from(*i),
            ArgValue::Number(n) => Value::from(*n),
            ArgValue::Boolean(b) => Value::Bool(*b),
            ArgValue::Object(map) => Value::Object(map.clone()),
        }
    }
}

/// Arguments of one call after schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, ArgValue>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            Some(ArgValue::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn object(&self, name: &str) -> Option<&Map<String, Value>> {
        match self.values.get(name) {
            Some(ArgValue::Object(map)) => Some(map),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Re-encode the validated values as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(name, arg)| (name.clone(), Value::from(arg)))
                .collect(),
        )
    }
}
