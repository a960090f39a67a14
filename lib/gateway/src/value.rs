use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

/// A resolved GraphQL response value.
///
/// Objects keep their insertion order so that response fields come out in
/// selection order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(f)) => Value::Float(f),
                (None, None) => Value::Null,
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::from(i),
            // NaN and infinities have no JSON representation
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) | Value::Enum(s) => serde_json::Value::String(s),
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// A GraphQL input value: the same shape as [`Value`] plus variable
/// references, as found in argument position before execution.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    Variable(String),
    List(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
}

impl Eq for InputValue {}

impl Hash for InputValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            InputValue::Null => {}
            InputValue::Int(i) => i.hash(state),
            InputValue::Float(f) => f.to_bits().hash(state),
            InputValue::Boolean(b) => b.hash(state),
            InputValue::String(s) | InputValue::Enum(s) | InputValue::Variable(s) => s.hash(state),
            InputValue::List(items) => {
                for item in items {
                    item.hash(state);
                }
            }
            // Object equality ignores insertion order, so the hash has to be
            // computed over a canonical key order.
            InputValue::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                for key in keys {
                    key.hash(state);
                    map[key.as_str()].hash(state);
                }
            }
        }
    }
}

impl InputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, InputValue::Null)
    }

    /// Replaces every variable reference with its value, or `Null` when the
    /// variable is not provided.
    pub fn resolve_variables(
        &self,
        variables: &std::collections::BTreeMap<String, InputValue>,
    ) -> InputValue {
        match self {
            InputValue::Variable(name) => variables.get(name).cloned().unwrap_or(InputValue::Null),
            InputValue::List(items) => InputValue::List(
                items
                    .iter()
                    .map(|item| item.resolve_variables(variables))
                    .collect(),
            ),
            InputValue::Object(map) => InputValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.resolve_variables(variables)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => InputValue::Null,
            Value::Int(i) => InputValue::Int(i),
            Value::Float(f) => InputValue::Float(f),
            Value::String(s) => InputValue::String(s),
            Value::Boolean(b) => InputValue::Boolean(b),
            Value::Enum(e) => InputValue::Enum(e),
            Value::List(items) => InputValue::List(items.into_iter().map(InputValue::from).collect()),
            Value::Object(map) => InputValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, InputValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<InputValue> for Value {
    fn from(value: InputValue) -> Self {
        match value {
            InputValue::Null => Value::Null,
            InputValue::Int(i) => Value::Int(i),
            InputValue::Float(f) => Value::Float(f),
            InputValue::String(s) => Value::String(s),
            InputValue::Boolean(b) => Value::Boolean(b),
            InputValue::Enum(e) => Value::Enum(e),
            // An unsubstituted variable has no response counterpart.
            InputValue::Variable(_) => Value::Null,
            InputValue::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
            InputValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}
