use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GraphQL response. `data` is always serialized so that a total failure
/// renders as `{"data": null, "errors": [..]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExecutionResult {
    #[serde(default)]
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl ExecutionResult {
    pub fn ok(data: Value) -> ExecutionResult {
        ExecutionResult {
            data,
            errors: None,
            extensions: None,
        }
    }

    pub fn from_error_message(message: impl Into<String>) -> ExecutionResult {
        ExecutionResult {
            data: Value::Null,
            errors: Some(vec![GraphQLError {
                message: message.into(),
                locations: None,
                path: None,
                extensions: None,
            }]),
            extensions: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<GraphQLErrorLocation>>,
    // Path segments can be field names or list indexes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GraphQLErrorLocation {
    pub line: usize,
    pub column: usize,
}
