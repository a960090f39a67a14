use crate::execution_result::GraphQLError;

/// Composition-time failures. Building a gateway either yields a sound
/// supergraph or one of these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
    #[error("at least one subgraph is required to compose a supergraph")]
    EmptySubgraphList,
    #[error("field {type_name}.{field_name} is defined by more than one subgraph")]
    DuplicateField {
        type_name: String,
        field_name: String,
    },
    #[error("root field {field_name} is exposed by both {first_subgraph} and {second_subgraph}")]
    DuplicateRootField {
        field_name: String,
        first_subgraph: String,
        second_subgraph: String,
    },
    #[error("unknown type {0}")]
    UnknownType(String),
    #[error("unknown field {type_name}.{field_name}")]
    UnknownField {
        type_name: String,
        field_name: String,
    },
    #[error("root field {type_name}.{field_name} has no subgraph binding")]
    UnboundRootField {
        type_name: String,
        field_name: String,
    },
}

/// Runtime resolution failures. A single one of these aborts the request and
/// surfaces as `{data: null, errors: [..]}`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("Subgraph {0} not found")]
    SubgraphNotFound(String),
    #[error("subgraph {subgraph} request failed: {message}")]
    Transport { subgraph: String, message: String },
    #[error("subgraph {subgraph} returned a malformed response: {message}")]
    MalformedResponse { subgraph: String, message: String },
    #[error("{message}")]
    Subgraph { subgraph: String, message: String },
    #[error("no {type_name} entity matched the parent of field {field_name}")]
    UnmatchedEntity {
        type_name: String,
        field_name: String,
    },
}

impl ExecutionError {
    fn code(&self) -> &'static str {
        match self {
            ExecutionError::SubgraphNotFound(_) => "SUBGRAPH_NOT_FOUND",
            ExecutionError::Transport { .. } => "SUBGRAPH_REQUEST_ERROR",
            ExecutionError::MalformedResponse { .. } => "BAD_RESPONSE",
            ExecutionError::Subgraph { .. } => "DOWNSTREAM_SERVICE_ERROR",
            ExecutionError::UnmatchedEntity { .. } => "ENTITY_NOT_FOUND",
        }
    }

    pub fn to_graphql_error(&self) -> GraphQLError {
        let mut extensions = serde_json::Map::new();
        extensions.insert(
            "code".to_string(),
            serde_json::Value::String(self.code().to_string()),
        );
        if let ExecutionError::Subgraph { subgraph, .. }
        | ExecutionError::Transport { subgraph, .. }
        | ExecutionError::MalformedResponse { subgraph, .. } = self
        {
            extensions.insert(
                "serviceName".to_string(),
                serde_json::Value::String(subgraph.clone()),
            );
        }
        GraphQLError {
            message: self.to_string(),
            locations: None,
            path: None,
            extensions: Some(extensions),
        }
    }
}

/// Inbound document failures, passed through to the response unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    Parse(String),
    #[error("Cannot query field \"{field_name}\" on type \"{type_name}\"")]
    UnknownField {
        type_name: String,
        field_name: String,
    },
    #[error("Unknown fragment \"{0}\"")]
    UnknownFragment(String),
    #[error("Unknown operation named \"{0}\"")]
    UnknownOperation(String),
    #[error("Must provide operation name if query contains multiple operations")]
    AmbiguousOperation,
    #[error("Must provide an operation")]
    NoOperation,
    #[error("The schema does not define a {0} root type")]
    UnsupportedOperationType(&'static str),
    #[error("Variable \"${0}\" of non-null type must be provided")]
    MissingVariable(String),
    #[error("Introspection is disabled")]
    IntrospectionDisabled,
}
