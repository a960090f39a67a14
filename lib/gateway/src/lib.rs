use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{instrument, Instrument};

pub mod config;
pub mod datasource;
pub mod error;
pub mod execution_request;
pub mod execution_result;
pub mod executors;
pub mod extend;
pub mod introspection;
pub mod operation;
pub mod print;
pub mod resolver;
pub mod schema;
pub mod selection;
pub mod telemetry;
pub mod value;

pub use config::{GatewayOptions, UnmatchedEntityPolicy};
pub use error::{ConfigurationError, ExecutionError, ValidationError};
pub use execution_request::ExecutionRequest;
pub use execution_result::{ExecutionResult, GraphQLError, GraphQLErrorLocation};
pub use extend::{ArgumentMapping, Extend};
pub use schema::visitor::{transform, SchemaVisitor};
pub use schema::{FieldDefinition, ObjectType, Subgraph, SubgraphSchema, SupergraphSchema};
pub use selection::{Field, OperationType};

use crate::datasource::FetchDataSource;
use crate::executors::map::SubgraphExecutorMap;
use crate::operation::BoundOperation;
use crate::resolver::ResolveContext;
use crate::value::Value;

pub(crate) const TYPENAME_FIELD: &str = "__typename";

/// A federation gateway instance: the composed supergraph plus the executors
/// that back it. Immutable once built and shareable across concurrent
/// requests; each `execute` call owns its own batching data source.
pub struct Gateway {
    supergraph: Arc<SupergraphSchema>,
    executors: Arc<SubgraphExecutorMap>,
    options: GatewayOptions,
    introspection_root: Value,
}

impl Gateway {
    pub fn build(
        subgraphs: Vec<Subgraph>,
        transformers: Vec<Box<dyn SchemaVisitor>>,
        options: GatewayOptions,
    ) -> Result<Gateway, ConfigurationError> {
        let supergraph = schema::compose::compose(&subgraphs, &transformers)?;
        let introspection_root = introspection::schema_root(&supergraph);
        let executors = Arc::new(SubgraphExecutorMap::from_subgraphs(subgraphs));
        Ok(Gateway {
            supergraph: Arc::new(supergraph),
            executors,
            options,
            introspection_root,
        })
    }

    pub fn supergraph(&self) -> &SupergraphSchema {
        &self.supergraph
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let bound = match operation::bind_request(&self.supergraph, &request) {
            Ok(bound) => bound,
            Err(error) => return ExecutionResult::from_error_message(error.to_string()),
        };

        if bound.has_introspection_fields() && !self.options.expose_introspection {
            return ExecutionResult::from_error_message(
                ValidationError::IntrospectionDisabled.to_string(),
            );
        }

        // Pure introspection never reaches the federation engine: no span,
        // no subgraph traffic.
        if bound.is_introspection_only() {
            let data = self.introspection_data(&bound);
            return ExecutionResult::ok(data.into());
        }

        let masked = telemetry::masked_operation(bound.operation_type, &bound.fields);
        let span = telemetry::QuerySpan::new(&masked);
        let result = self.execute_bound(&bound).instrument(span.span.clone()).await;
        match result {
            Ok(data) => {
                span.record_ok();
                ExecutionResult::ok(data.into())
            }
            Err(error) => {
                span.record_error(&error);
                ExecutionResult {
                    data: serde_json::Value::Null,
                    errors: Some(vec![error.to_graphql_error()]),
                    extensions: None,
                }
            }
        }
    }

    async fn execute_bound(&self, bound: &BoundOperation) -> Result<Value, ExecutionError> {
        let data_source = FetchDataSource::new(self.executors.clone());
        let context = ResolveContext {
            operation_type: bound.operation_type,
            executors: &self.executors,
            data_source: &data_source,
            variables: &bound.variables,
            options: &self.options,
        };

        let data_fields: Vec<Field> = bound
            .fields
            .iter()
            .filter(|field| !field.name.starts_with("__"))
            .cloned()
            .collect();
        let mut resolved = context
            .resolve_root(&data_fields)
            .await?
            .into_object()
            .unwrap_or_default();

        // Response keys come out in the order the request selected them,
        // introspection fields included.
        let mut data = IndexMap::with_capacity(bound.fields.len());
        for field in &bound.fields {
            if field.name.starts_with("__") {
                data.insert(
                    field.output_name.clone(),
                    introspection::resolve_root_field(
                        &self.supergraph,
                        &self.introspection_root,
                        bound.operation_type,
                        field,
                        &bound.variables,
                    ),
                );
            } else if let Some(value) = resolved.swap_remove(&field.output_name) {
                data.insert(field.output_name.clone(), value);
            }
        }
        Ok(Value::Object(data))
    }

    fn introspection_data(&self, bound: &BoundOperation) -> Value {
        Value::Object(
            bound
                .fields
                .iter()
                .map(|field| {
                    (
                        field.output_name.clone(),
                        introspection::resolve_root_field(
                            &self.supergraph,
                            &self.introspection_root,
                            bound.operation_type,
                            field,
                            &bound.variables,
                        ),
                    )
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests;
