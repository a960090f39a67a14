use std::ops::Deref;

use indexmap::IndexMap;
use tracing::{field::Empty, info_span, Span};

use crate::error::ExecutionError;
use crate::print;
use crate::selection::{Field, OperationType};
use crate::value::InputValue;

const TARGET_NAME: &str = "stitch_gateway";

/// The span wrapped around one query execution. Carries the inbound query
/// with all argument values masked, so traces stay queryable without leaking
/// PII.
pub struct QuerySpan {
    pub span: Span,
}

impl Deref for QuerySpan {
    type Target = Span;
    fn deref(&self) -> &Self::Target {
        &self.span
    }
}

impl QuerySpan {
    pub fn new(masked_query: &str) -> Self {
        let span = info_span!(
            target: TARGET_NAME,
            "query",
            "otel.kind" = "Internal",
            "otel.status_code" = Empty,
            "error.message" = Empty,
            query = masked_query,
        );
        QuerySpan { span }
    }

    pub fn record_ok(&self) {
        self.span.record("otel.status_code", "OK");
    }

    pub fn record_error(&self, error: &ExecutionError) {
        self.span.record("otel.status_code", "ERROR");
        self.span.record("error.message", error.to_string().as_str());
    }
}

/// Reconstructs the inbound operation as a GraphQL string with every
/// argument value masked.
pub fn masked_operation(operation_type: OperationType, fields: &[Field]) -> String {
    let masked: Vec<Field> = fields.iter().map(mask_field).collect();
    print::print_operation(operation_type, &masked)
}

fn mask_field(field: &Field) -> Field {
    Field {
        name: field.name.clone(),
        output_name: field.output_name.clone(),
        arguments: field
            .arguments
            .iter()
            .map(|(name, value)| (name.clone(), mask_input_value(value)))
            .collect(),
        fields: field.fields.iter().map(mask_field).collect(),
        targets: field.targets.clone(),
        eliminate: field.eliminate,
        resolver: None,
    }
}

/// Masking keeps the query's structural shape and drops every payload:
/// objects empty out, strings blank, numbers zero. Booleans, enums, nulls
/// and variable references carry no payload and pass through, which also
/// makes masking idempotent.
pub fn mask_input_value(value: &InputValue) -> InputValue {
    match value {
        InputValue::Object(_) => InputValue::Object(IndexMap::new()),
        InputValue::String(_) => InputValue::String(String::new()),
        InputValue::Int(_) => InputValue::Int(0),
        InputValue::Float(_) => InputValue::Float(0.0),
        InputValue::List(items) => InputValue::List(items.iter().map(mask_input_value).collect()),
        other => other.clone(),
    }
}
