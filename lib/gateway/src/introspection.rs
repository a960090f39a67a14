use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::schema::{FieldDefinition, ObjectType, SupergraphSchema};
use crate::selection::{Field, OperationType};
use crate::value::{InputValue, Value};
use crate::TYPENAME_FIELD;

/// Builds the `__schema` value served for introspection requests. Built once
/// per gateway; requests project their selection over it without ever
/// touching a subgraph.
pub fn schema_root(schema: &SupergraphSchema) -> Value {
    let mut root = IndexMap::new();
    root.insert("queryType".to_string(), named_type_ref(schema.query_type.as_deref()));
    root.insert(
        "mutationType".to_string(),
        named_type_ref(schema.mutation_type.as_deref()),
    );
    root.insert(
        "subscriptionType".to_string(),
        named_type_ref(schema.subscription_type.as_deref()),
    );
    root.insert(
        "types".to_string(),
        Value::List(
            schema
                .types
                .values()
                .map(|object_type| type_value(schema, object_type))
                .collect(),
        ),
    );
    root.insert("directives".to_string(), Value::List(Vec::new()));
    Value::Object(root)
}

fn named_type_ref(name: Option<&str>) -> Value {
    match name {
        Some(name) => Value::Object(IndexMap::from_iter([(
            "name".to_string(),
            Value::String(name.to_string()),
        )])),
        None => Value::Null,
    }
}

fn type_value(schema: &SupergraphSchema, object_type: &ObjectType) -> Value {
    let fields = object_type
        .fields
        .iter()
        .map(|field| {
            let args = field
                .arguments
                .iter()
                .map(|argument| {
                    Value::Object(IndexMap::from_iter([
                        ("name".to_string(), Value::String(argument.name.clone())),
                        (
                            "type".to_string(),
                            Value::Object(IndexMap::from_iter([(
                                "name".to_string(),
                                Value::String(argument.type_name.clone()),
                            )])),
                        ),
                    ]))
                })
                .collect();
            Value::Object(IndexMap::from_iter([
                ("name".to_string(), Value::String(field.name.clone())),
                ("args".to_string(), Value::List(args)),
                ("type".to_string(), field_type_value(schema, field)),
            ]))
        })
        .collect();
    Value::Object(IndexMap::from_iter([
        ("kind".to_string(), Value::Enum("OBJECT".to_string())),
        ("name".to_string(), Value::String(object_type.name.clone())),
        ("description".to_string(), Value::Null),
        ("fields".to_string(), Value::List(fields)),
    ]))
}

fn field_type_value(schema: &SupergraphSchema, field: &FieldDefinition) -> Value {
    let kind = if schema.types.contains_key(&field.type_name) {
        "OBJECT"
    } else {
        "SCALAR"
    };
    let named = Value::Object(IndexMap::from_iter([
        ("kind".to_string(), Value::Enum(kind.to_string())),
        ("name".to_string(), Value::String(field.type_name.clone())),
        ("ofType".to_string(), Value::Null),
    ]));
    if field.list {
        Value::Object(IndexMap::from_iter([
            ("kind".to_string(), Value::Enum("LIST".to_string())),
            ("name".to_string(), Value::Null),
            ("ofType".to_string(), named),
        ]))
    } else {
        named
    }
}

/// Answers one `__`-prefixed root field from the composed schema.
pub fn resolve_root_field(
    schema: &SupergraphSchema,
    schema_root: &Value,
    operation_type: OperationType,
    field: &Field,
    variables: &BTreeMap<String, InputValue>,
) -> Value {
    match field.name.as_str() {
        TYPENAME_FIELD => schema
            .root_type_name(operation_type)
            .map(|name| Value::String(name.to_string()))
            .unwrap_or(Value::Null),
        "__schema" => project(&field.fields, schema_root),
        "__type" => {
            let requested = field
                .arguments
                .iter()
                .find(|(name, _)| name == "name")
                .map(|(_, value)| value.resolve_variables(variables));
            match requested {
                Some(InputValue::String(name)) => match schema.type_def(&name) {
                    Some(object_type) => {
                        project(&field.fields, &type_value(schema, object_type))
                    }
                    None => Value::Null,
                },
                _ => Value::Null,
            }
        }
        _ => Value::Null,
    }
}

/// Pure projection of a selection over an already-built value tree.
fn project(fields: &[Field], value: &Value) -> Value {
    if fields.is_empty() {
        return value.clone();
    }
    match value {
        Value::List(items) => Value::List(items.iter().map(|item| project(fields, item)).collect()),
        Value::Object(map) => Value::Object(
            fields
                .iter()
                .map(|field| {
                    let child = map.get(&field.name).cloned().unwrap_or(Value::Null);
                    (field.output_name.clone(), project(&field.fields, &child))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
