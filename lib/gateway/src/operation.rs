use std::collections::{BTreeMap, HashMap};

use graphql_parser::query::{
    Definition, FragmentDefinition, OperationDefinition, Selection, SelectionSet, Type,
    TypeCondition, Value as AstValue, VariableDefinition,
};

use crate::error::ValidationError;
use crate::execution_request::ExecutionRequest;
use crate::schema::{ObjectType, SupergraphSchema};
use crate::selection::{Extractor, Field, OperationType, Resolver};
use crate::value::{InputValue, Value};
use crate::TYPENAME_FIELD;

/// A parsed operation with every selection bound to its resolver and all
/// variable values collected, ready for the resolver engine.
#[derive(Debug)]
pub struct BoundOperation {
    pub operation_type: OperationType,
    pub fields: Vec<Field>,
    pub variables: BTreeMap<String, InputValue>,
}

impl BoundOperation {
    pub fn is_introspection_only(&self) -> bool {
        self.fields
            .iter()
            .all(|field| field.name.starts_with("__"))
    }

    pub fn has_introspection_fields(&self) -> bool {
        self.fields
            .iter()
            .any(|field| field.name.starts_with("__"))
    }
}

/// Parses the inbound document, picks the requested operation and binds its
/// selection tree against the supergraph: fields carrying an extend become
/// fetchers, everything else becomes a named-field extractor. Fragments are
/// inlined, their type conditions becoming `targets` on the bound fields.
pub fn bind_request(
    schema: &SupergraphSchema,
    request: &ExecutionRequest,
) -> Result<BoundOperation, ValidationError> {
    let document = graphql_parser::parse_query::<String>(&request.query)
        .map_err(|error| ValidationError::Parse(error.to_string()))?;

    let mut fragments: HashMap<&str, &FragmentDefinition<'_, String>> = HashMap::new();
    let mut operations: Vec<&OperationDefinition<'_, String>> = Vec::new();
    for definition in &document.definitions {
        match definition {
            Definition::Operation(operation) => operations.push(operation),
            Definition::Fragment(fragment) => {
                fragments.insert(fragment.name.as_str(), fragment);
            }
        }
    }

    let operation = match &request.operation_name {
        Some(name) => operations
            .iter()
            .find(|operation| operation_parts(operation).1 == Some(name.as_str()))
            .ok_or_else(|| ValidationError::UnknownOperation(name.clone()))?,
        None => match operations.as_slice() {
            [] => return Err(ValidationError::NoOperation),
            [operation] => operation,
            _ => return Err(ValidationError::AmbiguousOperation),
        },
    };
    let (operation_type, _, variable_definitions, selection_set) = operation_parts(operation);

    let variables = collect_variables(variable_definitions, request)?;

    let root_type = schema
        .root_type(operation_type)
        .ok_or(ValidationError::UnsupportedOperationType(
            operation_type.keyword(),
        ))?;
    let fields = bind_selection_set(schema, selection_set, Some(root_type), None, &fragments)?;

    Ok(BoundOperation {
        operation_type,
        fields,
        variables,
    })
}

fn operation_parts<'a, 'd>(
    operation: &'a OperationDefinition<'d, String>,
) -> (
    OperationType,
    Option<&'a str>,
    &'a [VariableDefinition<'d, String>],
    &'a SelectionSet<'d, String>,
) {
    match operation {
        OperationDefinition::SelectionSet(selection_set) => {
            (OperationType::Query, None, &[], selection_set)
        }
        OperationDefinition::Query(query) => (
            OperationType::Query,
            query.name.as_deref(),
            &query.variable_definitions,
            &query.selection_set,
        ),
        OperationDefinition::Mutation(mutation) => (
            OperationType::Mutation,
            mutation.name.as_deref(),
            &mutation.variable_definitions,
            &mutation.selection_set,
        ),
        OperationDefinition::Subscription(subscription) => (
            OperationType::Subscription,
            subscription.name.as_deref(),
            &subscription.variable_definitions,
            &subscription.selection_set,
        ),
    }
}

fn collect_variables(
    definitions: &[VariableDefinition<'_, String>],
    request: &ExecutionRequest,
) -> Result<BTreeMap<String, InputValue>, ValidationError> {
    let provided = request.variables.as_ref();
    let mut variables = BTreeMap::new();
    for definition in definitions {
        if let Some(value) = provided.and_then(|variables| variables.get(&definition.name)) {
            variables.insert(
                definition.name.clone(),
                InputValue::from(Value::from(value.clone())),
            );
        } else if let Some(default_value) = &definition.default_value {
            variables.insert(definition.name.clone(), input_value_from_ast(default_value));
        } else if matches!(definition.var_type, Type::NonNullType(_)) {
            return Err(ValidationError::MissingVariable(definition.name.clone()));
        }
    }
    Ok(variables)
}

fn bind_selection_set(
    schema: &SupergraphSchema,
    selection_set: &SelectionSet<'_, String>,
    current_type: Option<&ObjectType>,
    targets: Option<&[String]>,
    fragments: &HashMap<&str, &FragmentDefinition<'_, String>>,
) -> Result<Vec<Field>, ValidationError> {
    let mut fields = Vec::new();
    for selection in &selection_set.items {
        match selection {
            Selection::Field(ast_field) => {
                fields.push(bind_field(schema, ast_field, current_type, targets, fragments)?);
            }
            Selection::InlineFragment(fragment) => {
                let narrowed: Option<Vec<String>> = match &fragment.type_condition {
                    Some(TypeCondition::On(name)) => Some(vec![name.clone()]),
                    None => targets.map(|targets| targets.to_vec()),
                };
                let condition_type = narrowed
                    .as_ref()
                    .and_then(|names| schema.type_def(&names[0]))
                    .or(current_type);
                fields.extend(bind_selection_set(
                    schema,
                    &fragment.selection_set,
                    condition_type,
                    narrowed.as_deref(),
                    fragments,
                )?);
            }
            Selection::FragmentSpread(spread) => {
                let fragment = fragments
                    .get(spread.fragment_name.as_str())
                    .ok_or_else(|| ValidationError::UnknownFragment(spread.fragment_name.clone()))?;
                let TypeCondition::On(name) = &fragment.type_condition;
                let condition_type = schema.type_def(name).or(current_type);
                fields.extend(bind_selection_set(
                    schema,
                    &fragment.selection_set,
                    condition_type,
                    Some(std::slice::from_ref(name)),
                    fragments,
                )?);
            }
        }
    }
    Ok(fields)
}

fn bind_field(
    schema: &SupergraphSchema,
    ast_field: &graphql_parser::query::Field<'_, String>,
    current_type: Option<&ObjectType>,
    targets: Option<&[String]>,
    fragments: &HashMap<&str, &FragmentDefinition<'_, String>>,
) -> Result<Field, ValidationError> {
    let mut field = Field::new(ast_field.name.clone());
    if let Some(alias) = &ast_field.alias {
        field.output_name = alias.clone();
    }
    field.targets = targets.map(|targets| targets.to_vec());
    for (name, value) in &ast_field.arguments {
        field
            .arguments
            .push((name.clone(), input_value_from_ast(value)));
    }

    if field.name == TYPENAME_FIELD {
        // Fetched objects key every field by its response key, so the
        // projection uses the alias, not the schema name.
        field.resolver = Some(Resolver::Extract(Extractor::field(field.output_name.clone())));
        return Ok(field);
    }
    // Other meta fields (__schema, __type) are answered by the local
    // introspection executor; their sub-selection is a plain projection.
    if field.name.starts_with("__") {
        field.fields =
            bind_selection_set(schema, &ast_field.selection_set, None, None, fragments)?;
        return Ok(field);
    }

    let definition = match current_type {
        Some(object_type) => match object_type.field(&field.name) {
            Some(definition) => Some(definition),
            None => {
                return Err(ValidationError::UnknownField {
                    type_name: object_type.name.clone(),
                    field_name: field.name.clone(),
                })
            }
        },
        None => None,
    };

    let child_type = definition.and_then(|definition| schema.type_def(&definition.type_name));
    let children =
        bind_selection_set(schema, &ast_field.selection_set, child_type, None, fragments)?;

    match definition.and_then(|definition| definition.extend.clone()) {
        Some(extend) => {
            // A batched entity fetch for a single-valued field comes back as
            // a filtered list; a pass-through selection unwraps it.
            let singleton_entity =
                extend.batch_enabled() && definition.is_some_and(|definition| !definition.list);
            field.resolver = Some(Resolver::Fetch(extend));
            if singleton_entity {
                let mut wrapper = Field::new(field.name.clone());
                wrapper.eliminate = true;
                wrapper.resolver = Some(Resolver::Extract(Extractor::identity()));
                wrapper.fields = children;
                field.fields = vec![wrapper];
            } else {
                field.fields = children;
            }
        }
        None => {
            field.resolver = Some(Resolver::Extract(Extractor::field(field.output_name.clone())));
            field.fields = children;
        }
    }
    Ok(field)
}

pub(crate) fn input_value_from_ast(value: &AstValue<'_, String>) -> InputValue {
    match value {
        AstValue::Variable(name) => InputValue::Variable(name.clone()),
        AstValue::Int(n) => n.as_i64().map(InputValue::Int).unwrap_or(InputValue::Null),
        AstValue::Float(f) => InputValue::Float(*f),
        AstValue::String(s) => InputValue::String(s.clone()),
        AstValue::Boolean(b) => InputValue::Boolean(*b),
        AstValue::Null => InputValue::Null,
        AstValue::Enum(e) => InputValue::Enum(e.clone()),
        AstValue::List(items) => {
            InputValue::List(items.iter().map(input_value_from_ast).collect())
        }
        AstValue::Object(map) => InputValue::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), input_value_from_ast(value)))
                .collect(),
        ),
    }
}
