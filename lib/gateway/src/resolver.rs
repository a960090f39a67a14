use std::collections::BTreeMap;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use indexmap::IndexMap;
use tracing::instrument;

use crate::config::{GatewayOptions, UnmatchedEntityPolicy};
use crate::datasource::{FetchDataSource, FetchField, FetchRequest};
use crate::error::ExecutionError;
use crate::executors::map::SubgraphExecutorMap;
use crate::extend::Extend;
use crate::selection::{Field, OperationType, Resolver};
use crate::value::{InputValue, Value};
use crate::TYPENAME_FIELD;

/// Everything one request's resolution needs: the operation type picks the
/// sibling strategy, the data source batches the fetches. Shared state of the
/// gateway is borrowed; the data source is owned by this request alone.
pub struct ResolveContext<'a> {
    pub operation_type: OperationType,
    pub executors: &'a SubgraphExecutorMap,
    pub data_source: &'a FetchDataSource,
    pub variables: &'a BTreeMap<String, InputValue>,
    pub options: &'a GatewayOptions,
}

impl ResolveContext<'_> {
    pub async fn resolve_root(&self, fields: &[Field]) -> Result<Value, ExecutionError> {
        self.resolve_object(fields, &Value::Null).await
    }

    /// Resolves a selection list against one parent value into an object,
    /// response keys in selection order. Query and subscription siblings
    /// resolve concurrently so their fetches share a batch window; mutation
    /// siblings run strictly left to right, each sub-tree completing before
    /// the next starts.
    pub async fn resolve_object(
        &self,
        fields: &[Field],
        parent: &Value,
    ) -> Result<Value, ExecutionError> {
        let visible: Vec<&Field> = fields
            .iter()
            .filter(|field| self.applies_to(field, parent))
            .collect();
        let mut object = IndexMap::with_capacity(visible.len());
        match self.operation_type {
            OperationType::Mutation => {
                for field in visible {
                    let value = self.resolve_field(field, parent).await?;
                    object.insert(field.output_name.clone(), value);
                }
            }
            _ => {
                let resolved = join_all(
                    visible
                        .iter()
                        .map(|field| self.resolve_field(field, parent)),
                )
                .await;
                for (field, value) in visible.iter().zip(resolved) {
                    object.insert(field.output_name.clone(), value?);
                }
            }
        }
        Ok(Value::Object(object))
    }

    pub fn resolve_field<'b>(
        &'b self,
        field: &'b Field,
        parent: &'b Value,
    ) -> BoxFuture<'b, Result<Value, ExecutionError>> {
        async move {
            match &field.resolver {
                Some(Resolver::Fetch(extend)) => {
                    self.resolve_fetch(field, extend, parent).await
                }
                Some(Resolver::Extract(extractor)) => {
                    let value = match parent.as_object() {
                        Some(parent_object) => extractor.project(parent_object),
                        None => Value::Null,
                    };
                    self.resolve_extracted(field, value).await
                }
                // Unbound selections fall back to named-field projection.
                None => {
                    let value = parent
                        .as_object()
                        .and_then(|parent_object| parent_object.get(&field.name))
                        .cloned()
                        .unwrap_or(Value::Null);
                    self.resolve_extracted(field, value).await
                }
            }
        }
        .boxed()
    }

    async fn resolve_extracted(
        &self,
        field: &Field,
        value: Value,
    ) -> Result<Value, ExecutionError> {
        match value {
            // Scalars, lists and nulls are returned as-is; only objects
            // recurse into the sub-selection.
            Value::Object(_) => self.resolve_object(&field.fields, &value).await,
            other => Ok(other),
        }
    }

    #[instrument(level = "trace", skip_all, fields(field_name = %field.name, subgraph_name = %extend.source_graph))]
    async fn resolve_fetch(
        &self,
        field: &Field,
        extend: &Extend,
        parent: &Value,
    ) -> Result<Value, ExecutionError> {
        if !self.executors.contains(&extend.source_graph) {
            return Err(ExecutionError::SubgraphNotFound(extend.source_graph.clone()));
        }

        let empty_parent = IndexMap::new();
        let parent_object = parent.as_object().unwrap_or(&empty_parent);

        let mut arguments: BTreeMap<String, InputValue> = BTreeMap::new();
        for (name, value) in &field.arguments {
            arguments.insert(name.clone(), value.resolve_variables(self.variables));
        }
        for mapping in &extend.argument_mappings {
            let parent_value = parent_object
                .get(&mapping.parent_key)
                .cloned()
                .unwrap_or(Value::Null);
            let (name, value) = mapping.apply(InputValue::from(parent_value));
            // A mapping that produced nothing sends nothing.
            if !value.is_null() {
                arguments.insert(name, value);
            }
        }

        let request = FetchRequest {
            subgraph_name: extend.source_graph.clone(),
            source_field_name: extend.source_field_name.clone(),
            operation_type: self.operation_type,
            fields: self.lower_selection(&field.fields, Some(extend)),
            arguments,
            batch_enabled: extend.batch_enabled(),
        };
        let mut result = self.data_source.load(request).await?;

        if let (Value::List(items), Some(filter)) = (&result, &extend.filter_batch_results) {
            let empty_candidate = IndexMap::new();
            let filtered: Vec<Value> = items
                .iter()
                .filter(|item| filter(parent_object, item.as_object().unwrap_or(&empty_candidate)))
                .cloned()
                .collect();
            result = Value::List(filtered);
        }

        if let [child] = field.fields.as_slice() {
            if child.eliminate {
                if let Value::List(items) = &result {
                    return match items.as_slice() {
                        [single] => self.resolve_field(child, single).await,
                        [] => match self.options.unmatched_entity_policy {
                            UnmatchedEntityPolicy::NullForUnmatched => Ok(Value::Null),
                            UnmatchedEntityPolicy::Fail => Err(ExecutionError::UnmatchedEntity {
                                type_name: extend
                                    .target
                                    .clone()
                                    .unwrap_or_else(|| extend.source_field_name.clone()),
                                field_name: field.name.clone(),
                            }),
                        },
                        // Multiple survivors: keep the entities, skip the
                        // singleton unwrap.
                        items => self.resolve_list(&child.fields, items).await,
                    };
                }
                return self.resolve_field(child, &result).await;
            }
        }

        if field.fields.is_empty() {
            return Ok(result);
        }
        match &result {
            Value::List(items) => self.resolve_list(&field.fields, items).await,
            other => self.resolve_object(&field.fields, other).await,
        }
    }

    async fn resolve_list(
        &self,
        fields: &[Field],
        items: &[Value],
    ) -> Result<Value, ExecutionError> {
        let mut out = Vec::with_capacity(items.len());
        match self.operation_type {
            OperationType::Mutation => {
                for item in items {
                    out.push(self.resolve_object(fields, item).await?);
                }
            }
            _ => {
                let resolved =
                    join_all(items.iter().map(|item| self.resolve_object(fields, item))).await;
                for value in resolved {
                    out.push(value?);
                }
            }
        }
        Ok(Value::List(out))
    }

    /// Lowers a bound selection to the plain fields sent to a subgraph.
    ///
    /// A nested fetcher is not followed into its own subgraph here; only the
    /// parent keys its argument mappings read are requested. Pass-through
    /// wrappers splice their children inline. The extend's additional fields
    /// are appended and its target narrows every top-level field.
    fn lower_selection(&self, fields: &[Field], extend: Option<&Extend>) -> Vec<FetchField> {
        let mut lowered: Vec<FetchField> = Vec::with_capacity(fields.len());
        for child in fields {
            if child.eliminate {
                for inner in self.lower_selection(&child.fields, None) {
                    push_unique(&mut lowered, inner);
                }
                continue;
            }
            if let Some(Resolver::Fetch(child_extend)) = &child.resolver {
                for mapping in &child_extend.argument_mappings {
                    push_unique(&mut lowered, FetchField::new(mapping.parent_key.clone()));
                }
                continue;
            }
            let mut plain = FetchField::new(child.name.clone()).with_alias(child.output_name.clone());
            for (name, value) in &child.arguments {
                plain
                    .arguments
                    .insert(name.clone(), value.resolve_variables(self.variables));
            }
            plain.fields = self.lower_selection(&child.fields, None);
            plain.targets = child.targets.clone();
            push_unique(&mut lowered, plain);
        }
        if let Some(extend) = extend {
            for additional in &extend.additional_fields {
                push_unique(&mut lowered, FetchField::new(additional.clone()));
            }
            if let Some(target) = &extend.target {
                for field in lowered.iter_mut() {
                    if field.targets.is_none() {
                        field.targets = Some(vec![target.clone()]);
                    }
                }
            }
        }
        lowered
    }

    fn applies_to(&self, field: &Field, parent: &Value) -> bool {
        match (
            &field.targets,
            parent
                .as_object()
                .and_then(|parent_object| parent_object.get(TYPENAME_FIELD)),
        ) {
            (Some(targets), Some(Value::String(type_name))) => {
                targets.iter().any(|target| target == type_name)
            }
            _ => true,
        }
    }
}

fn push_unique(fields: &mut Vec<FetchField>, candidate: FetchField) {
    match fields
        .iter_mut()
        .find(|field| field.output_name == candidate.output_name)
    {
        None => fields.push(candidate),
        // A bare key collides with a richer selection of the same name:
        // keep whichever actually selects something.
        Some(existing) => {
            let existing_bare = existing.fields.is_empty() && existing.arguments.is_empty();
            let candidate_bare = candidate.fields.is_empty() && candidate.arguments.is_empty();
            if existing_bare && !candidate_bare {
                *existing = candidate;
            }
        }
    }
}
