use std::sync::Arc;

use tracing::debug;

use crate::error::ConfigurationError;
use crate::extend::Extend;
use crate::schema::visitor::SchemaVisitor;
use crate::schema::{ObjectType, Subgraph, SupergraphSchema};

const QUERY_TYPE: &str = "Query";
const MUTATION_TYPE: &str = "Mutation";
const SUBSCRIPTION_TYPE: &str = "Subscription";

/// Merges the subgraph schemas into one supergraph and runs the user
/// transformers over it.
///
/// Every field declared on an exposed subgraph's root types is annotated with
/// an identity [`Extend`] naming its owning subgraph, so the resolver can
/// route it without further lookup. Root fields of the result always carry a
/// binding; a transformer that breaks that is rejected.
pub fn compose(
    subgraphs: &[Subgraph],
    transformers: &[Box<dyn SchemaVisitor>],
) -> Result<SupergraphSchema, ConfigurationError> {
    if subgraphs.is_empty() {
        return Err(ConfigurationError::EmptySubgraphList);
    }

    let mut supergraph = SupergraphSchema::default();

    for subgraph in subgraphs {
        let root_type_names = subgraph.schema.root_type_names();

        if subgraph.expose_at_root && subgraph.schema.query_type.is_some() {
            let roots = [
                (QUERY_TYPE, subgraph.schema.query_type.as_ref()),
                (MUTATION_TYPE, subgraph.schema.mutation_type.as_ref()),
                (SUBSCRIPTION_TYPE, subgraph.schema.subscription_type.as_ref()),
            ];
            for (canonical_name, root) in roots {
                if let Some(root) = root {
                    merge_root_type(&mut supergraph, canonical_name, root, &subgraph.name)?;
                }
            }
        }

        for object_type in &subgraph.schema.types {
            // Root types of a subgraph never merge as plain types: exposed
            // ones already contributed to the canonical roots, hidden ones
            // are reachable only through extend bindings.
            if root_type_names.contains(&object_type.name.as_str()) {
                continue;
            }
            merge_object_type(&mut supergraph, object_type)?;
        }
    }

    for transformer in transformers {
        transformer.visit_schema(&mut supergraph)?;
    }

    ensure_root_fields_bound(&supergraph)?;

    debug!(
        types = supergraph.types.len(),
        subgraphs = subgraphs.len(),
        "composed supergraph"
    );
    Ok(supergraph)
}

fn merge_root_type(
    supergraph: &mut SupergraphSchema,
    canonical_name: &str,
    root: &ObjectType,
    subgraph_name: &str,
) -> Result<(), ConfigurationError> {
    let merged = supergraph
        .types
        .entry(canonical_name.to_string())
        .or_insert_with(|| ObjectType::new(canonical_name));

    for field in &root.fields {
        if let Some(existing) = merged.field(&field.name) {
            let first_subgraph = existing
                .extend
                .as_ref()
                .map(|extend| extend.source_graph.clone())
                .unwrap_or_default();
            return Err(ConfigurationError::DuplicateRootField {
                field_name: field.name.clone(),
                first_subgraph,
                second_subgraph: subgraph_name.to_string(),
            });
        }
        let mut field = field.clone();
        field.extend = Some(Arc::new(Extend::new(subgraph_name, &field.name)));
        merged.fields.push(field);
    }

    match canonical_name {
        QUERY_TYPE => supergraph.query_type = Some(canonical_name.to_string()),
        MUTATION_TYPE => supergraph.mutation_type = Some(canonical_name.to_string()),
        _ => supergraph.subscription_type = Some(canonical_name.to_string()),
    }
    Ok(())
}

fn merge_object_type(
    supergraph: &mut SupergraphSchema,
    object_type: &ObjectType,
) -> Result<(), ConfigurationError> {
    match supergraph.types.get_mut(&object_type.name) {
        None => {
            supergraph
                .types
                .insert(object_type.name.clone(), object_type.clone());
        }
        Some(existing) => {
            for field in &object_type.fields {
                if existing.field(&field.name).is_some() {
                    return Err(ConfigurationError::DuplicateField {
                        type_name: object_type.name.clone(),
                        field_name: field.name.clone(),
                    });
                }
                existing.fields.push(field.clone());
            }
        }
    }
    Ok(())
}

fn ensure_root_fields_bound(supergraph: &SupergraphSchema) -> Result<(), ConfigurationError> {
    let root_names = [
        supergraph.query_type.as_deref(),
        supergraph.mutation_type.as_deref(),
        supergraph.subscription_type.as_deref(),
    ];
    for root in root_names.into_iter().flatten() {
        if let Some(object_type) = supergraph.type_def(root) {
            for field in &object_type.fields {
                if field.extend.is_none() {
                    return Err(ConfigurationError::UnboundRootField {
                        type_name: object_type.name.clone(),
                        field_name: field.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
