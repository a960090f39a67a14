use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dataloader::cached::Loader;
use dataloader::BatchFn;
use indexmap::IndexMap;
use tracing::{instrument, trace};

use crate::error::ExecutionError;
use crate::execution_request::ExecutionRequest;
use crate::execution_result::ExecutionResult;
use crate::executors::map::SubgraphExecutorMap;
use crate::print;
use crate::selection::OperationType;
use crate::value::{InputValue, Value};

/// A selection node as it goes over the wire: plain structure, no resolver
/// bindings. Arguments are kept in a sorted map so two requests that differ
/// only in argument order compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchField {
    pub name: String,
    pub output_name: String,
    pub arguments: BTreeMap<String, InputValue>,
    pub fields: Vec<FetchField>,
    pub targets: Option<Vec<String>>,
}

impl FetchField {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        FetchField {
            output_name: name.clone(),
            name,
            arguments: BTreeMap::new(),
            fields: Vec::new(),
            targets: None,
        }
    }

    pub fn with_alias(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = output_name.into();
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: InputValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FetchField>) -> Self {
        self.fields = fields;
        self
    }
}

/// The data-source key: everything that identifies one subgraph fetch.
/// Equality is structural, so equal fetches enqueued by different parts of
/// the tree share one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub subgraph_name: String,
    pub source_field_name: String,
    pub operation_type: OperationType,
    pub fields: Vec<FetchField>,
    pub arguments: BTreeMap<String, InputValue>,
    pub batch_enabled: bool,
}

impl FetchRequest {
    fn canonical_sort_key(&self) -> String {
        let selection = FetchField {
            name: self.source_field_name.clone(),
            output_name: self.source_field_name.clone(),
            arguments: self.arguments.clone(),
            fields: self.fields.clone(),
            targets: None,
        };
        format!(
            "{} {} {}",
            self.subgraph_name,
            self.operation_type.keyword(),
            print::print_fetch_field(&selection)
        )
    }
}

pub type FetchOutcome = Result<Value, ExecutionError>;

/// Per-request batching data source.
///
/// Requests gathered within one scheduling window are grouped by
/// `(subgraph, operation type)` and dispatched as a single synthesized
/// document per group, aliased `f0, f1, …` in declaration order. Equal
/// requests share one promise for the lifetime of the request.
pub struct FetchDataSource {
    executors: Arc<SubgraphExecutorMap>,
    loader: Loader<FetchRequest, FetchOutcome, FetchBatchFn>,
}

impl FetchDataSource {
    pub fn new(executors: Arc<SubgraphExecutorMap>) -> Self {
        let loader = Loader::new(FetchBatchFn {
            executors: executors.clone(),
        });
        FetchDataSource { executors, loader }
    }

    pub async fn load(&self, request: FetchRequest) -> FetchOutcome {
        if request.operation_type == OperationType::Mutation {
            // Mutations neither batch nor dedupe: every enqueue is its own
            // dispatch, awaited before the caller moves on.
            let group = [&request];
            let mut outcomes = dispatch_group(&self.executors, &group).await;
            return outcomes
                .remove(&request)
                .unwrap_or_else(|| Ok(Value::Null));
        }
        self.loader.load(request).await
    }
}

struct FetchBatchFn {
    executors: Arc<SubgraphExecutorMap>,
}

impl BatchFn<FetchRequest, FetchOutcome> for FetchBatchFn {
    async fn load(&mut self, keys: &[FetchRequest]) -> HashMap<FetchRequest, FetchOutcome> {
        // The loader hands pending keys over in hash order; sort them
        // canonically so the synthesized documents are deterministic.
        let mut keys: Vec<&FetchRequest> = keys.iter().collect();
        keys.sort_by_cached_key(|request| request.canonical_sort_key());
        let pending = keys.len();

        let mut groups: IndexMap<(&str, OperationType), Vec<&FetchRequest>> = IndexMap::new();
        for key in keys {
            groups
                .entry((key.subgraph_name.as_str(), key.operation_type))
                .or_default()
                .push(key);
        }
        trace!(pending, groups = groups.len(), "dispatching batch window");

        let mut results = HashMap::with_capacity(pending);
        for group in groups.values() {
            results.extend(dispatch_group(&self.executors, group).await);
        }
        results
    }
}

/// One top-level selection of the synthesized document, together with the
/// requests whose promises it fulfills. Coalesced entity fetches share a
/// slot; their callers all receive the full list result.
struct Slot {
    source_field_name: String,
    fields: Vec<FetchField>,
    arguments: BTreeMap<String, InputValue>,
    batch_enabled: bool,
    keys: Vec<FetchRequest>,
}

impl Slot {
    fn new(request: &FetchRequest) -> Self {
        Slot {
            source_field_name: request.source_field_name.clone(),
            fields: request.fields.clone(),
            arguments: request.arguments.clone(),
            batch_enabled: request.batch_enabled,
            keys: vec![request.clone()],
        }
    }

    fn coalesces_with(&self, request: &FetchRequest) -> bool {
        self.batch_enabled
            && self.source_field_name == request.source_field_name
            && self.fields == request.fields
            && self
                .arguments
                .keys()
                .eq(request.arguments.keys())
    }

    fn merge(&mut self, request: &FetchRequest) {
        for (name, value) in &request.arguments {
            let merged = match self.arguments.remove(name) {
                Some(existing) => merge_input_values(existing, value.clone()),
                None => value.clone(),
            };
            self.arguments.insert(name.clone(), merged);
        }
        self.keys.push(request.clone());
    }
}

#[instrument(level = "debug", skip_all, fields(subgraph_name = %group[0].subgraph_name, requests = group.len()))]
async fn dispatch_group(
    executors: &SubgraphExecutorMap,
    group: &[&FetchRequest],
) -> HashMap<FetchRequest, FetchOutcome> {
    let subgraph_name = group[0].subgraph_name.as_str();
    let operation_type = group[0].operation_type;

    let mut slots: Vec<Slot> = Vec::new();
    for request in group {
        if request.batch_enabled {
            if let Some(slot) = slots.iter_mut().find(|slot| slot.coalesces_with(request)) {
                slot.merge(request);
                continue;
            }
        }
        slots.push(Slot::new(request));
    }

    let selections: Vec<FetchField> = slots
        .iter()
        .enumerate()
        .map(|(index, slot)| FetchField {
            name: slot.source_field_name.clone(),
            output_name: format!("f{}", index),
            arguments: slot.arguments.clone(),
            fields: slot.fields.clone(),
            targets: None,
        })
        .collect();
    let query = print::print_document(operation_type, &selections);
    trace!(subgraph = subgraph_name, %query, "synthesized subgraph document");

    let result = executors
        .execute(subgraph_name, ExecutionRequest::from_query(query))
        .await;
    let outcomes = demultiplex(subgraph_name, result, slots.len());

    let mut results = HashMap::with_capacity(group.len());
    for (slot, outcome) in slots.into_iter().zip(outcomes) {
        for key in slot.keys {
            results.insert(key, outcome.clone());
        }
    }
    results
}

/// Splits a subgraph response back into per-slot outcomes by alias. A
/// subgraph-reported error fails every slot of the group; the core never
/// emits partial results.
fn demultiplex(
    subgraph_name: &str,
    result: ExecutionResult,
    slot_count: usize,
) -> Vec<FetchOutcome> {
    if result.has_errors() {
        let message = result
            .errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|error| error.message.clone())
            .unwrap_or_default();
        let error = ExecutionError::Subgraph {
            subgraph: subgraph_name.to_string(),
            message,
        };
        return vec![Err(error); slot_count];
    }

    match result.data {
        serde_json::Value::Object(mut map) => (0..slot_count)
            .map(|index| {
                let value = map
                    .remove(&format!("f{}", index))
                    .map(Value::from)
                    .unwrap_or(Value::Null);
                Ok(value)
            })
            .collect(),
        other => {
            let error = ExecutionError::MalformedResponse {
                subgraph: subgraph_name.to_string(),
                message: format!("expected an object at the response root, got {}", other),
            };
            vec![Err(error); slot_count]
        }
    }
}

/// Merge rule for coalesced entity arguments: lists concatenate, objects
/// merge key-wise, anything else collects into a list. This covers both the
/// flat (`storeId: 1`) and the nested (`input: {ids: [..]}`) mapping shapes.
fn merge_input_values(a: InputValue, b: InputValue) -> InputValue {
    match (a, b) {
        (InputValue::List(mut items), InputValue::List(more)) => {
            items.extend(more);
            InputValue::List(items)
        }
        (InputValue::List(mut items), single) => {
            items.push(single);
            InputValue::List(items)
        }
        (single, InputValue::List(more)) => {
            let mut items = vec![single];
            items.extend(more);
            InputValue::List(items)
        }
        (InputValue::Object(mut map), InputValue::Object(other)) => {
            for (key, incoming) in other {
                let merged = match map.get(&key) {
                    Some(existing) => merge_input_values(existing.clone(), incoming),
                    None => incoming,
                };
                map.insert(key, merged);
            }
            InputValue::Object(map)
        }
        (a, b) => InputValue::List(vec![a, b]),
    }
}
