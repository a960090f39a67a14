use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::{InputValue, Value};

pub type ArgumentMapFn = Arc<dyn Fn(InputValue) -> (String, InputValue) + Send + Sync>;
pub type BatchFilterFn =
    Arc<dyn Fn(&IndexMap<String, Value>, &IndexMap<String, Value>) -> bool + Send + Sync>;

/// Turns one value of the parent object into an argument for the subgraph
/// call: given the parent's value under `parent_key`, produces the argument
/// name/value pair to send.
#[derive(Clone)]
pub struct ArgumentMapping {
    pub parent_key: String,
    map: ArgumentMapFn,
}

impl ArgumentMapping {
    pub fn new(
        parent_key: impl Into<String>,
        map: impl Fn(InputValue) -> (String, InputValue) + Send + Sync + 'static,
    ) -> Self {
        ArgumentMapping {
            parent_key: parent_key.into(),
            map: Arc::new(map),
        }
    }

    /// Forwards the parent value unchanged under `argument_name`.
    pub fn renamed(parent_key: impl Into<String>, argument_name: impl Into<String>) -> Self {
        let argument_name = argument_name.into();
        ArgumentMapping::new(parent_key, move |value| (argument_name.clone(), value))
    }

    pub fn apply(&self, value: InputValue) -> (String, InputValue) {
        (self.map)(value)
    }
}

impl fmt::Debug for ArgumentMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentMapping")
            .field("parent_key", &self.parent_key)
            .finish()
    }
}

/// Declarative binding of a supergraph field to a subgraph field: "this field
/// is resolved by `source_graph` via its root field `source_field_name`,
/// mapping parent values to arguments".
///
/// A field bound to an `Extend` is resolved entirely by `source_graph`;
/// nested selections may hop to other subgraphs through their own bindings.
#[derive(Clone)]
pub struct Extend {
    pub source_graph: String,
    pub source_field_name: String,
    /// Concrete type the fetched selection is narrowed to, for entity-style
    /// resolution against interface/union-shaped root fields.
    pub target: Option<String>,
    pub argument_mappings: Vec<ArgumentMapping>,
    /// Extra fields added to the sub-selection, typically the keys
    /// `filter_batch_results` matches on.
    pub additional_fields: Vec<String>,
    /// Re-associates batched results with their parents. Its presence enables
    /// batching for this binding.
    pub filter_batch_results: Option<BatchFilterFn>,
}

impl Extend {
    pub fn new(source_graph: impl Into<String>, source_field_name: impl Into<String>) -> Self {
        Extend {
            source_graph: source_graph.into(),
            source_field_name: source_field_name.into(),
            target: None,
            argument_mappings: Vec::new(),
            additional_fields: Vec::new(),
            filter_batch_results: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_argument_mapping(mut self, mapping: ArgumentMapping) -> Self {
        self.argument_mappings.push(mapping);
        self
    }

    pub fn with_additional_fields(mut self, fields: Vec<String>) -> Self {
        self.additional_fields = fields;
        self
    }

    pub fn with_batch_filter(
        mut self,
        filter: impl Fn(&IndexMap<String, Value>, &IndexMap<String, Value>) -> bool
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.filter_batch_results = Some(Arc::new(filter));
        self
    }

    pub fn batch_enabled(&self) -> bool {
        self.filter_batch_results.is_some()
    }
}

impl fmt::Debug for Extend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extend")
            .field("source_graph", &self.source_graph)
            .field("source_field_name", &self.source_field_name)
            .field("target", &self.target)
            .field("argument_mappings", &self.argument_mappings)
            .field("additional_fields", &self.additional_fields)
            .field("batch_enabled", &self.batch_enabled())
            .finish()
    }
}
