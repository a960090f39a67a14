use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::extend::Extend;
use crate::value::{InputValue, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn keyword(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One node of the selection tree the resolver walks.
///
/// `resolver` is empty on a freshly parsed selection and gets bound against
/// the supergraph schema before execution.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// The key this selection appears under in the response. Defaults to
    /// `name`, differs when the query used an alias.
    pub output_name: String,
    pub arguments: Vec<(String, InputValue)>,
    pub fields: Vec<Field>,
    /// Concrete type names this selection is narrowed to, from an enclosing
    /// inline fragment or an entity fetch target.
    pub targets: Option<Vec<String>>,
    /// Marks a synthetic pass-through selection: a singleton list produced by
    /// an entity fetch is unwrapped into this selection's result.
    pub eliminate: bool,
    pub resolver: Option<Resolver>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Field {
            output_name: name.clone(),
            name,
            arguments: Vec::new(),
            fields: Vec::new(),
            targets: None,
            eliminate: false,
            resolver: None,
        }
    }

    pub fn with_alias(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = output_name.into();
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: InputValue) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }
}

/// How a selection obtains its value: a projection out of the parent object,
/// or a fetch against another subgraph. Dispatch is a tag match so the hot
/// path stays predictable.
#[derive(Clone)]
pub enum Resolver {
    Extract(Extractor),
    Fetch(Arc<Extend>),
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Extract(_) => f.write_str("Extract"),
            Resolver::Fetch(extend) => f.debug_tuple("Fetch").field(extend).finish(),
        }
    }
}

/// A pure projection from an already-fetched parent object. Never does I/O.
#[derive(Clone)]
pub struct Extractor {
    project: Arc<dyn Fn(&IndexMap<String, Value>) -> Value + Send + Sync>,
}

impl Extractor {
    pub fn new(project: impl Fn(&IndexMap<String, Value>) -> Value + Send + Sync + 'static) -> Self {
        Extractor {
            project: Arc::new(project),
        }
    }

    /// Named-field lookup, the common case.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Extractor::new(move |parent| parent.get(&name).cloned().unwrap_or(Value::Null))
    }

    /// Returns the parent object itself. Used by the pass-through selection
    /// an entity fetch is unwrapped into.
    pub fn identity() -> Self {
        Extractor::new(|parent| Value::Object(parent.clone()))
    }

    pub fn project(&self, parent: &IndexMap<String, Value>) -> Value {
        (self.project)(parent)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extractor")
    }
}
