use std::sync::Arc;

use indexmap::IndexMap;

use crate::executors::common::SubgraphExecutorBoxedArc;
use crate::extend::Extend;
use crate::selection::OperationType;

pub mod compose;
pub mod visitor;

/// An argument a field accepts, as introspected from a subgraph.
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: String,
    pub type_name: String,
}

/// A field of an object type. `type_name` is the named type with list and
/// non-null wrappers stripped; `list` remembers whether the field yields a
/// list. `extend` is the subgraph binding the resolver routes on.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub type_name: String,
    pub list: bool,
    pub arguments: Vec<ArgumentDefinition>,
    pub extend: Option<Arc<Extend>>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        FieldDefinition {
            name: name.into(),
            type_name: type_name.into(),
            list: false,
            arguments: Vec::new(),
            extend: None,
        }
    }

    pub fn list(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        FieldDefinition {
            list: true,
            ..FieldDefinition::new(name, type_name)
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.arguments.push(ArgumentDefinition {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDefinition> {
        self.fields.iter_mut().find(|field| field.name == name)
    }
}

/// One subgraph's schema as introspected by the host: its operation roots
/// plus the object types reachable from them.
#[derive(Debug, Clone, Default)]
pub struct SubgraphSchema {
    pub query_type: Option<ObjectType>,
    pub mutation_type: Option<ObjectType>,
    pub subscription_type: Option<ObjectType>,
    pub types: Vec<ObjectType>,
}

impl SubgraphSchema {
    pub fn new() -> Self {
        SubgraphSchema::default()
    }

    pub fn with_query_type(mut self, query_type: ObjectType) -> Self {
        self.query_type = Some(query_type);
        self
    }

    pub fn with_mutation_type(mut self, mutation_type: ObjectType) -> Self {
        self.mutation_type = Some(mutation_type);
        self
    }

    pub fn with_subscription_type(mut self, subscription_type: ObjectType) -> Self {
        self.subscription_type = Some(subscription_type);
        self
    }

    pub fn with_type(mut self, object_type: ObjectType) -> Self {
        self.types.push(object_type);
        self
    }

    pub(crate) fn root_type_names(&self) -> Vec<&str> {
        [
            self.query_type.as_ref(),
            self.mutation_type.as_ref(),
            self.subscription_type.as_ref(),
        ]
        .into_iter()
        .flatten()
        .map(|root| root.name.as_str())
        .collect()
    }
}

/// The merged schema the gateway serves. Root types live in `types` under
/// their canonical names; `query_type` and friends point at them.
#[derive(Debug, Clone, Default)]
pub struct SupergraphSchema {
    pub types: IndexMap<String, ObjectType>,
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
}

impl SupergraphSchema {
    pub fn type_def(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    pub fn type_def_mut(&mut self, name: &str) -> Option<&mut ObjectType> {
        self.types.get_mut(name)
    }

    pub fn root_type_name(&self, operation_type: OperationType) -> Option<&str> {
        match operation_type {
            OperationType::Query => self.query_type.as_deref(),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    pub fn root_type(&self, operation_type: OperationType) -> Option<&ObjectType> {
        self.root_type_name(operation_type)
            .and_then(|name| self.types.get(name))
    }
}

/// A named backend GraphQL service: its schema, its transport, and whether
/// its root fields are exposed on the supergraph or reachable only through
/// extend bindings.
#[derive(Clone)]
pub struct Subgraph {
    pub name: String,
    pub schema: SubgraphSchema,
    pub expose_at_root: bool,
    pub executor: SubgraphExecutorBoxedArc,
}

impl Subgraph {
    pub fn new(
        name: impl Into<String>,
        schema: SubgraphSchema,
        executor: SubgraphExecutorBoxedArc,
    ) -> Self {
        Subgraph {
            name: name.into(),
            schema,
            expose_at_root: true,
            executor,
        }
    }

    pub fn with_expose_at_root(mut self, expose_at_root: bool) -> Self {
        self.expose_at_root = expose_at_root;
        self
    }
}
