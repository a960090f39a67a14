use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::extend::Extend;
use crate::schema::{ArgumentDefinition, FieldDefinition, ObjectType, SupergraphSchema};

/// A pluggable transformation over the composed schema. Implementors usually
/// override one of the granular entry points and let the default
/// `visit_schema` drive the walk; transformers that need whole-schema context
/// (adding fields, validating names) override `visit_schema` directly.
pub trait SchemaVisitor: Send + Sync {
    fn visit_schema(&self, schema: &mut SupergraphSchema) -> Result<(), ConfigurationError> {
        for object_type in schema.types.values_mut() {
            self.visit_type(object_type);
            let type_name = object_type.name.clone();
            object_type
                .fields
                .retain(|field| self.retain_field(&type_name, field));
            for field in object_type.fields.iter_mut() {
                self.visit_field(&type_name, field);
                let field_name = field.name.clone();
                for argument in field.arguments.iter_mut() {
                    self.visit_argument(&type_name, &field_name, argument);
                }
            }
        }
        Ok(())
    }

    fn visit_type(&self, _object_type: &mut ObjectType) {}

    fn visit_field(&self, _type_name: &str, _field: &mut FieldDefinition) {}

    fn visit_argument(
        &self,
        _type_name: &str,
        _field_name: &str,
        _argument: &mut ArgumentDefinition,
    ) {
    }

    fn retain_field(&self, _type_name: &str, _field: &FieldDefinition) -> bool {
        true
    }
}

/// Transformer constructors, the user-facing DSL for reshaping the composed
/// supergraph.
pub mod transform {
    use super::*;

    /// Binds `field` on `type_name` to a subgraph via `extend`. The field is
    /// added when the type does not declare it yet, so cross-graph fields
    /// like `Store.bookSells` can be grafted onto an entity type.
    pub fn extend(
        type_name: impl Into<String>,
        field: FieldDefinition,
        extend: Extend,
    ) -> Box<dyn SchemaVisitor> {
        Box::new(ExtendField {
            type_name: type_name.into(),
            field,
            extend: Arc::new(extend),
        })
    }

    /// Removes `field_name` from `type_name`.
    pub fn filter_field(
        type_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Box<dyn SchemaVisitor> {
        Box::new(FilterField {
            type_name: type_name.into(),
            field_name: field_name.into(),
        })
    }

    struct ExtendField {
        type_name: String,
        field: FieldDefinition,
        extend: Arc<Extend>,
    }

    impl SchemaVisitor for ExtendField {
        fn visit_schema(&self, schema: &mut SupergraphSchema) -> Result<(), ConfigurationError> {
            let object_type = schema
                .type_def_mut(&self.type_name)
                .ok_or_else(|| ConfigurationError::UnknownType(self.type_name.clone()))?;
            match object_type.field_mut(&self.field.name) {
                Some(existing) => existing.extend = Some(self.extend.clone()),
                None => {
                    let mut field = self.field.clone();
                    field.extend = Some(self.extend.clone());
                    object_type.fields.push(field);
                }
            }
            Ok(())
        }
    }

    struct FilterField {
        type_name: String,
        field_name: String,
    }

    impl SchemaVisitor for FilterField {
        fn visit_schema(&self, schema: &mut SupergraphSchema) -> Result<(), ConfigurationError> {
            let object_type = schema
                .type_def_mut(&self.type_name)
                .ok_or_else(|| ConfigurationError::UnknownType(self.type_name.clone()))?;
            let before = object_type.fields.len();
            object_type.fields.retain(|field| field.name != self.field_name);
            if object_type.fields.len() == before {
                return Err(ConfigurationError::UnknownField {
                    type_name: self.type_name.clone(),
                    field_name: self.field_name.clone(),
                });
            }
            Ok(())
        }
    }
}
