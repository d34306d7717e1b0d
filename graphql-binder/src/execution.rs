//! Resolves the selected fields of one object.
//!
//! A field in error contributes no value and one error record; its siblings are resolved
//! regardless.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::FieldError;
use crate::error::GraphQLError;
use crate::request::ArgumentMap;
use crate::request::FieldValue;
use crate::request::RequestContext;
use crate::runtime::Object;
use crate::schema::Schema;

/// One field requested on an object.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSelection {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: ArgumentMap,
}

impl FieldSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn argument(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// The key the field's value is returned under.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// The fields of one object that resolved, and an error for each that did not.
#[derive(Clone, Debug, Default)]
pub struct ObjectResult {
    pub data: IndexMap<String, FieldValue>,
    pub errors: Vec<GraphQLError>,
}

impl ObjectResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Schema {
    /// Invokes the selected fields of `type_name` on `source`, `None` for a root type.
    pub fn resolve_object(
        &self,
        type_name: &str,
        source: Option<Object>,
        selections: &[FieldSelection],
        extensions: Arc<http::Extensions>,
    ) -> ObjectResult {
        let mut result = ObjectResult::default();
        let object = self.get_object(type_name);

        for selection in selections {
            let key = selection.response_key();
            let resolved = object
                .and_then(|object| object.fields.get(selection.name.as_str()))
                .ok_or_else(|| FieldError::UnknownField {
                    type_name: type_name.to_string(),
                    field: selection.name.clone(),
                })
                .and_then(|field| {
                    let mut context = RequestContext::new()
                        .with_arguments(selection.arguments.clone())
                        .with_extensions(extensions.clone());
                    if let Some(source) = &source {
                        context = context.with_source(source.clone());
                    }
                    field.invoker.invoke(&context)
                });

            match resolved {
                Ok(value) => {
                    result.data.insert(key.to_string(), value);
                }
                Err(error) => {
                    debug!(type_name, field = %selection.name, %error, "field resolution failed");
                    result
                        .errors
                        .push(error.to_graphql_error(vec![key.to_string()]));
                }
            }
        }
        result
    }
}
