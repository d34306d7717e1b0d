//! Schema build and field resolution errors.
//!
//! Build errors are fatal: a failed build never produces a schema. Field errors only concern
//! the field being resolved and are reported next to the values of its siblings.

use apollo_compiler::ast::Document;
use apollo_compiler::validation::WithErrors;
use displaydoc::Display;
use heck::ToShoutySnakeCase;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Error types for schema construction.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// no method found for field `{type_name}.{field}`: looked for {candidates} taking {expected} parameter(s) on {searched}
    NoSuchMethod {
        /// The schema type owning the field.
        type_name: String,
        /// The schema field name.
        field: String,
        /// The method names that were tried, in precedence order.
        candidates: String,
        /// The accepted parameter counts.
        expected: String,
        /// The runtime types that were searched.
        searched: String,
    },

    /// method `{method}` resolving `{type_name}.{field}` takes {parameters} parameter(s) which cannot bind {arguments} schema argument(s)
    ArgumentCountMismatch {
        type_name: String,
        field: String,
        method: String,
        parameters: usize,
        arguments: usize,
    },

    /// type `{type_name}` is bound to `{existing}` by {existing_source} but to `{conflicting}` by {conflicting_source}
    ConflictingTypeDefinition {
        type_name: String,
        existing: String,
        existing_source: String,
        conflicting: String,
        conflicting_source: String,
    },

    /// unknown type `{type_name}` referenced by {referenced_by}
    UnknownTypeNode {
        type_name: String,
        referenced_by: String,
    },

    /// the {operation} root type `{type_name}` is not defined in the schema
    MissingRootType {
        operation: String,
        type_name: String,
    },

    /// no handler group or data type is bound to object type `{type_name}`
    UnboundType { type_name: String },

    /// scalar `{scalar}` is declared by the schema but missing from the scalar library
    MissingScalar { scalar: String },

    /// more than one handler group augments data type `{data_type}`
    DuplicateHandlerGroup { data_type: String },

    /// schema document could not be parsed: {message}
    Parse { message: String },
}

impl From<WithErrors<Document>> for BuildError {
    fn from(invalid: WithErrors<Document>) -> Self {
        BuildError::Parse {
            message: invalid.errors.to_string(),
        }
    }
}

/// Error types for field resolution.
///
/// These are never fatal for the request: the field in error gets no value and one error
/// record, see [`FieldError::to_graphql_error`].
#[derive(Error, Display, Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum FieldError {
    /// missing required argument `{argument}` for field `{field}`
    MissingRequiredArgument {
        /// The field being resolved.
        field: String,
        /// The non-nullable argument that was not supplied.
        argument: String,
    },

    /// field `{field}` expected a source object of type `{expected}` but got `{found}`
    SourceTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// argument `{argument}` of field `{field}` could not be converted: {reason}
    ArgumentConversion {
        field: String,
        argument: String,
        reason: String,
    },

    /// type `{type_name}` has no field `{field}`
    UnknownField { type_name: String, field: String },

    /// {message}
    Resolver { message: String },
}

impl FieldError {
    /// A failure reported by handler code.
    pub fn resolver(message: impl Into<String>) -> Self {
        FieldError::Resolver {
            message: message.into(),
        }
    }

    pub fn extension_code(&self) -> String {
        match self {
            FieldError::MissingRequiredArgument { .. } => "MissingRequiredArgument",
            FieldError::SourceTypeMismatch { .. } => "SourceTypeMismatch",
            FieldError::ArgumentConversion { .. } => "ArgumentConversion",
            FieldError::UnknownField { .. } => "UnknownField",
            FieldError::Resolver { .. } => "ResolverError",
        }
        .to_shouty_snake_case()
    }

    /// Convert the field error to a GraphQL error record.
    pub fn to_graphql_error(&self, path: Vec<String>) -> GraphQLError {
        let value = serde_json::to_value(self).unwrap_or_default();
        let mut extensions = match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        extensions.remove("message");
        extensions
            .entry("code")
            .or_insert_with(|| self.extension_code().into());

        GraphQLError {
            message: self.to_string(),
            path,
            extensions,
        }
    }
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors) record for one field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// The response keys leading to the field in error.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,

    /// The optional GraphQL extensions for this error.
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}
