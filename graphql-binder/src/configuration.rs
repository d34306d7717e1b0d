//! Build options and the type dictionary.

use apollo_compiler::Name;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::runtime::RuntimeType;

/// Schema build options.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Options {
    /// Name of the query root type when the schema has no `schema` declaration.
    pub query_type_name: String,

    /// Name of the mutation root type when the schema has no `schema` declaration.
    pub mutation_type_name: String,

    /// Skip interface implementors without a known runtime type instead of failing the build.
    pub allow_unbound_implementors: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            query_type_name: "Query".to_string(),
            mutation_type_name: "Mutation".to_string(),
            allow_unbound_implementors: false,
        }
    }
}

/// Runtime types of enum and object types that no method signature names.
///
/// Typical entries are union members and interface implementors, whose fields are declared
/// with an abstract return type.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    types: IndexMap<Name, RuntimeType>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type<T: std::any::Any>(mut self, name: Name) -> Self {
        self.types.insert(name, RuntimeType::of::<T>());
        self
    }

    pub fn insert(&mut self, name: Name, runtime_type: RuntimeType) -> Option<RuntimeType> {
        self.types.insert(name, runtime_type)
    }

    pub fn get(&self, name: &str) -> Option<RuntimeType> {
        self.types.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &RuntimeType)> {
        self.types.iter()
    }
}
