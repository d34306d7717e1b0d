//! Deduplicates the runtime types discovered while walking field types.
//!
//! Every schema type name maps to one slot. A slot is handed out the first time the name is
//! seen, so fields may reference types that are only described later, including themselves.
//! Slots are turned into concrete type handles once the whole schema is known.

use std::fmt;

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::BuildError;
use crate::runtime::RuntimeType;

/// Index of a registered type, stable for the lifetime of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeSlot(usize);

impl TypeSlot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A placeholder for a named type, resolved when the schema is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeReference {
    Slot(TypeSlot),
    /// Types outside the registry: interfaces, unions, scalars, and enum or input object
    /// types no runtime type was declared for.
    Direct(Name),
}

/// The method whose signature introduced a runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSource {
    pub declaring_type: RuntimeType,
    pub method: String,
    pub description: String,
}

impl TypeSource {
    pub fn new(
        declaring_type: RuntimeType,
        method: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            declaring_type,
            method: method.into(),
            description: description.into(),
        }
    }

    /// A type bound through the dictionary rather than a method signature.
    pub fn dictionary(runtime_type: RuntimeType) -> Self {
        Self::new(runtime_type, "", "dictionary entry")
    }
}

impl fmt::Display for TypeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.method.is_empty() {
            return write!(
                f,
                "{} for `{}`",
                self.description,
                self.declaring_type.short_name()
            );
        }
        write!(
            f,
            "{} of `{}::{}`",
            self.description,
            self.declaring_type.short_name(),
            self.method
        )
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredType {
    name: Name,
    runtime_type: RuntimeType,
    references: Vec<TypeSource>,
}

impl RegisteredType {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// Every method signature that referenced this type, in discovery order.
    pub fn references(&self) -> &[TypeSource] {
        &self.references
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    abstract_types: IndexSet<Name>,
    types: Mutex<IndexMap<Name, RegisteredType>>,
}

impl TypeRegistry {
    /// `abstract_types` lists the interface and union names, which are never deduplicated.
    pub fn new(abstract_types: impl IntoIterator<Item = Name>) -> Self {
        Self {
            abstract_types: abstract_types.into_iter().collect(),
            types: Mutex::default(),
        }
    }

    pub fn register_type(
        &self,
        name: &Name,
        runtime_type: RuntimeType,
        source: TypeSource,
    ) -> Result<TypeReference, BuildError> {
        if self.abstract_types.contains(name) {
            return Ok(TypeReference::Direct(name.clone()));
        }

        let mut types = self.types.lock();
        let entry = types.entry(name.clone());
        let slot = TypeSlot(entry.index());
        match entry {
            indexmap::map::Entry::Occupied(mut occupied) => {
                let registered = occupied.get_mut();
                if registered.runtime_type != runtime_type {
                    let existing_source = registered
                        .references
                        .first()
                        .map_or_else(|| "an earlier reference".to_string(), ToString::to_string);
                    return Err(BuildError::ConflictingTypeDefinition {
                        type_name: name.to_string(),
                        existing: registered.runtime_type.name().to_string(),
                        existing_source,
                        conflicting: runtime_type.name().to_string(),
                        conflicting_source: source.to_string(),
                    });
                }
                registered.references.push(source);
            }
            indexmap::map::Entry::Vacant(vacant) => {
                trace!(
                    type_name = %name,
                    runtime_type = runtime_type.name(),
                    %source,
                    "registered type"
                );
                vacant.insert(RegisteredType {
                    name: name.clone(),
                    runtime_type,
                    references: vec![source],
                });
            }
        }
        Ok(TypeReference::Slot(slot))
    }

    /// The slot of an already registered type.
    pub fn lookup(&self, name: &str) -> Option<TypeReference> {
        self.types
            .lock()
            .get_index_of(name)
            .map(|index| TypeReference::Slot(TypeSlot(index)))
    }

    pub fn runtime_type(&self, name: &str) -> Option<RuntimeType> {
        self.types
            .lock()
            .get(name)
            .map(|registered| registered.runtime_type)
    }

    pub fn len(&self) -> usize {
        self.types.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ends registration. Slot `n` of the build is entry `n` of the result.
    pub fn finish(self) -> Vec<RegisteredType> {
        self.types.into_inner().into_values().collect()
    }
}
