//! Built-in and application-provided scalar types.

use apollo_compiler::Name;
use indexmap::IndexMap;

use crate::runtime::RuntimeType;

/// The built-in scalars, keyed by their schema name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Long,
    Float,
    String,
    Boolean,
    Id,
    BigInteger,
    BigDecimal,
    Byte,
    Short,
    Char,
    /// Any application-provided scalar.
    Custom,
}

impl ScalarKind {
    pub const BUILT_IN: [ScalarKind; 11] = [
        ScalarKind::Int,
        ScalarKind::Long,
        ScalarKind::Float,
        ScalarKind::String,
        ScalarKind::Boolean,
        ScalarKind::Id,
        ScalarKind::BigInteger,
        ScalarKind::BigDecimal,
        ScalarKind::Byte,
        ScalarKind::Short,
        ScalarKind::Char,
    ];

    pub fn schema_name(self) -> Option<&'static str> {
        Some(match self {
            ScalarKind::Int => "Int",
            ScalarKind::Long => "Long",
            ScalarKind::Float => "Float",
            ScalarKind::String => "String",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Id => "ID",
            ScalarKind::BigInteger => "BigInteger",
            ScalarKind::BigDecimal => "BigDecimal",
            ScalarKind::Byte => "Byte",
            ScalarKind::Short => "Short",
            ScalarKind::Char => "Char",
            ScalarKind::Custom => return None,
        })
    }

    pub fn from_schema_name(name: &str) -> Option<Self> {
        Self::BUILT_IN
            .into_iter()
            .find(|kind| kind.schema_name() == Some(name))
    }
}

/// A scalar implemented by the application.
#[derive(Debug, Clone)]
pub struct CustomScalar {
    pub name: Name,
    pub description: Option<String>,
    /// The Rust type values of this scalar are represented with, if any.
    pub runtime_type: Option<RuntimeType>,
}

impl CustomScalar {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            description: None,
            runtime_type: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_runtime_type(mut self, runtime_type: RuntimeType) -> Self {
        self.runtime_type = Some(runtime_type);
        self
    }
}

/// A resolved scalar definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    BuiltIn(ScalarKind),
    Custom {
        name: Name,
        description: Option<String>,
    },
}

/// The scalar table consulted before object, interface, union and enum resolution.
#[derive(Debug, Clone, Default)]
pub struct ScalarLibrary {
    custom: IndexMap<Name, CustomScalar>,
}

impl ScalarLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom scalar. A custom scalar shadows a built-in one of the same name.
    pub fn with_scalar(mut self, scalar: CustomScalar) -> Self {
        self.custom.insert(scalar.name.clone(), scalar);
        self
    }

    pub fn get(&self, name: &str) -> Option<Scalar> {
        if let Some(custom) = self.custom.get(name) {
            return Some(Scalar::Custom {
                name: custom.name.clone(),
                description: custom.description.clone(),
            });
        }
        ScalarKind::from_schema_name(name).map(Scalar::BuiltIn)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
