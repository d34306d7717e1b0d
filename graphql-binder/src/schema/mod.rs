//! The runtime schema: schema types bound to the methods that compute their fields.

use std::collections::HashMap;
use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexMap;

use crate::invoker::FieldInvoker;
use crate::registry::RegisteredType;
use crate::runtime::Object;
use crate::runtime::RuntimeType;
use crate::scalars::Scalar;

pub(crate) mod builder;

pub use builder::SchemaBuilder;

/// Index of a type in its [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(usize);

/// A reference to a named type of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    pub name: Name,
    pub handle: TypeHandle,
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A named type with its list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrappedType<T> {
    Named(T),
    List(Box<WrappedType<T>>),
    NonNull(Box<WrappedType<T>>),
}

pub type TypeRef = WrappedType<NamedRef>;

impl<T> WrappedType<T> {
    /// Mirrors the wrappers of an AST type around `inner`.
    pub(crate) fn from_ast(ty: &ast::Type, inner: T) -> Self {
        match ty {
            ast::Type::Named(_) => WrappedType::Named(inner),
            ast::Type::NonNullNamed(_) => {
                WrappedType::NonNull(Box::new(WrappedType::Named(inner)))
            }
            ast::Type::List(item) => WrappedType::List(Box::new(Self::from_ast(item, inner))),
            ast::Type::NonNullList(item) => WrappedType::NonNull(Box::new(WrappedType::List(
                Box::new(Self::from_ast(item, inner)),
            ))),
        }
    }

    pub(crate) fn try_map<U, E>(
        self,
        f: impl FnOnce(T) -> Result<U, E>,
    ) -> Result<WrappedType<U>, E> {
        Ok(match self {
            WrappedType::Named(inner) => WrappedType::Named(f(inner)?),
            WrappedType::List(item) => WrappedType::List(Box::new(item.try_map(f)?)),
            WrappedType::NonNull(inner) => WrappedType::NonNull(Box::new(inner.try_map(f)?)),
        })
    }

    pub fn named(&self) -> &T {
        match self {
            WrappedType::Named(inner) => inner,
            WrappedType::List(inner) | WrappedType::NonNull(inner) => inner.named(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, WrappedType::NonNull(_))
    }
}

impl<T: fmt::Display> fmt::Display for WrappedType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrappedType::Named(inner) => write!(f, "{inner}"),
            WrappedType::List(item) => write!(f, "[{item}]"),
            WrappedType::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<serde_json::Value>,
    /// The default as written in the document, which keeps enum values unquoted.
    pub default_literal: Option<Node<ast::Value>>,
}

/// A field as declared on an interface.
#[derive(Debug, Clone)]
pub struct FieldSignature {
    pub name: Name,
    pub description: Option<String>,
    pub deprecation: Option<String>,
    pub arguments: Vec<ArgumentDefinition>,
    pub ty: TypeRef,
}

/// An object type field and the plan computing its value.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub deprecation: Option<String>,
    pub arguments: Vec<ArgumentDefinition>,
    pub ty: TypeRef,
    pub invoker: FieldInvoker,
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: Name,
    pub description: Option<String>,
    /// `None` for root types, which have no source object.
    pub runtime_type: Option<RuntimeType>,
    pub implements: Vec<NamedRef>,
    pub fields: IndexMap<Name, FieldDefinition>,
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: Name,
    pub description: Option<String>,
    pub fields: IndexMap<Name, FieldSignature>,
    pub implementors: Vec<NamedRef>,
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: Name,
    pub description: Option<String>,
    pub members: Vec<NamedRef>,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: Name,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: Name,
    pub description: Option<String>,
    pub runtime_type: Option<RuntimeType>,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub runtime_type: Option<RuntimeType>,
    pub fields: Vec<ArgumentDefinition>,
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: Name,
    pub description: Option<String>,
    pub scalar: Scalar,
}

#[derive(Debug, Clone)]
pub enum NamedType {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
    Scalar(ScalarType),
}

impl NamedType {
    pub fn name(&self) -> &Name {
        match self {
            NamedType::Object(ty) => &ty.name,
            NamedType::Interface(ty) => &ty.name,
            NamedType::Union(ty) => &ty.name,
            NamedType::Enum(ty) => &ty.name,
            NamedType::InputObject(ty) => &ty.name,
            NamedType::Scalar(ty) => &ty.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            NamedType::Object(ty) => ty.description.as_deref(),
            NamedType::Interface(ty) => ty.description.as_deref(),
            NamedType::Union(ty) => ty.description.as_deref(),
            NamedType::Enum(ty) => ty.description.as_deref(),
            NamedType::InputObject(ty) => ty.description.as_deref(),
            NamedType::Scalar(ty) => ty.description.as_deref(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            NamedType::Object(ty) => Some(ty),
            _ => None,
        }
    }
}

/// A built schema. Immutable, and safe to share between concurrent executions.
#[derive(Debug)]
pub struct Schema {
    types: Vec<NamedType>,
    index: IndexMap<Name, TypeHandle>,
    query: TypeHandle,
    mutation: Option<TypeHandle>,
    runtime_objects: HashMap<RuntimeType, TypeHandle>,
    registered: Vec<RegisteredType>,
}

impl Schema {
    pub fn query_type(&self) -> &ObjectType {
        self.root_type(self.query)
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation.map(|handle| self.root_type(handle))
    }

    fn root_type(&self, handle: TypeHandle) -> &ObjectType {
        match self.type_of(handle) {
            Some(NamedType::Object(object)) => object,
            _ => unreachable!("root types are object types"),
        }
    }

    /// The type behind a handle, `None` for a handle issued by another schema.
    pub fn type_of(&self, handle: TypeHandle) -> Option<&NamedType> {
        self.types.get(handle.0)
    }

    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.index
            .get(name)
            .and_then(|handle| self.type_of(*handle))
    }

    pub fn get_object(&self, name: &str) -> Option<&ObjectType> {
        self.get(name)?.as_object()
    }

    pub fn field(&self, type_name: &str, field: &str) -> Option<&FieldDefinition> {
        self.get_object(type_name)?.fields.get(field)
    }

    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.iter()
    }

    /// The object type a runtime value belongs to, for interface and union fields.
    pub fn object_type_of(&self, object: &Object) -> Option<&ObjectType> {
        self.runtime_objects
            .get(&object.runtime_type())
            .and_then(|handle| self.type_of(*handle))
            .and_then(NamedType::as_object)
    }

    /// The types the registry deduplicated, with the signatures that referenced them.
    pub fn registered_types(&self) -> &[RegisteredType] {
        &self.registered
    }
}

fn write_description(
    f: &mut fmt::Formatter<'_>,
    description: Option<&str>,
    indent: &str,
) -> fmt::Result {
    match description {
        Some(description) => writeln!(f, "{indent}\"\"\"{description}\"\"\""),
        None => Ok(()),
    }
}

fn write_deprecation(f: &mut fmt::Formatter<'_>, deprecation: Option<&str>) -> fmt::Result {
    match deprecation {
        Some(reason) => write!(
            f,
            " @deprecated(reason: {})",
            serde_json::Value::from(reason)
        ),
        None => Ok(()),
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[ArgumentDefinition]) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    write!(f, "(")?;
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", argument.name, argument.ty)?;
        if let Some(default) = &argument.default_literal {
            write!(f, " = {}", default.serialize().no_indent())?;
        }
    }
    write!(f, ")")
}

fn join(refs: &[NamedRef], separator: &str) -> String {
    refs.iter()
        .map(|named| named.name.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_description(f, self.description(), "")?;
        match self {
            NamedType::Object(object) => {
                write!(f, "type {}", object.name)?;
                if !object.implements.is_empty() {
                    write!(f, " implements {}", join(&object.implements, " & "))?;
                }
                writeln!(f, " {{")?;
                for field in object.fields.values() {
                    write_description(f, field.description.as_deref(), "  ")?;
                    write!(f, "  {}", field.name)?;
                    write_arguments(f, &field.arguments)?;
                    write!(f, ": {}", field.ty)?;
                    write_deprecation(f, field.deprecation.as_deref())?;
                    writeln!(f)?;
                }
                write!(f, "}}")
            }
            NamedType::Interface(interface) => {
                writeln!(f, "interface {} {{", interface.name)?;
                for field in interface.fields.values() {
                    write_description(f, field.description.as_deref(), "  ")?;
                    write!(f, "  {}", field.name)?;
                    write_arguments(f, &field.arguments)?;
                    write!(f, ": {}", field.ty)?;
                    write_deprecation(f, field.deprecation.as_deref())?;
                    writeln!(f)?;
                }
                write!(f, "}}")
            }
            NamedType::Union(union_) => {
                write!(
                    f,
                    "union {} = {}",
                    union_.name,
                    join(&union_.members, " | ")
                )
            }
            NamedType::Enum(enum_) => {
                writeln!(f, "enum {} {{", enum_.name)?;
                for value in &enum_.values {
                    write_description(f, value.description.as_deref(), "  ")?;
                    write!(f, "  {}", value.name)?;
                    write_deprecation(f, value.deprecation.as_deref())?;
                    writeln!(f)?;
                }
                write!(f, "}}")
            }
            NamedType::InputObject(input) => {
                writeln!(f, "input {} {{", input.name)?;
                for field in &input.fields {
                    write_description(f, field.description.as_deref(), "  ")?;
                    write!(f, "  {}: {}", field.name, field.ty)?;
                    if let Some(default) = &field.default_literal {
                        write!(f, " = {}", default.serialize().no_indent())?;
                    }
                    writeln!(f)?;
                }
                write!(f, "}}")
            }
            NamedType::Scalar(scalar) => write!(f, "scalar {}", scalar.name),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            write!(f, "{ty}")?;
        }
        Ok(())
    }
}
