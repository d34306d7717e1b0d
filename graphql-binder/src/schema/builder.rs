//! Builds a [`Schema`] from a schema document and the application's handler code.
//!
//! Object types are discovered by walking field return types, starting at the root types.
//! Each discovered type gets a binding context, each of its fields a resolved method and a
//! [`FieldInvoker`]. Type references stay symbolic until every type is known, then are
//! rewritten into [`TypeHandle`]s.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::ArgumentDefinition;
use super::EnumType;
use super::EnumValue;
use super::FieldDefinition;
use super::FieldSignature;
use super::InputObjectType;
use super::InterfaceType;
use super::NamedRef;
use super::NamedType;
use super::ObjectType;
use super::ScalarType;
use super::Schema;
use super::TypeHandle;
use super::TypeRef;
use super::UnionType;
use super::WrappedType;
use crate::binding::BindingContext;
use crate::binding::HandlerGroup;
use crate::binding::HandlerTarget;
use crate::binding::Resolver;
use crate::binding::RootOperation;
use crate::configuration::Dictionary;
use crate::configuration::Options;
use crate::error::BuildError;
use crate::invoker::ArgumentSpec;
use crate::invoker::FieldInvoker;
use crate::method::InputConversion;
use crate::method::MethodTable;
use crate::method::Methods;
use crate::method::ParamType;
use crate::registry::RegisteredType;
use crate::registry::TypeReference;
use crate::registry::TypeRegistry;
use crate::registry::TypeSource;
use crate::resolver::MethodResolver;
use crate::resolver::ResolvedField;
use crate::runtime::RuntimeType;
use crate::scalars::Scalar;
use crate::scalars::ScalarKind;
use crate::scalars::ScalarLibrary;

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Scalars every schema has, referenced or not.
const SPECIFIED_SCALARS: [ScalarKind; 5] = [
    ScalarKind::Int,
    ScalarKind::Float,
    ScalarKind::String,
    ScalarKind::Boolean,
    ScalarKind::Id,
];

pub struct SchemaBuilder {
    document: ast::Document,
    handler_groups: Vec<HandlerGroup>,
    data_types: Vec<MethodTable>,
    scalars: ScalarLibrary,
    dictionary: Dictionary,
    options: Options,
}

impl SchemaBuilder {
    pub fn new(document: ast::Document) -> Self {
        Self {
            document,
            handler_groups: Vec::new(),
            data_types: Vec::new(),
            scalars: ScalarLibrary::default(),
            dictionary: Dictionary::default(),
            options: Options::default(),
        }
    }

    /// Parses schema text into the document to build from.
    pub fn parse(sdl: &str) -> Result<Self, BuildError> {
        Ok(Self::new(ast::Document::parse(sdl, "schema.graphql")?))
    }

    pub fn handler_group<R: Resolver>(self, resolver: R) -> Self {
        self.with_handler_group(HandlerGroup::new(resolver))
    }

    pub fn with_handler_group(mut self, group: HandlerGroup) -> Self {
        self.handler_groups.push(group);
        self
    }

    /// Registers the method table of a data type.
    pub fn data_type<D: Methods>(mut self) -> Self {
        self.data_types.push(D::method_table());
        self
    }

    pub fn scalars(mut self, scalars: ScalarLibrary) -> Self {
        self.scalars = scalars;
        self
    }

    pub fn dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Schema, BuildError> {
        let definitions = Definitions::collect(&self.document);
        definitions.check_scalars(&self.scalars)?;
        let (query, mutation) = definitions.root_types(&self.options)?;

        let mut build = Build::new(self, definitions)?;
        if mutation.is_none() && build.roots.contains_key(&RootOperation::Mutation) {
            warn!(
                "mutation handler groups are registered but the schema has no mutation type"
            );
        }

        // root names are claimed before any field can reference them
        build.root_names.insert(query.clone());
        build.root_names.extend(mutation.clone());
        build.discovered.extend(build.root_names.iter().cloned());

        build.add_root(RootOperation::Query, &query)?;
        if let Some(mutation) = &mutation {
            build.add_root(RootOperation::Mutation, mutation)?;
        }
        build.drain()?;
        build.finish(query, mutation)
    }
}

/// An object type with its extensions merged in.
#[derive(Debug, Clone, Default)]
struct ObjectDefinition {
    description: Option<String>,
    implements: Vec<Name>,
    fields: Vec<Node<ast::FieldDefinition>>,
}

/// The type definitions of a document, by kind.
#[derive(Debug, Default)]
struct Definitions {
    schema: Option<Node<ast::SchemaDefinition>>,
    objects: IndexMap<Name, ObjectDefinition>,
    interfaces: IndexMap<Name, Node<ast::InterfaceTypeDefinition>>,
    unions: IndexMap<Name, Node<ast::UnionTypeDefinition>>,
    enums: IndexMap<Name, Node<ast::EnumTypeDefinition>>,
    inputs: IndexMap<Name, Node<ast::InputObjectTypeDefinition>>,
    scalars: IndexMap<Name, Node<ast::ScalarTypeDefinition>>,
}

impl Definitions {
    fn collect(document: &ast::Document) -> Self {
        let mut definitions = Self::default();
        for definition in &document.definitions {
            match definition {
                ast::Definition::SchemaDefinition(schema) => {
                    definitions.schema = Some(schema.clone());
                }
                ast::Definition::ObjectTypeDefinition(object) => {
                    let entry = definitions.objects.entry(object.name.clone()).or_default();
                    entry.description = description(&object.description);
                    entry
                        .implements
                        .extend(object.implements_interfaces.iter().cloned());
                    // extensions seen earlier stay after the base fields
                    let extension_fields = std::mem::take(&mut entry.fields);
                    entry.fields.extend(object.fields.iter().cloned());
                    entry.fields.extend(extension_fields);
                }
                ast::Definition::ObjectTypeExtension(extension) => {
                    let entry = definitions
                        .objects
                        .entry(extension.name.clone())
                        .or_default();
                    entry
                        .implements
                        .extend(extension.implements_interfaces.iter().cloned());
                    entry.fields.extend(extension.fields.iter().cloned());
                }
                ast::Definition::InterfaceTypeDefinition(interface) => {
                    definitions
                        .interfaces
                        .insert(interface.name.clone(), interface.clone());
                }
                ast::Definition::UnionTypeDefinition(union_) => {
                    definitions
                        .unions
                        .insert(union_.name.clone(), union_.clone());
                }
                ast::Definition::EnumTypeDefinition(enum_) => {
                    definitions.enums.insert(enum_.name.clone(), enum_.clone());
                }
                ast::Definition::InputObjectTypeDefinition(input) => {
                    definitions.inputs.insert(input.name.clone(), input.clone());
                }
                ast::Definition::ScalarTypeDefinition(scalar) => {
                    definitions
                        .scalars
                        .insert(scalar.name.clone(), scalar.clone());
                }
                _ => debug!("ignoring a definition that does not declare a type"),
            }
        }
        definitions
    }

    fn check_scalars(&self, library: &ScalarLibrary) -> Result<(), BuildError> {
        match self.scalars.keys().find(|name| !library.contains(name)) {
            Some(scalar) => Err(BuildError::MissingScalar {
                scalar: scalar.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// The query and mutation root type names.
    fn root_types(&self, options: &Options) -> Result<(Name, Option<Name>), BuildError> {
        let (query, mutation) = match &self.schema {
            Some(schema) => {
                let mut query = None;
                let mut mutation = None;
                for root in &schema.root_operations {
                    let (operation, name) = &**root;
                    match operation {
                        ast::OperationType::Query => query = Some(name.clone()),
                        ast::OperationType::Mutation => mutation = Some(name.clone()),
                        ast::OperationType::Subscription => {
                            debug!(type_name = %name, "subscription root is not bound")
                        }
                    }
                }
                (
                    query.map(|name| name.to_string()),
                    mutation.map(|name| name.to_string()),
                )
            }
            None => {
                // conventional names; a missing mutation type is fine
                let mutation = Some(options.mutation_type_name.clone())
                    .filter(|name| self.objects.contains_key(name.as_str()));
                (Some(options.query_type_name.clone()), mutation)
            }
        };

        let query = query.unwrap_or_else(|| options.query_type_name.clone());
        let query = self.root_name(RootOperation::Query, &query)?;
        let mutation = mutation
            .map(|mutation| {
                self.root_name(RootOperation::Mutation, &mutation)
            })
            .transpose()?;
        Ok((query, mutation))
    }

    fn root_name(&self, operation: RootOperation, name: &str) -> Result<Name, BuildError> {
        match self.objects.get_key_value(name) {
            Some((name, _)) => Ok(name.clone()),
            None => Err(BuildError::MissingRootType {
                operation: operation.to_string(),
                type_name: name.to_string(),
            }),
        }
    }

    fn implementors_of(&self, interface: &str) -> Vec<Name> {
        self.objects
            .iter()
            .filter(|(_, object)| {
                object.implements.iter().any(|name| name == interface)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Every named type some field, argument or input field refers to.
    fn referenced_names(&self) -> IndexSet<Name> {
        fn add_field(field: &ast::FieldDefinition, names: &mut IndexSet<Name>) {
            names.insert(field.ty.inner_named_type().clone());
            for argument in &field.arguments {
                names.insert(argument.ty.inner_named_type().clone());
            }
        }

        let mut names = IndexSet::new();
        for object in self.objects.values() {
            for field in &object.fields {
                add_field(field, &mut names);
            }
        }
        for interface in self.interfaces.values() {
            for field in &interface.fields {
                add_field(field, &mut names);
            }
        }
        for input in self.inputs.values() {
            for field in &input.fields {
                names.insert(field.ty.inner_named_type().clone());
            }
        }
        names
    }
}

enum ObjectBinding {
    Root(RootOperation),
    Bound(BindingContext),
}

struct PendingArgument {
    name: Name,
    description: Option<String>,
    ty: WrappedType<TypeReference>,
    default_value: Option<serde_json::Value>,
    default_literal: Option<Node<ast::Value>>,
}

struct PendingField {
    name: Name,
    description: Option<String>,
    deprecation: Option<String>,
    arguments: Vec<PendingArgument>,
    ty: WrappedType<TypeReference>,
    invoker: FieldInvoker,
}

struct PendingObject {
    name: Name,
    description: Option<String>,
    runtime_type: Option<RuntimeType>,
    implements: Vec<Name>,
    fields: Vec<PendingField>,
}

/// State of one schema build.
struct Build {
    definitions: Definitions,
    scalars: ScalarLibrary,
    dictionary: Dictionary,
    options: Options,
    registry: TypeRegistry,
    roots: HashMap<RootOperation, Vec<Arc<HandlerGroup>>>,
    data_groups: IndexMap<RuntimeType, Arc<HandlerGroup>>,
    data_tables: IndexMap<RuntimeType, Arc<MethodTable>>,
    root_names: IndexSet<Name>,
    /// Object types that are queued or built.
    discovered: IndexSet<Name>,
    queue: VecDeque<(Name, RuntimeType)>,
    /// Object types referenced before their runtime type was known. Any still undiscovered
    /// once the walk ends fail the build.
    unbound: IndexSet<Name>,
    reached_abstract: IndexSet<Name>,
    objects: Vec<PendingObject>,
}

impl Build {
    fn new(builder: SchemaBuilder, definitions: Definitions) -> Result<Self, BuildError> {
        let mut roots: HashMap<RootOperation, Vec<Arc<HandlerGroup>>> = HashMap::new();
        let mut data_groups = IndexMap::new();
        for group in builder.handler_groups {
            match group.target() {
                HandlerTarget::Root(operation) => {
                    roots.entry(operation).or_default().push(Arc::new(group));
                }
                HandlerTarget::Data(data_type) => {
                    if data_groups.insert(data_type, Arc::new(group)).is_some() {
                        return Err(BuildError::DuplicateHandlerGroup {
                            data_type: data_type.name().to_string(),
                        });
                    }
                }
            }
        }
        let data_tables = builder
            .data_types
            .into_iter()
            .map(|table| (table.runtime_type(), Arc::new(table)))
            .collect();
        let abstract_types = definitions
            .interfaces
            .keys()
            .chain(definitions.unions.keys())
            .cloned();

        Ok(Self {
            registry: TypeRegistry::new(abstract_types),
            definitions,
            scalars: builder.scalars,
            dictionary: builder.dictionary,
            options: builder.options,
            roots,
            data_groups,
            data_tables,
            root_names: IndexSet::new(),
            discovered: IndexSet::new(),
            queue: VecDeque::new(),
            unbound: IndexSet::new(),
            reached_abstract: IndexSet::new(),
            objects: Vec::new(),
        })
    }

    fn add_root(&mut self, operation: RootOperation, name: &Name) -> Result<(), BuildError> {
        let object = self.build_object(name, ObjectBinding::Root(operation), None)?;
        self.objects.push(object);
        Ok(())
    }

    /// Builds queued object types until no new type is discovered.
    fn drain(&mut self) -> Result<(), BuildError> {
        loop {
            while let Some((name, runtime_type)) = self.queue.pop_front() {
                let binding = self.binding_for(&name, runtime_type)?;
                let object =
                    self.build_object(&name, ObjectBinding::Bound(binding), Some(runtime_type))?;
                self.objects.push(object);
            }
            if !self.expand_abstract_types()? {
                break;
            }
        }
        match self
            .unbound
            .iter()
            .find(|name| !self.discovered.contains(*name))
        {
            Some(name) => Err(BuildError::UnboundType {
                type_name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn binding_for(
        &self,
        name: &Name,
        runtime_type: RuntimeType,
    ) -> Result<BindingContext, BuildError> {
        let data_methods = self.data_tables.get(&runtime_type).cloned();
        if let Some(group) = self.data_groups.get(&runtime_type) {
            return Ok(BindingContext::Data {
                group: group.clone(),
                data_type: runtime_type,
                data_methods,
            });
        }
        data_methods
            .map(|data_methods| BindingContext::Direct { data_methods })
            .ok_or_else(|| BuildError::UnboundType {
                type_name: name.to_string(),
            })
    }

    /// Queues the union members and interface implementors of every reached abstract type.
    /// Returns whether anything was queued.
    fn expand_abstract_types(&mut self) -> Result<bool, BuildError> {
        let mut queued = false;
        let reached: Vec<Name> = self.reached_abstract.iter().cloned().collect();
        for abstract_name in reached {
            let (members, strict, kind) = match self.definitions.unions.get(&abstract_name) {
                Some(union_) => (union_.members.clone(), true, "union"),
                None => (
                    self.definitions.implementors_of(&abstract_name),
                    !self.options.allow_unbound_implementors,
                    "interface",
                ),
            };
            for member in members {
                if self.discovered.contains(&member) {
                    continue;
                }
                if !self.definitions.objects.contains_key(&member) {
                    return Err(BuildError::UnknownTypeNode {
                        type_name: member.to_string(),
                        referenced_by: format!("{kind} `{abstract_name}`"),
                    });
                }
                match self.dictionary.get(&member) {
                    Some(runtime_type) => {
                        self.register_object(
                            &member,
                            runtime_type,
                            TypeSource::dictionary(runtime_type),
                        )?;
                        queued = true;
                    }
                    // a later field may still bind it
                    None if strict => {
                        self.unbound.insert(member);
                    }
                    None => debug!(
                        type_name = %member,
                        interface = %abstract_name,
                        "skipping implementor without a runtime type"
                    ),
                }
            }
        }
        Ok(queued)
    }

    fn register_object(
        &mut self,
        name: &Name,
        runtime_type: RuntimeType,
        source: TypeSource,
    ) -> Result<TypeReference, BuildError> {
        if self.root_names.contains(name) {
            return Ok(TypeReference::Direct(name.clone()));
        }
        let reference = self.registry.register_type(name, runtime_type, source)?;
        if self.discovered.insert(name.clone()) {
            self.queue.push_back((name.clone(), runtime_type));
        }
        Ok(reference)
    }

    fn build_object(
        &mut self,
        name: &Name,
        binding: ObjectBinding,
        runtime_type: Option<RuntimeType>,
    ) -> Result<PendingObject, BuildError> {
        let definition = self
            .definitions
            .objects
            .get(name)
            .cloned()
            .unwrap_or_default();
        self.reached_abstract
            .extend(definition.implements.iter().cloned());

        let mut fields = Vec::with_capacity(definition.fields.len());
        for field in &definition.fields {
            fields.push(self.build_field(name, field, &binding)?);
        }

        Ok(PendingObject {
            name: name.clone(),
            description: definition.description,
            runtime_type,
            implements: definition.implements,
            fields,
        })
    }

    fn build_field(
        &mut self,
        type_name: &Name,
        field: &ast::FieldDefinition,
        binding: &ObjectBinding,
    ) -> Result<PendingField, BuildError> {
        let specs: Vec<ArgumentSpec> = field
            .arguments
            .iter()
            .map(|argument| {
                ArgumentSpec::new(argument.name.as_str(), !argument.ty.is_non_null())
            })
            .collect();

        let resolver = MethodResolver::new(type_name, &field.name);
        let (context, candidate) = match binding {
            ObjectBinding::Root(operation) => {
                let groups = self
                    .roots
                    .get(operation)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                resolver.resolve_root(groups, specs.len())?
            }
            ObjectBinding::Bound(context) => {
                (context.clone(), resolver.resolve(context, specs.len())?)
            }
        };
        let resolved = ResolvedField::new(context, candidate);
        trace!(
            type_name = %type_name,
            field = %field.name,
            method = resolved.method().name(),
            declaring_type = resolved.declaring_type().name(),
            source = ?resolved.source(),
            "resolved field"
        );
        let invoker = FieldInvoker::build(type_name, &field.name, &resolved, &specs)?;

        let label = format!("field `{type_name}.{}`", field.name);
        let output = self.output_reference(field.ty.inner_named_type(), &resolved, &label)?;

        let mut arguments = Vec::with_capacity(field.arguments.len());
        for (index, argument) in field.arguments.iter().enumerate() {
            let param = resolved
                .method()
                .params()
                .get(resolved.argument_index(index));
            let label = format!("argument `{}` of {label}", argument.name);
            let source = TypeSource::new(
                resolved.declaring_type(),
                resolved.method().name(),
                format!("argument `{}`", argument.name),
            );
            let reference =
                self.input_reference(argument.ty.inner_named_type(), param, source, &label)?;
            arguments.push(pending_argument(argument, reference));
        }

        Ok(PendingField {
            name: field.name.clone(),
            description: description(&field.description),
            deprecation: deprecation(&field.directives),
            arguments,
            ty: WrappedType::from_ast(&field.ty, output),
            invoker,
        })
    }

    fn output_reference(
        &mut self,
        named: &Name,
        resolved: &ResolvedField,
        referenced_by: &str,
    ) -> Result<TypeReference, BuildError> {
        let source = || {
            TypeSource::new(
                resolved.declaring_type(),
                resolved.method().name(),
                "return type",
            )
        };
        let returns = resolved.method().returns();
        if self.scalars.contains(named) {
            return Ok(TypeReference::Direct(named.clone()));
        }
        if self.root_names.contains(named) {
            return Ok(TypeReference::Direct(named.clone()));
        }
        if self.definitions.objects.contains_key(named) {
            let runtime_type = returns
                .object_type()
                .or_else(|| self.dictionary.get(named));
            return match runtime_type {
                Some(runtime_type) => self.register_object(named, runtime_type, source()),
                None => {
                    self.unbound.insert(named.clone());
                    Ok(TypeReference::Direct(named.clone()))
                }
            };
        }
        if self.definitions.interfaces.contains_key(named)
            || self.definitions.unions.contains_key(named)
        {
            self.reached_abstract.insert(named.clone());
            return Ok(TypeReference::Direct(named.clone()));
        }
        if self.definitions.enums.contains_key(named) {
            let runtime_type = returns.enum_type().or_else(|| self.dictionary.get(named));
            return match runtime_type {
                Some(runtime_type) => self.registry.register_type(named, runtime_type, source()),
                None => Ok(TypeReference::Direct(named.clone())),
            };
        }
        Err(BuildError::UnknownTypeNode {
            type_name: named.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    fn input_reference(
        &mut self,
        named: &Name,
        param: Option<&ParamType>,
        source: TypeSource,
        referenced_by: &str,
    ) -> Result<TypeReference, BuildError> {
        if self.scalars.contains(named) {
            return Ok(TypeReference::Direct(named.clone()));
        }
        let runtime_type = if self.definitions.enums.contains_key(named) {
            self.dictionary.get(named)
        } else if self.definitions.inputs.contains_key(named) {
            param
                .and_then(ParamType::input_conversion)
                .map(InputConversion::runtime_type)
        } else {
            return Err(BuildError::UnknownTypeNode {
                type_name: named.to_string(),
                referenced_by: referenced_by.to_string(),
            });
        };
        match runtime_type {
            Some(runtime_type) => self.registry.register_type(named, runtime_type, source),
            None => Ok(TypeReference::Direct(named.clone())),
        }
    }

    /// Rewrites every type reference into a handle and assembles the schema.
    fn finish(self, query: Name, mutation: Option<Name>) -> Result<Schema, BuildError> {
        let Build {
            definitions,
            scalars,
            dictionary,
            registry,
            reached_abstract,
            objects,
            ..
        } = self;
        let registered = registry.finish();

        let referenced = definitions.referenced_names();
        let scalar_names = SPECIFIED_SCALARS
            .iter()
            .filter_map(|kind| kind.schema_name())
            .filter_map(|name| Name::new(name).ok())
            .chain(definitions.scalars.keys().cloned())
            .chain(
                referenced
                    .iter()
                    .filter(|name| scalars.contains(name))
                    .cloned(),
            );

        let mut names: IndexSet<Name> = objects.iter().map(|object| object.name.clone()).collect();
        for unreached in definitions
            .objects
            .keys()
            .filter(|name| !names.contains(*name))
        {
            debug!(type_name = %unreached, "skipping object type unreachable from the root types");
        }
        names.extend(
            definitions
                .interfaces
                .keys()
                .chain(definitions.unions.keys())
                .filter(|name| reached_abstract.contains(*name))
                .cloned(),
        );
        names.extend(definitions.enums.keys().cloned());
        names.extend(definitions.inputs.keys().cloned());
        names.extend(scalar_names);

        let finalizer = Finalizer {
            index: names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), TypeHandle(i)))
                .collect(),
            registered: &registered,
            definitions: &definitions,
        };
        let registered_runtime_type = |name: &str| {
            registered
                .iter()
                .find(|registered| registered.name().as_str() == name)
                .map(RegisteredType::runtime_type)
                .or_else(|| dictionary.get(name))
        };

        let mut objects: IndexMap<Name, PendingObject> = objects
            .into_iter()
            .map(|object| (object.name.clone(), object))
            .collect();
        let mut types = Vec::with_capacity(names.len());
        let mut runtime_objects = HashMap::new();
        for name in &names {
            let ty = if let Some(object) = objects.swap_remove(name) {
                if let Some(runtime_type) = object.runtime_type {
                    runtime_objects.insert(runtime_type, TypeHandle(types.len()));
                }
                NamedType::Object(finalizer.object(object)?)
            } else if let Some(interface) = definitions.interfaces.get(name) {
                NamedType::Interface(finalizer.interface(interface)?)
            } else if let Some(union_) = definitions.unions.get(name) {
                NamedType::Union(finalizer.union_(union_))
            } else if let Some(enum_) = definitions.enums.get(name) {
                NamedType::Enum(EnumType {
                    name: name.clone(),
                    description: description(&enum_.description),
                    runtime_type: registered_runtime_type(name.as_str()),
                    values: enum_
                        .values
                        .iter()
                        .map(|value| EnumValue {
                            name: value.value.clone(),
                            description: description(&value.description),
                            deprecation: deprecation(&value.directives),
                        })
                        .collect(),
                })
            } else if let Some(input) = definitions.inputs.get(name) {
                let label = format!("input type `{name}`");
                NamedType::InputObject(InputObjectType {
                    name: name.clone(),
                    description: description(&input.description),
                    runtime_type: registered_runtime_type(name.as_str()),
                    fields: input
                        .fields
                        .iter()
                        .map(|field| finalizer.direct_argument(field, &label))
                        .collect::<Result<_, _>>()?,
                })
            } else {
                let scalar = scalars.get(name).ok_or_else(|| BuildError::MissingScalar {
                    scalar: name.to_string(),
                })?;
                let library_description = match &scalar {
                    Scalar::Custom { description, .. } => description.clone(),
                    Scalar::BuiltIn(_) => None,
                };
                NamedType::Scalar(ScalarType {
                    name: name.clone(),
                    description: definitions
                        .scalars
                        .get(name)
                        .and_then(|scalar| description(&scalar.description))
                        .or(library_description),
                    scalar,
                })
            };
            types.push(ty);
        }

        let query = finalizer.handle(&query)?;
        let mutation = mutation
            .map(|mutation| finalizer.handle(&mutation))
            .transpose()?;
        let index = finalizer.index;
        Ok(Schema {
            types,
            index,
            query,
            mutation,
            runtime_objects,
            registered,
        })
    }
}

struct Finalizer<'a> {
    index: IndexMap<Name, TypeHandle>,
    registered: &'a [RegisteredType],
    definitions: &'a Definitions,
}

impl Finalizer<'_> {
    fn handle(&self, name: &Name) -> Result<TypeHandle, BuildError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| BuildError::UnboundType {
                type_name: name.to_string(),
            })
    }

    fn resolve(
        &self,
        reference: TypeReference,
        referenced_by: &str,
    ) -> Result<NamedRef, BuildError> {
        let name = match reference {
            TypeReference::Slot(slot) => self
                .registered
                .get(slot.index())
                .map(|registered| registered.name().clone())
                .ok_or_else(|| BuildError::UnknownTypeNode {
                    type_name: format!("<slot {}>", slot.index()),
                    referenced_by: referenced_by.to_string(),
                })?,
            TypeReference::Direct(name) => name,
        };
        match self.index.get(&name) {
            Some(handle) => Ok(NamedRef {
                name,
                handle: *handle,
            }),
            None if self.definitions.objects.contains_key(&name) => {
                Err(BuildError::UnboundType {
                    type_name: name.to_string(),
                })
            }
            None => Err(BuildError::UnknownTypeNode {
                type_name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            }),
        }
    }

    fn resolve_type(
        &self,
        ty: WrappedType<TypeReference>,
        referenced_by: &str,
    ) -> Result<TypeRef, BuildError> {
        ty.try_map(|reference| self.resolve(reference, referenced_by))
    }

    fn direct_type(&self, ty: &ast::Type, referenced_by: &str) -> Result<TypeRef, BuildError> {
        let reference = TypeReference::Direct(ty.inner_named_type().clone());
        self.resolve_type(WrappedType::from_ast(ty, reference), referenced_by)
    }

    fn direct_argument(
        &self,
        argument: &ast::InputValueDefinition,
        referenced_by: &str,
    ) -> Result<ArgumentDefinition, BuildError> {
        Ok(ArgumentDefinition {
            name: argument.name.clone(),
            description: description(&argument.description),
            ty: self.direct_type(&argument.ty, referenced_by)?,
            default_value: argument.default_value.as_deref().map(value_to_json),
            default_literal: argument.default_value.clone(),
        })
    }

    fn object(&self, object: PendingObject) -> Result<ObjectType, BuildError> {
        let implements = object
            .implements
            .iter()
            .map(|name| {
                self.resolve(
                    TypeReference::Direct(name.clone()),
                    &format!("object type `{}`", object.name),
                )
            })
            .collect::<Result<_, _>>()?;

        let mut fields = IndexMap::with_capacity(object.fields.len());
        for field in object.fields {
            let label = format!("field `{}.{}`", object.name, field.name);
            let arguments = field
                .arguments
                .into_iter()
                .map(|argument| -> Result<_, BuildError> {
                    Ok(ArgumentDefinition {
                        name: argument.name,
                        description: argument.description,
                        ty: self.resolve_type(argument.ty, &label)?,
                        default_value: argument.default_value,
                        default_literal: argument.default_literal,
                    })
                })
                .collect::<Result<_, _>>()?;
            fields.insert(
                field.name.clone(),
                FieldDefinition {
                    ty: self.resolve_type(field.ty, &label)?,
                    name: field.name,
                    description: field.description,
                    deprecation: field.deprecation,
                    arguments,
                    invoker: field.invoker,
                },
            );
        }

        Ok(ObjectType {
            name: object.name,
            description: object.description,
            runtime_type: object.runtime_type,
            implements,
            fields,
        })
    }

    fn interface(
        &self,
        interface: &ast::InterfaceTypeDefinition,
    ) -> Result<InterfaceType, BuildError> {
        let mut fields = IndexMap::with_capacity(interface.fields.len());
        for field in &interface.fields {
            let label = format!("field `{}.{}`", interface.name, field.name);
            let arguments = field
                .arguments
                .iter()
                .map(|argument| self.direct_argument(argument, &label))
                .collect::<Result<_, _>>()?;
            fields.insert(
                field.name.clone(),
                FieldSignature {
                    name: field.name.clone(),
                    description: description(&field.description),
                    deprecation: deprecation(&field.directives),
                    arguments,
                    ty: self.direct_type(&field.ty, &label)?,
                },
            );
        }

        Ok(InterfaceType {
            name: interface.name.clone(),
            description: description(&interface.description),
            fields,
            implementors: self.bound_refs(self.definitions.implementors_of(&interface.name)),
        })
    }

    fn union_(&self, union_: &ast::UnionTypeDefinition) -> UnionType {
        UnionType {
            name: union_.name.clone(),
            description: description(&union_.description),
            members: self.bound_refs(union_.members.clone()),
        }
    }

    /// References to the given object types, skipping the ones that were never built.
    fn bound_refs(&self, names: Vec<Name>) -> Vec<NamedRef> {
        names
            .into_iter()
            .filter_map(|name| {
                let handle = *self.index.get(&name)?;
                Some(NamedRef { name, handle })
            })
            .collect()
    }
}

fn pending_argument(
    argument: &ast::InputValueDefinition,
    reference: TypeReference,
) -> PendingArgument {
    PendingArgument {
        name: argument.name.clone(),
        description: description(&argument.description),
        ty: WrappedType::from_ast(&argument.ty, reference),
        default_value: argument.default_value.as_deref().map(value_to_json),
        default_literal: argument.default_value.clone(),
    }
}

fn description(description: &Option<Node<str>>) -> Option<String> {
    description.as_deref().map(str::to_string)
}

fn deprecation(directives: &ast::DirectiveList) -> Option<String> {
    let directive = directives.get("deprecated")?;
    let reason = directive
        .specified_argument_by_name("reason")
        .and_then(|reason| reason.as_str())
        .unwrap_or(DEFAULT_DEPRECATION_REASON);
    Some(reason.to_string())
}

fn value_to_json(value: &ast::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        ast::Value::Null => Value::Null,
        ast::Value::Enum(name) => Value::String(name.to_string()),
        ast::Value::Variable(name) => Value::String(format!("${name}")),
        ast::Value::String(string) => Value::String(string.to_string()),
        ast::Value::Float(float) => float
            .as_str()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number),
        ast::Value::Int(int) => int
            .as_str()
            .parse::<i64>()
            .map_or(Value::Null, Value::from),
        ast::Value::Boolean(boolean) => Value::Bool(*boolean),
        ast::Value::List(items) => {
            Value::Array(items.iter().map(|item| value_to_json(item)).collect())
        }
        ast::Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.to_string(), value_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::binding::QueryRoot;
    use crate::method::ReturnType;
    use crate::request::FieldValue;

    fn definitions(sdl: &str) -> Definitions {
        let document = ast::Document::parse(sdl, "schema.graphql")
            .unwrap_or_else(|errors| panic!("invalid test schema: {errors}"));
        Definitions::collect(&document)
    }

    fn field_names(definition: &ObjectDefinition) -> Vec<&str> {
        definition
            .fields
            .iter()
            .map(|field| field.name.as_str())
            .collect()
    }

    #[test]
    fn extensions_are_merged_into_their_object_type() {
        let definitions = definitions(
            r#"
            extend type Query implements Node { late: Int }
            type Query { id: ID! }
            interface Node { id: ID! }
            extend type Query { later: Int }
            "#,
        );
        let query = &definitions.objects["Query"];
        assert_eq!(field_names(query), ["id", "late", "later"]);
        assert_eq!(query.implements, [apollo_compiler::name!("Node")]);
        assert_eq!(
            definitions.implementors_of("Node"),
            [apollo_compiler::name!("Query")]
        );
    }

    #[test]
    fn conventional_root_names_are_used_without_a_schema_definition() {
        let definitions = definitions("type Query { a: Int } type Mutation { b: Int }");
        let (query, mutation) = definitions
            .root_types(&Options::default())
            .unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(query.as_str(), "Query");
        assert_eq!(mutation.as_deref(), Some("Mutation"));

        let definitions = self::definitions("type Query { a: Int }");
        assert!(matches!(
            definitions.root_types(&Options::default()),
            Ok((_, None))
        ));
    }

    #[test]
    fn schema_definition_names_the_roots() {
        let definitions = definitions(
            "schema { query: Root mutation: Change } type Root { a: Int } type Change { b: Int }",
        );
        let roots = definitions.root_types(&Options::default());
        assert!(matches!(
            roots,
            Ok((query, Some(mutation))) if query.as_str() == "Root" && mutation.as_str() == "Change"
        ));
    }

    #[test]
    fn declared_root_must_exist() {
        let definitions = definitions("schema { query: Root } type Query { a: Int }");
        let error = definitions.root_types(&Options::default());
        assert!(matches!(
            error,
            Err(BuildError::MissingRootType { type_name, .. }) if type_name == "Root"
        ));
    }

    #[test]
    fn declared_scalars_must_be_in_the_library() {
        let definitions = definitions("scalar Long scalar Date type Query { a: Date }");
        let error = definitions.check_scalars(&ScalarLibrary::default());
        assert!(matches!(
            error,
            Err(BuildError::MissingScalar { scalar }) if scalar == "Date"
        ));
    }

    #[test]
    fn deprecation_reason_defaults() {
        let definitions = definitions(
            r#"
            type Query {
              a: Int @deprecated
              b: Int @deprecated(reason: "use c")
              c: Int
            }
            "#,
        );
        let reasons: Vec<_> = definitions.objects["Query"]
            .fields
            .iter()
            .map(|field| deprecation(&field.directives))
            .collect();
        assert_eq!(
            reasons,
            [
                Some(DEFAULT_DEPRECATION_REASON.to_string()),
                Some("use c".to_string()),
                None
            ]
        );
    }

    #[test]
    fn default_values_become_json() {
        let definitions = definitions(
            r#"
            enum Color { RED }
            type Query {
              f(a: Int = 3, b: [Float] = [1.5], c: Color = RED, d: String = null, e: Point = {x: 1, label: "p"}): Int
            }
            input Point { x: Int label: String }
            "#,
        );
        let defaults: Vec<_> = definitions.objects["Query"].fields[0]
            .arguments
            .iter()
            .map(|argument| {
                argument.default_value.as_deref().map(value_to_json)
            })
            .collect();
        assert_eq!(
            defaults,
            [
                Some(json!(3)),
                Some(json!([1.5])),
                Some(json!("RED")),
                Some(json!(null)),
                Some(json!({"x": 1, "label": "p"})),
            ]
        );
    }

    struct Query;

    impl Methods for Query {
        fn method_table() -> MethodTable {
            MethodTable::builder::<Self>()
                .method(
                    "hello",
                    [],
                    ReturnType::Scalar(ScalarKind::String),
                    |_, _| Ok("world".into()),
                )
                .build()
        }
    }

    impl Resolver for Query {
        type Data = QueryRoot;
    }

    #[test]
    #[traced_test]
    fn unreached_object_types_are_left_out() {
        let schema = SchemaBuilder::parse("type Query { hello: String } type Orphan { a: Int }")
            .map(|builder| builder.handler_group(Query))
            .and_then(SchemaBuilder::build)
            .unwrap_or_else(|error| panic!("{error}"));
        assert!(schema.get("Orphan").is_none());
        assert!(schema.get("Boolean").is_some());
        assert!(logs_contain("resolved field"));
        assert!(
            logs_contain("skipping object type unreachable from the root types")
        );
    }

    #[test]
    #[traced_test]
    fn mutation_groups_without_a_mutation_type_are_reported() {
        struct Mutation;

        impl Methods for Mutation {
            fn method_table() -> MethodTable {
                MethodTable::builder::<Self>().build()
            }
        }

        impl Resolver for Mutation {
            type Data = crate::binding::MutationRoot;
        }

        let schema = SchemaBuilder::parse("type Query { hello: String }")
            .map(|builder| {
                builder.handler_group(Query).handler_group(Mutation)
            })
            .and_then(SchemaBuilder::build);
        assert!(schema.is_ok_and(|schema| schema.mutation_type().is_none()));
        assert!(logs_contain("the schema has no mutation type"));
    }

    #[test]
    fn query_fields_invoke_the_root_group() {
        let schema = SchemaBuilder::parse("type Query { hello: String }")
            .map(|builder| builder.handler_group(Query))
            .and_then(SchemaBuilder::build)
            .unwrap_or_else(|error| panic!("{error}"));
        let value = schema
            .field("Query", "hello")
            .map(|field| field.invoker.invoke(&Default::default()));
        assert!(matches!(
            value,
            Some(Ok(FieldValue::Value(value))) if value == "world"
        ));
    }
}
