//! Handler groups and the binding contexts fields are resolved in.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::method::MethodTable;
use crate::method::Methods;
use crate::runtime::Object;
use crate::runtime::RuntimeType;

/// `Resolver::Data` of a handler group answering query root fields.
pub enum QueryRoot {}

/// `Resolver::Data` of a handler group answering mutation root fields.
pub enum MutationRoot {}

/// Handler logic for one schema type.
///
/// `Data` names the data type the group augments, or one of the root markers
/// ([`QueryRoot`], [`MutationRoot`]) for a group answering root fields directly.
pub trait Resolver: Methods {
    type Data: Any + Send + Sync;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootOperation {
    Query,
    Mutation,
}

impl fmt::Display for RootOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RootOperation::Query => "query",
            RootOperation::Mutation => "mutation",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerTarget {
    Root(RootOperation),
    Data(RuntimeType),
}

/// An application-supplied handler instance along with its method table.
#[derive(Debug, Clone)]
pub struct HandlerGroup {
    instance: Object,
    methods: Arc<MethodTable>,
    target: HandlerTarget,
}

impl HandlerGroup {
    pub fn new<R: Resolver>(resolver: R) -> Self {
        let data_type = RuntimeType::of::<R::Data>();
        let target = if data_type == RuntimeType::of::<QueryRoot>() {
            HandlerTarget::Root(RootOperation::Query)
        } else if data_type == RuntimeType::of::<MutationRoot>() {
            HandlerTarget::Root(RootOperation::Mutation)
        } else {
            HandlerTarget::Data(data_type)
        };
        Self {
            instance: Object::new(resolver),
            methods: Arc::new(R::method_table()),
            target,
        }
    }

    pub fn instance(&self) -> &Object {
        &self.instance
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.instance.runtime_type()
    }

    pub fn target(&self) -> HandlerTarget {
        self.target
    }
}

/// Where the methods of one schema type are looked up.
#[derive(Debug, Clone)]
pub(crate) enum BindingContext {
    /// A root handler group answers the fields itself.
    Root { group: Arc<HandlerGroup> },
    /// A handler group augments a data type; the data type's own methods are the fallback.
    Data {
        group: Arc<HandlerGroup>,
        data_type: RuntimeType,
        data_methods: Option<Arc<MethodTable>>,
    },
    /// A data type answers its fields from its own methods.
    Direct { data_methods: Arc<MethodTable> },
}

impl BindingContext {
    /// The runtime type source objects of this binding must have, if any.
    pub(crate) fn data_type(&self) -> Option<RuntimeType> {
        match self {
            BindingContext::Root { .. } => None,
            BindingContext::Data { data_type, .. } => Some(*data_type),
            BindingContext::Direct { data_methods } => Some(data_methods.runtime_type()),
        }
    }
}
