//! Static method tables.
//!
//! Handler groups and data types publish the methods the binder may call through a
//! [`MethodTable`]: an enumerable list of names, parameter types and return types, together
//! with the function that performs the call.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FieldError;
use crate::request::FieldValue;
use crate::request::RequestContext;
use crate::runtime::Object;
use crate::runtime::RuntimeType;
use crate::scalars::ScalarKind;

/// A type publishing the methods the binder may resolve fields with.
pub trait Methods: Any + Send + Sync + Sized {
    fn method_table() -> MethodTable;
}

type CallFn = dyn Fn(&Object, &Arguments) -> Result<FieldValue, FieldError> + Send + Sync;

/// Converts a structural (key-value) argument into a concrete Rust type.
#[derive(Clone)]
pub struct InputConversion {
    runtime_type: RuntimeType,
    convert: fn(Value) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error>,
}

impl InputConversion {
    pub fn of<T: DeserializeOwned + Any + Send + Sync>() -> Self {
        fn convert<T: DeserializeOwned + Any + Send + Sync>(
            value: Value,
        ) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error> {
            Ok(Box::new(serde_json::from_value::<T>(value)?))
        }

        Self {
            runtime_type: RuntimeType::of::<T>(),
            convert: convert::<T>,
        }
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    pub fn convert(&self, value: Value) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error> {
        (self.convert)(value)
    }
}

impl fmt::Debug for InputConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InputConversion")
            .field(&self.runtime_type)
            .finish()
    }
}

/// The static type of one method parameter.
#[derive(Clone, Debug)]
pub enum ParamType {
    Scalar(ScalarKind),
    /// A generic key-value or otherwise untyped value, passed through unchanged.
    Structural,
    /// A concrete type structural values are converted into.
    Input(InputConversion),
    List(Box<ParamType>),
    /// The data object a handler group augments.
    Data(RuntimeType),
    RequestContext,
}

impl ParamType {
    pub fn input<T: DeserializeOwned + Any + Send + Sync>() -> Self {
        ParamType::Input(InputConversion::of::<T>())
    }

    pub fn list(item: ParamType) -> Self {
        ParamType::List(Box::new(item))
    }

    pub fn data<T: Any>() -> Self {
        ParamType::Data(RuntimeType::of::<T>())
    }

    pub fn is_request_context(&self) -> bool {
        matches!(self, ParamType::RequestContext)
    }

    /// The conversion applied to the innermost item, if any.
    pub fn input_conversion(&self) -> Option<&InputConversion> {
        match self {
            ParamType::Input(conversion) => Some(conversion),
            ParamType::List(item) => item.input_conversion(),
            _ => None,
        }
    }
}

/// The static return type of a method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnType {
    Scalar(ScalarKind),
    Optional(Box<ReturnType>),
    List(Box<ReturnType>),
    Object(RuntimeType),
    Enum(RuntimeType),
    /// Values implementing an interface or belonging to a union.
    Abstract,
    Structural,
}

impl ReturnType {
    pub fn object<T: Any>() -> Self {
        ReturnType::Object(RuntimeType::of::<T>())
    }

    pub fn enumeration<T: Any>() -> Self {
        ReturnType::Enum(RuntimeType::of::<T>())
    }

    pub fn optional(inner: ReturnType) -> Self {
        ReturnType::Optional(Box::new(inner))
    }

    pub fn list(item: ReturnType) -> Self {
        ReturnType::List(Box::new(item))
    }

    /// True for both the plain and the optional boolean.
    pub fn is_boolean(&self) -> bool {
        match self {
            ReturnType::Scalar(ScalarKind::Boolean) => true,
            ReturnType::Optional(inner) => {
                matches!(**inner, ReturnType::Scalar(ScalarKind::Boolean))
            }
            _ => false,
        }
    }

    /// The return type with every optional and list wrapper removed.
    pub fn innermost(&self) -> &ReturnType {
        match self {
            ReturnType::Optional(inner) | ReturnType::List(inner) => inner.innermost(),
            other => other,
        }
    }

    pub fn object_type(&self) -> Option<RuntimeType> {
        match self.innermost() {
            ReturnType::Object(runtime_type) => Some(*runtime_type),
            _ => None,
        }
    }

    pub fn enum_type(&self) -> Option<RuntimeType> {
        match self.innermost() {
            ReturnType::Enum(runtime_type) => Some(*runtime_type),
            _ => None,
        }
    }
}

/// One callable method of a [`MethodTable`].
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<ParamType>,
    returns: ReturnType,
    description: Option<String>,
    call: Arc<CallFn>,
}

impl MethodDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn returns(&self) -> &ReturnType {
        &self.returns
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn call(
        &self,
        receiver: &Object,
        arguments: &Arguments,
    ) -> Result<FieldValue, FieldError> {
        (self.call)(receiver, arguments)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} parameter(s))", self.name, self.params.len())
    }
}

/// All methods of one runtime type, in declaration order.
#[derive(Clone, Debug)]
pub struct MethodTable {
    runtime_type: RuntimeType,
    methods: Vec<MethodDescriptor>,
}

impl MethodTable {
    pub fn builder<T: Any + Send + Sync>() -> MethodTableBuilder<T> {
        MethodTableBuilder {
            methods: Vec::new(),
            _receiver: PhantomData,
        }
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn methods_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.methods
            .iter()
            .filter(move |method| method.name == name)
    }
}

pub struct MethodTableBuilder<T> {
    methods: Vec<MethodDescriptor>,
    _receiver: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> MethodTableBuilder<T> {
    pub fn method<F>(
        self,
        name: &str,
        params: impl IntoIterator<Item = ParamType>,
        returns: ReturnType,
        method: F,
    ) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<FieldValue, FieldError> + Send + Sync + 'static,
    {
        self.describe(name, None, params, returns, method)
    }

    /// Same as [`method`](Self::method), with a description kept for diagnostics.
    pub fn describe<F>(
        mut self,
        name: &str,
        description: Option<&str>,
        params: impl IntoIterator<Item = ParamType>,
        returns: ReturnType,
        method: F,
    ) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<FieldValue, FieldError> + Send + Sync + 'static,
    {
        let method_name = name.to_string();
        let call = move |receiver: &Object, arguments: &Arguments| {
            let Some(receiver) = receiver.downcast_ref::<T>() else {
                return Err(FieldError::SourceTypeMismatch {
                    field: method_name.clone(),
                    expected: std::any::type_name::<T>().to_string(),
                    found: receiver.runtime_type().name().to_string(),
                });
            };
            method(receiver, arguments)
        };
        self.methods.push(MethodDescriptor {
            name: name.to_string(),
            params: params.into_iter().collect(),
            returns,
            description: description.map(str::to_string),
            call: Arc::new(call),
        });
        self
    }

    pub fn build(self) -> MethodTable {
        MethodTable {
            runtime_type: RuntimeType::of::<T>(),
            methods: self.methods,
        }
    }
}

/// One argument as handed to a method.
#[derive(Clone, Debug, Default)]
pub enum ArgumentValue {
    #[default]
    Null,
    Value(Value),
    /// The result of an [`InputConversion`].
    Input(Arc<dyn Any + Send + Sync>),
    List(Vec<ArgumentValue>),
    Source(Object),
    Context(RequestContext),
}

/// The arguments of one method call, by parameter position.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    values: Vec<ArgumentValue>,
}

impl Arguments {
    pub fn new(values: Vec<ArgumentValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgumentValue> {
        self.values.get(index)
    }

    pub fn is_null(&self, index: usize) -> bool {
        matches!(
            self.get(index),
            None | Some(ArgumentValue::Null) | Some(ArgumentValue::Value(Value::Null))
        )
    }

    /// The raw value at `index`, `None` when absent or null.
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.get(index)? {
            ArgumentValue::Value(Value::Null) => None,
            ArgumentValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.value(index)?.as_str()
    }

    pub fn i64(&self, index: usize) -> Option<i64> {
        self.value(index)?.as_i64()
    }

    pub fn f64(&self, index: usize) -> Option<f64> {
        self.value(index)?.as_f64()
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        self.value(index)?.as_bool()
    }

    /// A converted input object.
    pub fn input<V: Any>(&self, index: usize) -> Option<&V> {
        match self.get(index)? {
            ArgumentValue::Input(value) => value.downcast_ref::<V>(),
            _ => None,
        }
    }

    /// A list argument, converted item by item.
    pub fn list(&self, index: usize) -> Option<&[ArgumentValue]> {
        match self.get(index)? {
            ArgumentValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// The data object passed to a handler group method.
    pub fn source<D: Any>(&self, index: usize) -> Option<&D> {
        match self.get(index)? {
            ArgumentValue::Source(object) => object.downcast_ref::<D>(),
            _ => None,
        }
    }

    pub fn context(&self, index: usize) -> Option<&RequestContext> {
        match self.get(index)? {
            ArgumentValue::Context(context) => Some(context),
            _ => None,
        }
    }
}
