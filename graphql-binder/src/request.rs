//! Per-call request context and field results.

use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use crate::runtime::Object;

/// Arguments supplied for one field, keyed by argument name.
pub type ArgumentMap = Map<String, Value>;

/// What the execution engine hands to a field invoker for a single call.
///
/// Cloning is cheap; a handler method declaring a trailing context parameter receives a clone
/// of the context it was invoked with.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    source: Option<Object>,
    arguments: Arc<ArgumentMap>,
    extensions: Arc<http::Extensions>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Object) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_arguments(mut self, arguments: ArgumentMap) -> Self {
        self.arguments = Arc::new(arguments);
        self
    }

    /// Engine-level data, not serializable and opaque to the binder.
    pub fn with_extensions(mut self, extensions: Arc<http::Extensions>) -> Self {
        self.extensions = extensions;
        self
    }

    /// The object the field is being resolved on, `None` for root fields.
    pub fn source(&self) -> Option<&Object> {
        self.source.as_ref()
    }

    pub fn arguments(&self) -> &ArgumentMap {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn extensions(&self) -> &http::Extensions {
        &self.extensions
    }
}

/// The value computed by a handler method.
#[derive(Clone, Debug, Default)]
pub enum FieldValue {
    #[default]
    Null,
    /// A leaf or structural value, serialized as is.
    Value(Value),
    /// An object the engine resolves further fields on.
    Object(Object),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn object<T: std::any::Any + Send + Sync>(value: T) -> Self {
        FieldValue::Object(Object::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            FieldValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<Object> for FieldValue {
    fn from(object: Object) -> Self {
        FieldValue::Object(object)
    }
}

macro_rules! leaf_conversions {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Value(Value::from(value))
                }
            }
        )*
    };
}

leaf_conversions!(bool, i32, i64, u32, f64, String, &str);

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}
