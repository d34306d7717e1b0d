//! Runtime type identities and type-erased values.
//!
//! Handler groups and data types are ordinary Rust values. The binder only ever sees them
//! through an [`Object`], which pairs a shared, type-erased value with the [`RuntimeType`]
//! it was created from.

use std::any::Any;
use std::any::TypeId;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

/// The concrete Rust type behind a schema type.
///
/// Two runtime types are equal when they describe the same Rust type; the name is only kept
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct RuntimeType {
    id: TypeId,
    name: &'static str,
}

impl RuntimeType {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path, e.g. `Book` for `library::model::Book`.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for RuntimeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RuntimeType {}

impl Hash for RuntimeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A shared, type-erased value: a handler group instance or a source object.
///
/// Cloning is cheap, the value itself is reference counted.
#[derive(Clone)]
pub struct Object {
    value: Arc<dyn Any + Send + Sync>,
    runtime_type: RuntimeType,
}

impl Object {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            runtime_type: RuntimeType::of::<T>(),
        }
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    pub fn is<T: Any>(&self) -> bool {
        self.runtime_type.id() == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.runtime_type).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Book {
        title: String,
    }

    struct Author;

    #[test]
    fn runtime_types_compare_by_identity() {
        assert_eq!(RuntimeType::of::<Book>(), RuntimeType::of::<Book>());
        assert_ne!(RuntimeType::of::<Book>(), RuntimeType::of::<Author>());
        assert_eq!(RuntimeType::of::<Book>().short_name(), "Book");
        assert_eq!(RuntimeType::of::<Vec<Book>>().short_name(), "Vec");
    }

    #[test]
    fn objects_downcast_to_their_own_type_only() {
        let object = Object::new(Book {
            title: "Dune".to_string(),
        });
        assert!(object.is::<Book>());
        assert!(!object.is::<Author>());
        assert_eq!(
            object.downcast_ref::<Book>().map(|b| b.title.as_str()),
            Some("Dune")
        );
        assert!(object.downcast_ref::<Author>().is_none());
        assert!(object.downcast_arc::<Book>().is_some());
    }
}
