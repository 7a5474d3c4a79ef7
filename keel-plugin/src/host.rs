//! Opaque host objects

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A host object on its way into or out of the interpreter.
///
/// The bridge knows nothing about the concrete type; mappers recognize
/// it by downcasting. The runtime type name is captured at construction
/// so failures can name it.
#[derive(Clone)]
pub struct HostValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl HostValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Runtime type name of the wrapped object
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.inner.as_ref().type_id()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Take the wrapped object out, cloning it when the handle is shared
    pub fn take<T: Any + Send + Sync + Clone>(self) -> Result<T, HostValue> {
        let type_name = self.type_name;
        match self.inner.downcast::<T>() {
            Ok(arc) => Ok(Arc::try_unwrap(arc).unwrap_or_else(|shared| (*shared).clone())),
            Err(inner) => Err(HostValue { inner, type_name }),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostValue<{}>", self.type_name)
    }
}
