use crate::foundation::traits::Service;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Identity of a shared service instance
///
/// Derived from the address of the shared allocation, so two handles compare
/// equal exactly when they point at the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

/// A resolved service instance
///
/// Holds the same allocation twice: once as `Any` for typed downcasts and once as
/// `dyn Service` for capability probing. Cloning is cheap and keeps identity.
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    service: Arc<dyn Service>,
}

impl Instance {
    /// Wrap a freshly constructed service
    pub fn new<T: Service>(service: T) -> Self {
        Self::from_arc(Arc::new(service))
    }

    /// Wrap an already shared service without changing its identity
    pub fn from_arc<T: Service>(service: Arc<T>) -> Self {
        Self {
            value: service.clone(),
            service,
        }
    }

    pub fn id(&self) -> InstanceId {
        InstanceId(Arc::as_ptr(&self.value) as *const () as usize)
    }

    /// Check whether both handles refer to the same object
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.id() == other.id()
    }

    /// Check whether the instance is a `T`
    pub fn is<T: Service>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Get a typed handle to the instance
    pub fn downcast<T: Service>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Get the capability view of the instance
    pub fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }

    pub fn service_name(&self) -> &'static str {
        self.service.service_name()
    }
}

impl<T: Service> From<Arc<T>> for Instance {
    fn from(service: Arc<T>) -> Self {
        Self::from_arc(service)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id())
            .field("service_name", &self.service_name())
            .finish()
    }
}
