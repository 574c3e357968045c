use crate::errors::CoreError;
use crate::state::Stateful;
use std::fmt;

/// Core trait for anything that can be bound in a container
///
/// The optional capabilities are exposed through accessor methods that default
/// to `None`. A service opts into a capability by returning `Some(self)` (or a
/// reference to an embedded component, such as a [`Store`](crate::state::Store)).
///
/// ```rust
/// use locus_core::{CoreError, OnActivate, Service, Store};
///
/// #[derive(Default)]
/// struct Clock {
///     ticks: Store<u64>,
/// }
///
/// impl OnActivate for Clock {
///     fn on_activate(&self) -> Result<(), CoreError> {
///         self.ticks.replace(0)
///     }
/// }
///
/// impl Service for Clock {
///     fn as_stateful(&self) -> Option<&dyn locus_core::Stateful> {
///         Some(&self.ticks)
///     }
///
///     fn as_on_activate(&self) -> Option<&dyn OnActivate> {
///         Some(self)
///     }
/// }
/// ```
pub trait Service: Send + Sync + 'static {
    /// Get the type name of this service
    fn service_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// State change notifications, if this service owns observable state
    fn as_stateful(&self) -> Option<&dyn Stateful> {
        None
    }

    /// Hook invoked when the first consumer mounts this instance
    fn as_on_activate(&self) -> Option<&dyn OnActivate> {
        None
    }

    /// Hook invoked when the last consumer unmounts this instance
    fn as_on_deactivate(&self) -> Option<&dyn OnDeactivate> {
        None
    }
}

/// Activation capability
pub trait OnActivate: Send + Sync {
    fn on_activate(&self) -> Result<(), CoreError>;
}

/// Deactivation capability
pub trait OnDeactivate: Send + Sync {
    fn on_deactivate(&self) -> Result<(), CoreError>;
}

impl Service for String {}

impl Service for serde_json::Value {}

impl fmt::Debug for dyn Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("service_name", &self.service_name())
            .field("stateful", &self.as_stateful().is_some())
            .finish()
    }
}
