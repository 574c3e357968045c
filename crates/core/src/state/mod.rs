//! Observable service state
//!
//! A [`Store`] holds an immutable-by-convention state value and an ordered set
//! of change listeners. Services embed a store and expose it through
//! [`Service::as_stateful`](crate::Service::as_stateful) so the subscription
//! engine can observe them.

pub mod merge;
pub mod store;

pub use merge::{is_record, merge_values};
pub use store::Store;

use crate::errors::CoreError;
use std::sync::Arc;

/// Zero-argument change notification
///
/// Listeners are compared by identity: removing one requires the same `Arc`
/// that was added.
pub type Listener = Arc<dyn Fn() -> Result<(), CoreError> + Send + Sync>;

/// Wrap a closure as a listener
pub fn listener<F>(callback: F) -> Listener
where
    F: Fn() -> Result<(), CoreError> + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Check whether two listeners are the same callback
pub fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Type-erased view of an observable state holder
pub trait Stateful: Send + Sync {
    /// Add a listener; adding one that is already registered does nothing
    fn add_listener(&self, listener: Listener) -> Result<(), CoreError>;

    /// Remove a listener; removing one that is not registered does nothing
    fn remove_listener(&self, listener: &Listener) -> Result<(), CoreError>;

    /// Check whether the state has been set
    fn is_initialized(&self) -> bool;

    /// Get the number of registered listeners
    fn listener_count(&self) -> usize;
}
