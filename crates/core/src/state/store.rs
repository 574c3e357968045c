use crate::debug::debug_event;
use crate::errors::CoreError;
use crate::foundation::Service;
use crate::state::merge::merge_values;
use crate::state::{same_listener, Listener, Stateful};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};

/// State holder with synchronous change notification
///
/// The state is shared as an `Arc<S>` and replaced, never mutated in place, so
/// every change yields a new identity even when the values are identical.
/// Listeners run in registration order after the new state is stored; the
/// first listener error aborts the pass and is returned to the writer.
///
/// ```rust
/// use locus_core::Store;
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Cart {
///     items: u32,
///     coupon: Option<String>,
/// }
///
/// let store = Store::new(Cart { items: 1, coupon: None });
/// store.write(json!({ "items": 2 }))?;
///
/// assert_eq!(*store.read()?, Cart { items: 2, coupon: None });
/// # Ok::<(), locus_core::CoreError>(())
/// ```
pub struct Store<S> {
    state: RwLock<Option<Arc<S>>>,
    listeners: RwLock<Vec<Listener>>,
}

impl<S: Send + Sync + 'static> Store<S> {
    /// Create a store holding `initial`
    pub fn new(initial: S) -> Self {
        Self {
            state: RwLock::new(Some(Arc::new(initial))),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Create a store whose state is not set yet
    pub fn uninitialized() -> Self {
        Self {
            state: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Read the current state
    pub fn read(&self) -> Result<Arc<S>, CoreError> {
        self.state
            .read()
            .map_err(|_| CoreError::lock("store_state"))?
            .clone()
            .ok_or_else(CoreError::not_initialized::<S>)
    }

    /// Set the state without notifying listeners
    ///
    /// Meant for construction time, before anything observes the store.
    pub fn init(&self, state: S) -> Result<(), CoreError> {
        *self.state.write().map_err(|_| CoreError::lock("store_state"))? = Some(Arc::new(state));
        Ok(())
    }

    /// Replace the whole state and notify
    ///
    /// Also initializes a store created with [`uninitialized`](Self::uninitialized).
    pub fn replace(&self, state: S) -> Result<(), CoreError> {
        self.init(state)?;
        self.notify()
    }

    /// Derive the next state from the current one and notify
    ///
    /// `next` runs with no lock held and may read the store.
    pub fn update<F>(&self, next: F) -> Result<(), CoreError>
    where
        F: FnOnce(&S) -> S,
    {
        let current = self.read()?;
        let state = next(current.as_ref());
        *self.state.write().map_err(|_| CoreError::lock("store_state"))? = Some(Arc::new(state));
        self.notify()
    }

    /// Apply a patch and notify
    ///
    /// When both the current state and the patch serialize to records, the patch
    /// fields are merged over the current ones. Otherwise the patch replaces the
    /// state. Writing before the state is set fails with `NotInitialized`.
    pub fn write<P: Serialize>(&self, patch: P) -> Result<(), CoreError>
    where
        S: Serialize + DeserializeOwned,
    {
        let patch = serde_json::to_value(patch)?;
        {
            let mut state = self.state.write().map_err(|_| CoreError::lock("store_state"))?;
            let current = state.as_ref().ok_or_else(CoreError::not_initialized::<S>)?;
            let merged = merge_values(serde_json::to_value(current.as_ref())?, patch);
            *state = Some(Arc::new(serde_json::from_value(merged)?));
        }
        self.notify()
    }

    /// Invoke every listener in registration order
    ///
    /// Runs on a snapshot of the listener list with no lock held, so listeners
    /// may read the store, write it, or add and remove listeners.
    fn notify(&self) -> Result<(), CoreError> {
        let listeners = self
            .listeners
            .read()
            .map_err(|_| CoreError::lock("store_listeners"))?
            .clone();

        debug_event!(
            state = std::any::type_name::<S>(),
            listeners = listeners.len(),
            "state changed"
        );
        for listener in listeners {
            listener()?;
        }
        Ok(())
    }
}

impl<S: Send + Sync + 'static> Stateful for Store<S> {
    fn add_listener(&self, listener: Listener) -> Result<(), CoreError> {
        let mut listeners = self.listeners.write().map_err(|_| CoreError::lock("store_listeners"))?;
        if !listeners.iter().any(|existing| same_listener(existing, &listener)) {
            listeners.push(listener);
        }
        Ok(())
    }

    fn remove_listener(&self, listener: &Listener) -> Result<(), CoreError> {
        let mut listeners = self.listeners.write().map_err(|_| CoreError::lock("store_listeners"))?;
        if let Some(index) = listeners.iter().position(|existing| same_listener(existing, listener)) {
            listeners.remove(index);
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.state.read().map(|state| state.is_some()).unwrap_or(false)
    }

    fn listener_count(&self) -> usize {
        self.listeners.read().map(|listeners| listeners.len()).unwrap_or(0)
    }
}

/// A bare store can be bound and observed directly
impl<S: Send + Sync + 'static> Service for Store<S> {
    fn as_stateful(&self) -> Option<&dyn Stateful> {
        Some(self)
    }
}

impl<S: Send + Sync + 'static> Default for Store<S> {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().ok().and_then(|state| state.clone());
        let listener_count = self.listeners.read().map(|listeners| listeners.len()).unwrap_or(0);
        f.debug_struct("Store")
            .field("state", &state)
            .field("listener_count", &listener_count)
            .finish()
    }
}
