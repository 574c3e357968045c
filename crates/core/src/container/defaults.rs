//! Declarative default services
//!
//! A [`DefaultRegistry`] is the table declarative registration writes into. Root
//! containers copy every default binding when they are created, and subscribe to
//! [`DefaultRegistry::on_default_registered`] so services registered later (for
//! instance by a module loaded after the container was built) still reach them.

use crate::container::descriptor::{Binding, Producer};
use crate::container::scope::ServiceScope;
use crate::container::tokens::Token;
use crate::debug::debug_event;
use crate::errors::CoreError;
use crate::foundation::traits::Service;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// A default service entry: token, class and scope
#[derive(Debug, Clone)]
pub struct DefaultService {
    pub token: Token,
    pub scope: ServiceScope,
    producer: Producer,
}

impl DefaultService {
    pub fn new<T: Service + Default>(token: Token, scope: ServiceScope) -> Self {
        Self {
            token,
            scope,
            producer: Producer::class::<T>(),
        }
    }

    /// Build the binding a root container registers for this entry
    pub fn to_binding(&self) -> Binding {
        Binding::new(self.token.clone(), self.scope, self.producer.clone())
    }
}

/// Callback notified with every newly registered default service
pub type DefaultListener = Arc<dyn Fn(&DefaultService) + Send + Sync>;

/// Table of default services plus its registration channel
#[derive(Default)]
pub struct DefaultRegistry {
    services: RwLock<Vec<DefaultService>>,
    listeners: RwLock<Vec<DefaultListener>>,
}

impl DefaultRegistry {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`Container::new`](crate::container::Container::new)
    pub fn global() -> &'static Arc<DefaultRegistry> {
        static GLOBAL: OnceLock<Arc<DefaultRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(DefaultRegistry::new()))
    }

    /// Register `T` under its own type token as a singleton
    pub fn register<T: Service + Default>(&self) -> Result<(), CoreError> {
        self.register_as::<T>(Token::of::<T>(), ServiceScope::Singleton)
    }

    /// Register `T` under a custom token and scope
    ///
    /// Re-registering a token replaces the previous entry. Listeners are notified
    /// after the table is updated.
    pub fn register_as<T: Service + Default>(
        &self,
        token: impl Into<Token>,
        scope: ServiceScope,
    ) -> Result<(), CoreError> {
        let service = DefaultService::new::<T>(token.into(), scope);

        {
            let mut services = self.services.write().map_err(|_| CoreError::lock("default_services"))?;
            match services.iter_mut().find(|existing| existing.token == service.token) {
                Some(existing) => *existing = service.clone(),
                None => services.push(service.clone()),
            }
        }

        debug_event!(token = %service.token, scope = %service.scope, "default service registered");

        let listeners = self
            .listeners
            .read()
            .map_err(|_| CoreError::lock("default_listeners"))?
            .clone();
        for listener in listeners {
            listener(&service);
        }

        Ok(())
    }

    /// Check if a token has a default service
    pub fn contains(&self, token: &Token) -> bool {
        self.services
            .read()
            .map(|services| services.iter().any(|service| &service.token == token))
            .unwrap_or(false)
    }

    /// Bindings for every registered default, in registration order
    pub fn bindings(&self) -> Result<Vec<Binding>, CoreError> {
        let services = self.services.read().map_err(|_| CoreError::lock("default_services"))?;
        Ok(services.iter().map(DefaultService::to_binding).collect())
    }

    /// Get the number of registered defaults
    pub fn len(&self) -> usize {
        self.services.read().map(|services| services.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to late registrations
    pub fn on_default_registered(&self, listener: DefaultListener) -> Result<(), CoreError> {
        let mut listeners = self.listeners.write().map_err(|_| CoreError::lock("default_listeners"))?;
        if !listeners.iter().any(|existing| same_listener(existing, &listener)) {
            listeners.push(listener);
        }
        Ok(())
    }

    /// Unsubscribe a listener previously passed to `on_default_registered`
    ///
    /// Unknown listeners are ignored.
    pub fn off_default_registered(&self, listener: &DefaultListener) -> Result<(), CoreError> {
        let mut listeners = self.listeners.write().map_err(|_| CoreError::lock("default_listeners"))?;
        listeners.retain(|existing| !same_listener(existing, listener));
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|listeners| listeners.len()).unwrap_or(0)
    }
}

fn same_listener(a: &DefaultListener, b: &DefaultListener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl fmt::Debug for DefaultRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRegistry")
            .field("service_count", &self.len())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
