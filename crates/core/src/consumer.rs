//! Mount handles for service consumers
//!
//! A consumer resolves its service once, reports the mount to the container's
//! lifecycle tracker, and keeps the handle for as long as it uses the service.
//! Dropping the handle reports the unmount, so the deactivation hook runs when
//! the last consumer goes away.

use crate::container::{Container, Instance, LifecycleTracker, ServiceToken, Token};
use crate::errors::CoreError;
use crate::foundation::Service;
use crate::subscription::{self, AutoCompare, SameValue, Subscription};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A resolved service held by one consumer
pub struct MountedService<T: Service> {
    service: Arc<T>,
    instance: Instance,
    lifecycle: Arc<LifecycleTracker>,
    mounted: bool,
}

impl<T: Service> MountedService<T> {
    fn mount(container: &Container, token: Token) -> Result<Self, CoreError> {
        let instance = container.resolve_instance(&token)?;
        let service = instance
            .downcast::<T>()
            .ok_or_else(|| CoreError::type_mismatch::<T>(&token))?;
        let lifecycle = container.lifecycle().clone();

        lifecycle.report_mount(&instance)?;
        Ok(Self {
            service,
            instance,
            lifecycle,
            mounted: true,
        })
    }

    /// Get the shared service
    pub fn service(&self) -> &Arc<T> {
        &self.service
    }

    /// Get the number of consumers currently mounting this instance
    pub fn ref_count(&self) -> usize {
        self.lifecycle.ref_count(&self.instance)
    }

    /// Subscribe to a slice of the service with the default comparator
    pub fn subscribe<R, Sel, F>(&self, selector: Sel, on_change: F) -> Result<Subscription<R>, CoreError>
    where
        R: AutoCompare + Clone + Send + 'static,
        Sel: Fn(&T) -> Result<R, CoreError> + Send + Sync + 'static,
        F: Fn() + Send + Sync + 'static,
    {
        subscription::subscribe(&self.service, selector, on_change)
    }

    /// Subscribe to a slice of the service with a custom comparator
    pub fn subscribe_with<R, Sel, C, F>(
        &self,
        selector: Sel,
        compare: C,
        on_change: F,
    ) -> Result<Subscription<R>, CoreError>
    where
        R: Clone + Send + 'static,
        Sel: Fn(&T) -> Result<R, CoreError> + Send + Sync + 'static,
        C: Fn(&R, &R) -> bool + Send + Sync + 'static,
        F: Fn() + Send + Sync + 'static,
    {
        subscription::subscribe_with(&self.service, selector, compare, on_change)
    }

    /// Signal on every state change of the service
    pub fn watch<F>(&self, on_change: F) -> Result<Subscription<()>, CoreError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        subscription::watch(&self.service, on_change)
    }

    /// Signal when the dependency list derived from the service changes
    pub fn watch_deps<D, Deps, F>(&self, deps: Deps, on_change: F) -> Result<Subscription<Vec<D>>, CoreError>
    where
        D: SameValue + Clone + Send + 'static,
        Deps: Fn(&T) -> Result<Vec<D>, CoreError> + Send + Sync + 'static,
        F: Fn() + Send + Sync + 'static,
    {
        subscription::watch_deps(&self.service, deps, on_change)
    }

    /// Release the mount, returning the remaining consumer count
    pub fn unmount(mut self) -> Result<usize, CoreError> {
        self.mounted = false;
        self.lifecycle.report_unmount(&self.instance)
    }
}

impl<T: Service> Deref for MountedService<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.service
    }
}

impl<T: Service> Drop for MountedService<T> {
    fn drop(&mut self) {
        if !self.mounted {
            return;
        }
        if let Err(error) = self.lifecycle.report_unmount(&self.instance) {
            tracing::warn!(
                service = self.instance.service_name(),
                %error,
                "failed to unmount service"
            );
        }
    }
}

impl<T: Service> fmt::Debug for MountedService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedService")
            .field("instance", &self.instance)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl Container {
    /// Resolve a service registered under its own type and mount it
    pub fn mount<T: Service>(&self) -> Result<MountedService<T>, CoreError> {
        MountedService::mount(self, Token::of::<T>())
    }

    /// Resolve any token as `T` and mount it
    pub fn mount_as<T: Service>(&self, token: impl Into<Token>) -> Result<MountedService<T>, CoreError> {
        MountedService::mount(self, token.into())
    }

    /// Resolve a service token and mount it
    pub fn mount_by_token<K: ServiceToken>(&self) -> Result<MountedService<K::Service>, CoreError> {
        MountedService::mount(self, Token::token::<K>())
    }
}
