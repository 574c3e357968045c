use crate::container::builder::ContainerBuilder;
use crate::container::defaults::{DefaultListener, DefaultRegistry, DefaultService};
use crate::container::descriptor::{Binding, Producer, Provider};
use crate::container::instance::Instance;
use crate::container::lifecycle::LifecycleTracker;
use crate::container::registry::BindingRegistry;
use crate::container::scope::ServiceScope;
use crate::container::tokens::{ServiceToken, Token};
use crate::debug::debug_event;
use crate::errors::CoreError;
use crate::foundation::traits::Service;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use uuid::Uuid;

thread_local! {
    /// Bindings whose producer is running on this thread, outermost first
    static CONSTRUCTING: RefCell<Vec<(Uuid, Token)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a binding as under construction until dropped
struct ConstructionGuard;

impl ConstructionGuard {
    fn enter(container: Uuid, token: &Token) -> Result<Self, CoreError> {
        CONSTRUCTING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack
                .iter()
                .position(|(id, pending)| *id == container && pending == token)
            {
                let path = stack[start..].iter().map(|(_, pending)| pending);
                return Err(CoreError::circular_dependency(path, token));
            }
            stack.push((container, token.clone()));
            Ok(ConstructionGuard)
        })
    }
}

impl Drop for ConstructionGuard {
    fn drop(&mut self) {
        CONSTRUCTING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Hierarchical service container
///
/// A `Container` is a cheap handle; clones share the same binding table and
/// instance cache. Resolution checks the container's own bindings first and
/// falls back to the parent chain only for tokens it does not bind itself.
///
/// ```rust
/// use locus_core::{Container, Provider, Service};
///
/// #[derive(Default)]
/// struct UserService;
/// impl Service for UserService {}
///
/// let root = Container::builder()
///     .isolated()
///     .provide(Provider::class::<UserService>())
///     .build()?;
/// let child = root.create_child();
///
/// let a = root.resolve::<UserService>()?;
/// let b = child.resolve::<UserService>()?;
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// # Ok::<(), locus_core::CoreError>(())
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    id: Uuid,
    parent: Option<Container>,
    bindings: RwLock<BindingRegistry>,
    instances: RwLock<HashMap<Token, Instance>>,
    lifecycle: Arc<LifecycleTracker>,
    defaults: Option<DefaultsSubscription>,
}

/// Root containers stay subscribed to their default registry until dropped
struct DefaultsSubscription {
    registry: Arc<DefaultRegistry>,
    listener: DefaultListener,
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if let Some(subscription) = self.defaults.take() {
            if let Err(error) = subscription.registry.off_default_registered(&subscription.listener) {
                tracing::warn!(container = %self.id, %error, "failed to unsubscribe from default registry");
            }
        }
    }
}

impl Container {
    /// Create a root container fed by the global default registry
    pub fn new() -> Self {
        Self::root(Some(DefaultRegistry::global().clone()), Vec::new())
    }

    /// Create a container builder
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Build a root container from the defaults of `registry` plus explicit bindings
    ///
    /// Explicit bindings come after the defaults so they shadow them on merge.
    pub(crate) fn root(registry: Option<Arc<DefaultRegistry>>, bindings: Vec<Binding>) -> Self {
        // A failed read of the defaults leaves the root with explicit bindings only.
        let defaults = registry
            .as_ref()
            .and_then(|registry| registry.bindings().ok())
            .unwrap_or_default();

        let inner = Arc::new_cyclic(|weak: &Weak<ContainerInner>| {
            let mut table = BindingRegistry::new();
            table.merge(defaults.into_iter().chain(bindings).collect());

            ContainerInner {
                id: Uuid::new_v4(),
                parent: None,
                bindings: RwLock::new(table),
                instances: RwLock::new(HashMap::new()),
                lifecycle: Arc::new(LifecycleTracker::new()),
                defaults: registry.map(|registry| DefaultsSubscription {
                    registry,
                    listener: late_default_listener(weak.clone()),
                }),
            }
        });

        if let Some(subscription) = &inner.defaults {
            if let Err(error) = subscription
                .registry
                .on_default_registered(subscription.listener.clone())
            {
                tracing::warn!(container = %inner.id, %error, "failed to subscribe to default registry");
            }
        }

        debug_event!(container = %inner.id, "root container created");
        Self { inner }
    }

    fn child(parent: &Container, bindings: Vec<Binding>) -> Self {
        let mut table = BindingRegistry::new();
        table.merge(bindings);

        let inner = Arc::new(ContainerInner {
            id: Uuid::new_v4(),
            parent: Some(parent.clone()),
            bindings: RwLock::new(table),
            instances: RwLock::new(HashMap::new()),
            lifecycle: parent.inner.lifecycle.clone(),
            defaults: None,
        });

        debug_event!(container = %inner.id, parent = %parent.inner.id, "child container created");
        Self { inner }
    }

    /// Create a child container with an empty binding table
    pub fn create_child(&self) -> Container {
        Self::child(self, Vec::new())
    }

    /// Create a child container with its own bindings
    ///
    /// Fails without creating anything if any provider is ambiguous.
    pub fn create_child_with(
        &self,
        providers: impl IntoIterator<Item = Provider>,
    ) -> Result<Container, CoreError> {
        let bindings = into_bindings(providers)?;
        Ok(Self::child(self, bindings))
    }

    /// Merge providers into this container's binding table
    ///
    /// All providers are validated before anything is registered. Within the call
    /// the last provider for a token wins; an existing binding for the token is
    /// overridden and its cached instance dropped.
    pub fn register(&self, providers: impl IntoIterator<Item = Provider>) -> Result<(), CoreError> {
        let bindings = into_bindings(providers)?;
        let replaced = self
            .inner
            .bindings
            .write()
            .map_err(|_| CoreError::lock("container_bindings"))?
            .merge(bindings);

        if !replaced.is_empty() {
            let mut instances = self
                .inner
                .instances
                .write()
                .map_err(|_| CoreError::lock("container_instances"))?;
            for token in &replaced {
                instances.remove(token);
                debug_event!(container = %self.inner.id, %token, "binding overridden");
            }
        }

        Ok(())
    }

    /// Resolve a service registered under its own type
    pub fn resolve<T: Service>(&self) -> Result<Arc<T>, CoreError> {
        self.resolve_as::<T>(Token::of::<T>())
    }

    /// Resolve a service through a service token
    pub fn resolve_by_token<K: ServiceToken>(&self) -> Result<Arc<K::Service>, CoreError> {
        self.resolve_as::<K::Service>(Token::token::<K>())
    }

    /// Resolve any token and downcast the instance to `T`
    pub fn resolve_as<T: Service>(&self, token: impl Into<Token>) -> Result<Arc<T>, CoreError> {
        let token = token.into();
        self.resolve_instance(&token)?
            .downcast::<T>()
            .ok_or_else(|| CoreError::type_mismatch::<T>(&token))
    }

    /// Try to resolve a service, returning None if it cannot be resolved
    pub fn try_resolve<T: Service>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    /// Resolve a token to its instance
    pub fn resolve_instance(&self, token: &Token) -> Result<Instance, CoreError> {
        let binding = self
            .inner
            .bindings
            .read()
            .map_err(|_| CoreError::lock("container_bindings"))?
            .get(token);

        match (binding, &self.inner.parent) {
            (Some(binding), _) => self.produce(&binding),
            (None, Some(parent)) => parent.resolve_instance(token),
            (None, None) => Err(CoreError::binding_not_found(token)),
        }
    }

    /// Produce or fetch the instance for a local binding
    ///
    /// No lock is held while the producer runs, so factories may resolve other
    /// tokens from this container.
    fn produce(&self, binding: &Binding) -> Result<Instance, CoreError> {
        if let Producer::Value(instance) = &binding.producer {
            return Ok(instance.clone());
        }

        let singleton = binding.effective_scope() == ServiceScope::Singleton;
        if singleton {
            let instances = self
                .inner
                .instances
                .read()
                .map_err(|_| CoreError::lock("container_instances"))?;
            if let Some(instance) = instances.get(&binding.token) {
                return Ok(instance.clone());
            }
        }

        let instance = {
            let _constructing = ConstructionGuard::enter(self.inner.id, &binding.token)?;
            match &binding.producer {
                Producer::Class { construct, .. } => construct(),
                Producer::Factory(factory) => factory(self)?,
                Producer::Value(instance) => instance.clone(),
            }
        };
        debug_event!(
            container = %self.inner.id,
            token = %binding.token,
            scope = %binding.scope,
            producer = binding.producer.kind(),
            "service instance created"
        );

        if !singleton {
            return Ok(instance);
        }

        let mut instances = self
            .inner
            .instances
            .write()
            .map_err(|_| CoreError::lock("container_instances"))?;
        Ok(instances
            .entry(binding.token.clone())
            .or_insert(instance)
            .clone())
    }

    /// Check if this container binds a token itself
    pub fn contains(&self, token: &Token) -> bool {
        self.inner
            .bindings
            .read()
            .map(|bindings| bindings.contains(token))
            .unwrap_or(false)
    }

    /// Check if a token can be resolved from this container or its ancestors
    pub fn can_resolve(&self, token: &Token) -> bool {
        self.contains(token)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(|parent| parent.can_resolve(token))
    }

    /// Get the number of local bindings
    pub fn binding_count(&self) -> usize {
        self.inner
            .bindings
            .read()
            .map(|bindings| bindings.len())
            .unwrap_or(0)
    }

    /// Get the number of cached singleton instances held by this container
    pub fn cached_instance_count(&self) -> usize {
        self.inner
            .instances
            .read()
            .map(|instances| instances.len())
            .unwrap_or(0)
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Lifecycle tracker shared by every container of this tree
    pub fn lifecycle(&self) -> &Arc<LifecycleTracker> {
        &self.inner.lifecycle
    }

    /// Check whether two handles refer to the same container
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn into_bindings(providers: impl IntoIterator<Item = Provider>) -> Result<Vec<Binding>, CoreError> {
    providers.into_iter().map(Provider::into_binding).collect()
}

/// Listener binding late defaults into a root container that doesn't bind them yet
fn late_default_listener(container: Weak<ContainerInner>) -> DefaultListener {
    Arc::new(move |service: &DefaultService| {
        let Some(inner) = container.upgrade() else {
            return;
        };
        let Ok(mut bindings) = inner.bindings.write() else {
            tracing::warn!(container = %inner.id, token = %service.token, "binding table poisoned; late default dropped");
            return;
        };
        if bindings.insert_if_absent(service.to_binding()) {
            debug_event!(container = %inner.id, token = %service.token, "late default service bound");
        }
    })
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("binding_count", &self.binding_count())
            .field("cached_instance_count", &self.cached_instance_count())
            .field("is_root", &self.is_root())
            .finish()
    }
}
