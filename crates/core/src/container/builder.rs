use crate::container::defaults::DefaultRegistry;
use crate::container::descriptor::Provider;
use crate::container::Container;
use crate::errors::CoreError;
use crate::foundation::traits::Service;
use std::sync::Arc;

/// Builder for constructing root containers
///
/// By default the container is fed by [`DefaultRegistry::global`]; use
/// [`with_defaults`](Self::with_defaults) to pick another registry or
/// [`isolated`](Self::isolated) to skip declarative defaults entirely.
pub struct ContainerBuilder {
    defaults: Option<Arc<DefaultRegistry>>,
    providers: Vec<Provider>,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self {
            defaults: Some(DefaultRegistry::global().clone()),
            providers: Vec::new(),
        }
    }

    /// Use a specific default registry
    pub fn with_defaults(mut self, registry: Arc<DefaultRegistry>) -> Self {
        self.defaults = Some(registry);
        self
    }

    /// Do not consult any default registry
    pub fn isolated(mut self) -> Self {
        self.defaults = None;
        self
    }

    /// Add a provider
    pub fn provide(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Add the bare class shorthand for `T`
    pub fn add_class<T: Service + Default>(self) -> Self {
        self.provide(Provider::class::<T>())
    }

    /// Add multiple providers at once
    pub fn add_providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Build the root container
    pub fn build(self) -> Result<Container, CoreError> {
        let bindings = self
            .providers
            .into_iter()
            .map(Provider::into_binding)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Container::root(self.defaults, bindings))
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience macro for building isolated root containers
#[macro_export]
macro_rules! container {
    ($($provider:expr),* $(,)?) => {
        {
            let builder = $crate::container::ContainerBuilder::new().isolated();
            $(
                let builder = builder.provide($provider);
            )*
            builder.build()
        }
    };
}
