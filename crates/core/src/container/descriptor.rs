use crate::container::container::Container;
use crate::container::instance::Instance;
use crate::container::scope::ServiceScope;
use crate::container::tokens::Token;
use crate::errors::CoreError;
use crate::foundation::traits::Service;
use std::fmt;
use std::sync::Arc;

/// Constructor for a class binding
pub type ClassConstructor = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Factory function for creating service instances
///
/// Receives the container that owns the binding.
pub type ServiceFactory = Arc<dyn Fn(&Container) -> Result<Instance, CoreError> + Send + Sync>;

/// How a binding produces its instance
#[derive(Clone)]
pub enum Producer {
    /// Instantiate a type through `Default`
    Class {
        type_name: &'static str,
        construct: ClassConstructor,
    },
    /// Call a factory function
    Factory(ServiceFactory),
    /// Hand out a fixed instance
    Value(Instance),
}

impl Producer {
    /// Class producer for `T`
    pub fn class<T: Service + Default>() -> Self {
        Producer::Class {
            type_name: std::any::type_name::<T>(),
            construct: Arc::new(|| Instance::new(T::default())),
        }
    }

    /// Factory producer returning a `T`
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Service,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Producer::Factory(Arc::new(move |container| factory(container).map(Instance::new)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Producer::Class { .. } => "class",
            Producer::Factory(_) => "factory",
            Producer::Value(_) => "value",
        }
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Producer::Class { type_name, .. } => write!(f, "Class({})", type_name),
            Producer::Factory(_) => write!(f, "Factory(<factory_fn>)"),
            Producer::Value(instance) => write!(f, "Value({:?})", instance),
        }
    }
}

/// A validated binding: token, scope and producer
#[derive(Debug, Clone)]
pub struct Binding {
    pub token: Token,
    pub scope: ServiceScope,
    pub producer: Producer,
}

impl Binding {
    pub fn new(token: Token, scope: ServiceScope, producer: Producer) -> Self {
        Self {
            token,
            scope,
            producer,
        }
    }

    /// Scope actually applied at resolution; fixed values are always shared
    pub fn effective_scope(&self) -> ServiceScope {
        match self.producer {
            Producer::Value(_) => ServiceScope::Singleton,
            _ => self.scope,
        }
    }
}

/// Registration intake entry
///
/// Either the bare class shorthand ([`Provider::class`]) or an explicit record
/// built from [`Provider::provide`] with exactly one of `use_class`,
/// `use_factory` or `use_value`/`use_shared`. The record is only validated when
/// it is turned into a [`Binding`].
///
/// ```rust
/// use locus_core::{Provider, Service, ServiceScope};
///
/// #[derive(Default)]
/// struct UserService;
/// impl Service for UserService {}
///
/// let shorthand = Provider::class::<UserService>();
/// let transient = Provider::provide(locus_core::Token::of::<UserService>())
///     .use_class::<UserService>()
///     .in_scope(ServiceScope::Transient);
/// let ambiguous = Provider::provide("user-service");
///
/// assert!(shorthand.into_binding().is_ok());
/// assert!(transient.into_binding().unwrap().scope.is_transient());
/// assert!(ambiguous.into_binding().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Provider {
    token: Token,
    scope: Option<ServiceScope>,
    use_class: Option<Producer>,
    use_factory: Option<Producer>,
    use_value: Option<Producer>,
}

impl Provider {
    /// Start an explicit provider record for a token
    pub fn provide(token: impl Into<Token>) -> Self {
        Self {
            token: token.into(),
            scope: None,
            use_class: None,
            use_factory: None,
            use_value: None,
        }
    }

    /// Bare class shorthand: the type is its own token, singleton scope
    pub fn class<T: Service + Default>() -> Self {
        Self::provide(Token::of::<T>()).use_class::<T>()
    }

    /// Instantiate `T` on resolution
    pub fn use_class<T: Service + Default>(mut self) -> Self {
        self.use_class = Some(Producer::class::<T>());
        self
    }

    /// Produce the instance from a factory
    pub fn use_factory<T, F>(mut self, factory: F) -> Self
    where
        T: Service,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.use_factory = Some(Producer::factory(factory));
        self
    }

    /// Hand out a fixed value
    pub fn use_value<T: Service>(mut self, value: T) -> Self {
        self.use_value = Some(Producer::Value(Instance::new(value)));
        self
    }

    /// Hand out an already shared value, keeping its identity
    pub fn use_shared<T: Service>(mut self, value: Arc<T>) -> Self {
        self.use_value = Some(Producer::Value(Instance::from_arc(value)));
        self
    }

    /// Set the service scope
    pub fn in_scope(mut self, scope: ServiceScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn singleton(self) -> Self {
        self.in_scope(ServiceScope::Singleton)
    }

    pub fn transient(self) -> Self {
        self.in_scope(ServiceScope::Transient)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Validate the record and build the binding
    pub fn into_binding(self) -> Result<Binding, CoreError> {
        let mut producers = [self.use_class, self.use_factory, self.use_value]
            .into_iter()
            .flatten();

        match (producers.next(), producers.next()) {
            (Some(producer), None) => Ok(Binding::new(
                self.token,
                self.scope.unwrap_or_default(),
                producer,
            )),
            (None, _) => Err(CoreError::AmbiguousProvider {
                token: self.token,
                found: 0,
            }),
            (Some(_), Some(_)) => Err(CoreError::AmbiguousProvider {
                token: self.token,
                found: 2 + producers.count(),
            }),
        }
    }
}

impl TryFrom<Provider> for Binding {
    type Error = CoreError;

    fn try_from(provider: Provider) -> Result<Self, Self::Error> {
        provider.into_binding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct TestImpl;
    impl Service for TestImpl {}

    #[test]
    fn test_class_shorthand_defaults() {
        let binding = Provider::class::<TestImpl>().into_binding().unwrap();

        assert_eq!(binding.token, Token::of::<TestImpl>());
        assert_eq!(binding.scope, ServiceScope::Singleton);
        assert_eq!(binding.producer.kind(), "class");
    }

    #[test]
    fn test_explicit_scope_is_kept() {
        let binding = Provider::provide("impl")
            .use_factory(|_| Ok(TestImpl))
            .transient()
            .into_binding()
            .unwrap();

        assert_eq!(binding.scope, ServiceScope::Transient);
        assert_eq!(binding.effective_scope(), ServiceScope::Transient);
    }

    #[test]
    fn test_value_is_always_singleton() {
        let binding = Provider::provide("impl")
            .use_value(TestImpl)
            .transient()
            .into_binding()
            .unwrap();

        assert_eq!(binding.effective_scope(), ServiceScope::Singleton);
    }

    #[test]
    fn test_missing_producer_is_ambiguous() {
        let error = Provider::provide("impl").into_binding().unwrap_err();

        assert!(matches!(error, CoreError::AmbiguousProvider { found: 0, .. }));
    }

    #[test]
    fn test_multiple_producers_are_ambiguous() {
        let error = Provider::provide("impl")
            .use_class::<TestImpl>()
            .use_factory(|_| Ok(TestImpl))
            .use_value(TestImpl)
            .into_binding()
            .unwrap_err();

        assert!(matches!(error, CoreError::AmbiguousProvider { found: 3, .. }));
    }
}
