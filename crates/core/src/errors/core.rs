use crate::container::tokens::Token;
use thiserror::Error;

/// Core error type for locus
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No binding found for token: {token}")]
    BindingNotFound { token: Token },

    #[error("Unable to determine how to register provider for '{token}': expected exactly one of use_class, use_factory or use_value, found {found}")]
    AmbiguousProvider { token: Token, found: usize },

    #[error("State of '{state_type}' has not been initialized")]
    NotInitialized { state_type: &'static str },

    #[error("Service resolved for '{token}' is not a {expected}")]
    TypeMismatch {
        token: Token,
        expected: &'static str,
    },

    #[error("Circular dependency detected: {path} (cycle at: {cycle_service})")]
    CircularDependency { path: String, cycle_service: Token },

    #[error("Invalid service scope: {scope}")]
    InvalidServiceScope { scope: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Lifecycle error in component '{component}' during '{operation}': {source}")]
    LifecycleError {
        component: String,
        operation: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CoreError {
    /// Create a new binding not found error
    pub fn binding_not_found(token: &Token) -> Self {
        Self::BindingNotFound {
            token: token.clone(),
        }
    }

    /// Create a new not initialized error for a state type
    pub fn not_initialized<S: ?Sized>() -> Self {
        Self::NotInitialized {
            state_type: std::any::type_name::<S>(),
        }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch<T: ?Sized>(token: &Token) -> Self {
        Self::TypeMismatch {
            token: token.clone(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a new circular dependency error from the tokens under construction
    pub fn circular_dependency<'a>(
        constructing: impl IntoIterator<Item = &'a Token>,
        cycle_service: &'a Token,
    ) -> Self {
        let path = constructing
            .into_iter()
            .chain(std::iter::once(cycle_service))
            .map(Token::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CircularDependency {
            path,
            cycle_service: cycle_service.clone(),
        }
    }

    /// Create a new lock error
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::LockError {
            resource: resource.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap an error raised by an activation or deactivation hook
    pub fn lifecycle(
        component: impl Into<String>,
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::LifecycleError {
            component: component.into(),
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Check if the error is a missing binding
    pub fn is_binding_not_found(&self) -> bool {
        matches!(self, Self::BindingNotFound { .. })
    }

    /// Check if the error is an ambiguous provider
    pub fn is_ambiguous_provider(&self) -> bool {
        matches!(self, Self::AmbiguousProvider { .. })
    }

    /// Check if the error is an uninitialized state read
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized { .. })
    }

    /// Check if the error is a dependency cycle
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// Check if the error is a lifecycle hook failure
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::LifecycleError { .. })
    }
}
