#[allow(clippy::module_inception)]
pub mod container;
pub mod builder;
pub mod defaults;
pub mod descriptor;
pub mod instance;
pub mod lifecycle;
pub mod registry;
pub mod scope;
pub mod tokens;

pub use container::Container;
pub use builder::ContainerBuilder;
pub use defaults::{DefaultListener, DefaultRegistry, DefaultService};
pub use descriptor::{Binding, ClassConstructor, Producer, Provider, ServiceFactory};
pub use instance::{Instance, InstanceId};
pub use lifecycle::{LifecycleState, LifecycleTracker};
pub use registry::BindingRegistry;
pub use scope::ServiceScope;
pub use tokens::{ServiceToken, Symbol, Token};
