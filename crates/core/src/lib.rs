mod debug;

pub mod config;
pub mod consumer;
pub mod container;
pub mod errors;
pub mod foundation;
pub mod state;
pub mod subscription;

// Re-export key types for convenience
pub use config::{configure, LocatorConfig};
pub use consumer::MountedService;
pub use container::{
    Container, ContainerBuilder, DefaultRegistry, Instance, InstanceId, LifecycleState,
    LifecycleTracker, Provider, ServiceScope, ServiceToken, Symbol, Token,
};
pub use errors::CoreError;
pub use foundation::{OnActivate, OnDeactivate, Service};
pub use state::{listener, Listener, Stateful, Store};
pub use subscription::{
    select, select_with, subscribe, subscribe_with, watch, watch_deps, AutoCompare, SameValue,
    Subscription,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
