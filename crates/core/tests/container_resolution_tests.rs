//! Integration tests for container resolution
//!
//! Covers scope semantics across container hierarchies, provider validation,
//! default registries and the end-to-end registration flow.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use locus_core::container::{DefaultListener, DefaultRegistry, DefaultService};
use locus_core::{
    Container, CoreError, Provider, Service, ServiceScope, ServiceToken, Stateful, Store, Token,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serial_test::serial;

/// Service trait consumers depend on
trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Debug, Default)]
struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {}", name)
    }
}

impl Service for EnglishGreeter {}

#[derive(Default)]
struct FrenchGreeter;

impl Greeter for FrenchGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour, {}", name)
    }
}

impl Service for FrenchGreeter {}

struct GreeterToken;

impl ServiceToken for GreeterToken {
    type Service = EnglishGreeter;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Pair {
    a: u32,
    b: u32,
}

struct Svc {
    state: Store<Pair>,
}

impl Default for Svc {
    fn default() -> Self {
        Self {
            state: Store::new(Pair { a: 1, b: 2 }),
        }
    }
}

impl Service for Svc {
    fn as_stateful(&self) -> Option<&dyn Stateful> {
        Some(&self.state)
    }
}

/// Service that counts how often it was built
#[derive(Debug)]
struct Counted {
    serial: usize,
}

impl Service for Counted {}

fn isolated() -> Container {
    Container::builder().isolated().build().unwrap()
}

#[test]
fn test_singleton_shared_with_descendants() {
    let root = Container::builder()
        .isolated()
        .add_class::<EnglishGreeter>()
        .build()
        .unwrap();
    let child = root.create_child();
    let grandchild = child.create_child();

    let from_root = root.resolve::<EnglishGreeter>().unwrap();
    let from_child = child.resolve::<EnglishGreeter>().unwrap();
    let from_grandchild = grandchild.resolve::<EnglishGreeter>().unwrap();

    assert!(Arc::ptr_eq(&from_root, &from_child));
    assert!(Arc::ptr_eq(&from_root, &from_grandchild));
    assert_eq!(root.cached_instance_count(), 1);
    assert_eq!(child.cached_instance_count(), 0);
}

#[test]
fn test_singleton_cached_in_owning_container() {
    let root = isolated();
    let child = root.create_child();

    // Resolved through the child first, cached where the binding lives
    root.register([Provider::class::<EnglishGreeter>()]).unwrap();
    let from_child = child.resolve::<EnglishGreeter>().unwrap();

    assert_eq!(root.cached_instance_count(), 1);
    assert!(Arc::ptr_eq(&from_child, &root.resolve::<EnglishGreeter>().unwrap()));
}

#[test]
fn test_transient_instances_are_distinct() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    let container = Container::builder()
        .isolated()
        .provide(
            Provider::provide(Token::of::<Counted>())
                .use_factory(move |_| {
                    Ok(Counted {
                        serial: counter.fetch_add(1, Ordering::SeqCst),
                    })
                })
                .transient(),
        )
        .build()
        .unwrap();

    let first = container.resolve::<Counted>().unwrap();
    let second = container.resolve::<Counted>().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!((first.serial, second.serial), (0, 1));
    assert_eq!(container.cached_instance_count(), 0);
}

#[test]
fn test_value_providers_ignore_transient_scope() {
    let container = Container::builder()
        .isolated()
        .provide(Provider::provide("motd").use_value("welcome".to_string()).transient())
        .build()
        .unwrap();

    let first = container.resolve_as::<String>("motd").unwrap();
    let second = container.resolve_as::<String>("motd").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_child_binding_shadows_parent_for_its_subtree() {
    let root = Container::builder()
        .isolated()
        .provide(Provider::provide("greeter").use_class::<EnglishGreeter>())
        .build()
        .unwrap();
    let overriding = root
        .create_child_with([Provider::provide("greeter").use_class::<FrenchGreeter>()])
        .unwrap();
    let nested = overriding.create_child();
    let sibling = root.create_child();

    let french = nested.resolve_as::<FrenchGreeter>("greeter").unwrap();
    let english = sibling.resolve_as::<EnglishGreeter>("greeter").unwrap();

    assert_eq!(french.greet("Ada"), "Bonjour, Ada");
    assert_eq!(english.greet("Ada"), "Hello, Ada");
    assert!(root.contains(&Token::named("greeter")));
    assert!(!sibling.contains(&Token::named("greeter")));
    assert!(nested.resolve_as::<EnglishGreeter>("greeter").is_err());
}

#[test]
fn test_service_token_resolution() {
    let container = Container::builder()
        .isolated()
        .provide(Provider::provide(Token::token::<GreeterToken>()).use_class::<EnglishGreeter>())
        .build()
        .unwrap();

    let greeter = container.resolve_by_token::<GreeterToken>().unwrap();
    assert_eq!(greeter.greet("Grace"), "Hello, Grace");
    assert!(container.resolve::<EnglishGreeter>().unwrap_err().is_binding_not_found());
}

#[test]
fn test_symbol_tokens_are_unique() {
    let primary = Token::symbol("db");
    let replica = Token::symbol("db");
    let container = Container::builder()
        .isolated()
        .provide(Provider::provide(primary.clone()).use_value("primary".to_string()))
        .provide(Provider::provide(replica.clone()).use_value("replica".to_string()))
        .build()
        .unwrap();

    assert_eq!(*container.resolve_as::<String>(primary).unwrap(), "primary");
    assert_eq!(*container.resolve_as::<String>(replica).unwrap(), "replica");
    assert!(container
        .resolve_as::<String>(Token::symbol("db"))
        .unwrap_err()
        .is_binding_not_found());
}

#[test]
fn test_factories_resolve_dependencies() {
    struct Banner {
        text: String,
    }
    impl Service for Banner {}

    let container = Container::builder()
        .isolated()
        .add_class::<FrenchGreeter>()
        .provide(Provider::provide(Token::of::<Banner>()).use_factory(|container| {
            let greeter = container.resolve::<FrenchGreeter>()?;
            Ok(Banner {
                text: greeter.greet("monde"),
            })
        }))
        .build()
        .unwrap();

    let child = container.create_child();
    assert_eq!(child.resolve::<Banner>().unwrap().text, "Bonjour, monde");
}

#[test]
fn test_factory_errors_propagate() {
    let container = Container::builder()
        .isolated()
        .provide(
            Provider::provide(Token::of::<Counted>())
                .use_factory(|container| {
                    container.resolve_as::<Counted>("missing")?;
                    Ok(Counted { serial: 0 })
                }),
        )
        .build();

    let error = container.unwrap().resolve::<Counted>().unwrap_err();
    match error {
        CoreError::BindingNotFound { token } => assert_eq!(token, Token::named("missing")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_provider_validation() {
    let none = Container::builder().isolated().provide(Provider::provide("empty")).build();
    assert!(none.unwrap_err().is_ambiguous_provider());

    let both = Provider::provide("both")
        .use_class::<EnglishGreeter>()
        .use_value(json!({ "n": 1 }));
    let container = isolated();
    let error = container
        .register([Provider::class::<FrenchGreeter>(), both])
        .unwrap_err();

    assert!(matches!(error, CoreError::AmbiguousProvider { found: 2, .. }));
    assert_eq!(container.binding_count(), 0);
}

#[test]
fn test_register_last_entry_wins_and_evicts() {
    let container = Container::builder()
        .isolated()
        .provide(Provider::provide("greeter").use_class::<EnglishGreeter>())
        .build()
        .unwrap();
    assert!(container.resolve_as::<EnglishGreeter>("greeter").is_ok());
    assert_eq!(container.cached_instance_count(), 1);

    container
        .register([
            Provider::provide("greeter").use_class::<EnglishGreeter>(),
            Provider::provide("greeter").use_class::<FrenchGreeter>(),
        ])
        .unwrap();

    assert_eq!(container.binding_count(), 1);
    assert_eq!(container.cached_instance_count(), 0);
    assert!(container.resolve_as::<FrenchGreeter>("greeter").is_ok());
}

#[test]
fn test_unbound_token_fails_everywhere_in_chain() {
    let root = isolated();
    let leaf = root.create_child().create_child();

    let error = leaf.resolve_instance(&Token::named("nothing")).unwrap_err();
    assert!(error.is_binding_not_found());
    assert!(!leaf.can_resolve(&Token::named("nothing")));
}

#[test]
fn test_invalid_scope_string() {
    assert_eq!("transient".parse::<ServiceScope>().unwrap(), ServiceScope::Transient);
    assert!(matches!(
        "request".parse::<ServiceScope>(),
        Err(CoreError::InvalidServiceScope { .. })
    ));
}

#[test]
fn test_end_to_end_registration_flow() {
    let root = Container::builder()
        .isolated()
        .provide(Provider::provide("T").use_value(json!({ "n": 1 })).singleton())
        .add_class::<Svc>()
        .build()
        .unwrap();

    let first = root.resolve_instance(&Token::named("T")).unwrap();
    let second = root.resolve_instance(&Token::named("T")).unwrap();
    assert!(first.ptr_eq(&second));

    let svc = root.resolve::<Svc>().unwrap();
    svc.state.write(json!({ "b": 3 })).unwrap();
    assert_eq!(*svc.state.read().unwrap(), Pair { a: 1, b: 3 });

    let child = root
        .create_child_with([Provider::provide(Token::of::<Svc>()).use_value(json!({ "mock": true }))])
        .unwrap();
    let in_child = child.resolve_instance(&Token::of::<Svc>()).unwrap();
    let in_parent = root.resolve_instance(&Token::of::<Svc>()).unwrap();

    assert!(!in_child.ptr_eq(&in_parent));
    assert_eq!(
        *in_child.downcast::<serde_json::Value>().unwrap(),
        json!({ "mock": true })
    );
    assert!(matches!(
        child.resolve::<Svc>(),
        Err(CoreError::TypeMismatch { .. })
    ));
}

#[test]
fn test_container_macro() {
    let container = locus_core::container!(
        Provider::class::<EnglishGreeter>(),
        Provider::provide("answer").use_value(json!(42)),
    )
    .unwrap();

    assert_eq!(container.binding_count(), 2);
    assert!(container.can_resolve(&Token::named("answer")));
}

#[test]
fn test_defaults_apply_to_roots_only() {
    let registry = Arc::new(DefaultRegistry::new());
    registry.register::<EnglishGreeter>().unwrap();

    let root = Container::builder()
        .with_defaults(registry.clone())
        .build()
        .unwrap();
    let child = root.create_child();

    assert!(root.contains(&Token::of::<EnglishGreeter>()));
    assert!(!child.contains(&Token::of::<EnglishGreeter>()));
    assert!(child.can_resolve(&Token::of::<EnglishGreeter>()));
}

#[test]
fn test_explicit_bindings_shadow_defaults() {
    let registry = Arc::new(DefaultRegistry::new());
    registry
        .register_as::<EnglishGreeter>("greeter", ServiceScope::Singleton)
        .unwrap();

    let root = Container::builder()
        .with_defaults(registry)
        .provide(Provider::provide("greeter").use_class::<FrenchGreeter>())
        .build()
        .unwrap();

    assert!(root.resolve_as::<FrenchGreeter>("greeter").is_ok());
    assert_eq!(root.binding_count(), 1);
}

#[test]
fn test_late_defaults_reach_existing_roots() {
    let registry = Arc::new(DefaultRegistry::new());
    let root = Container::builder()
        .with_defaults(registry.clone())
        .provide(Provider::provide("greeter").use_class::<FrenchGreeter>())
        .build()
        .unwrap();
    let child = root.create_child();
    assert_eq!(registry.listener_count(), 1);

    registry.register::<EnglishGreeter>().unwrap();
    registry
        .register_as::<EnglishGreeter>("greeter", ServiceScope::Singleton)
        .unwrap();

    assert!(root.contains(&Token::of::<EnglishGreeter>()));
    assert!(!child.contains(&Token::of::<EnglishGreeter>()));
    assert!(child.resolve::<EnglishGreeter>().is_ok());
    assert!(root.resolve_as::<FrenchGreeter>("greeter").is_ok());

    drop(child);
    drop(root);
    assert_eq!(registry.listener_count(), 0);
}

#[test]
fn test_off_default_registered_stops_delivery() {
    let registry = DefaultRegistry::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let listener: DefaultListener = Arc::new(move |_: &DefaultService| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    registry.on_default_registered(listener.clone()).unwrap();
    registry.register::<EnglishGreeter>().unwrap();
    registry.off_default_registered(&listener).unwrap();
    registry.register::<FrenchGreeter>().unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 2);
}

#[derive(Default)]
struct GlobalOnly;

impl Service for GlobalOnly {}

#[test]
#[serial]
fn test_global_registry_feeds_new_roots() {
    let before = Container::new();
    DefaultRegistry::global().register::<GlobalOnly>().unwrap();
    let after = Container::new();

    assert!(before.resolve::<GlobalOnly>().is_ok());
    assert!(after.resolve::<GlobalOnly>().is_ok());
    assert!(!Arc::ptr_eq(
        &before.resolve::<GlobalOnly>().unwrap(),
        &after.resolve::<GlobalOnly>().unwrap()
    ));
}
