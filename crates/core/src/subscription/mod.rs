//! Selector subscriptions over observable services
//!
//! A subscription evaluates a selector against a service, remembers the
//! result, and re-evaluates it on every state change of the service. The
//! consumer's `on_change` callback runs only when the comparator reports a
//! different value.

pub mod compare;
pub mod selector;

pub use compare::{auto_compare, shallow_compare, AutoCompare, SameValue};
pub use selector::{select, select_with, subscribe, subscribe_with, watch, watch_deps, Subscription};
