//! Comparators used to decide whether a selected value changed
//!
//! [`SameValue`] is the strict identity test: value equality for primitives
//! (with `NaN` equal to itself and `+0.0` distinct from `-0.0`), pointer
//! identity for shared `Arc` values, and never-equal for nested sequences or
//! records, which are treated as freshly allocated objects.
//!
//! [`AutoCompare`] is the default comparator of a subscription: primitives use
//! `SameValue`, sequences and records are compared one level deep with
//! `SameValue` on their elements.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// Strict identity comparison
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

/// Default comparison of selector results
///
/// Implemented for primitives, `Option`, `Arc`, sequences, tuples, maps and
/// JSON values. User structs opt in field by field with
/// [`auto_compare_fields!`](crate::auto_compare_fields); otherwise use
/// `subscribe_with` and pass a comparator.
pub trait AutoCompare {
    fn auto_eq(&self, other: &Self) -> bool;
}

/// Implement [`AutoCompare`] for a struct by comparing the listed fields with
/// [`SameValue`]
///
/// ```rust
/// use locus_core::{auto_compare_fields, AutoCompare};
///
/// #[derive(Clone)]
/// struct Badge {
///     count: u32,
///     label: String,
/// }
/// auto_compare_fields!(Badge { count, label });
///
/// let a = Badge { count: 1, label: "new".to_string() };
/// assert!(a.auto_eq(&a.clone()));
/// ```
#[macro_export]
macro_rules! auto_compare_fields {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::subscription::AutoCompare for $ty {
            fn auto_eq(&self, other: &Self) -> bool {
                $($crate::subscription::SameValue::same_value(&self.$field, &other.$field))&&+
            }
        }
    };
}

/// Compare two values with their [`AutoCompare`] policy
pub fn auto_compare<T: AutoCompare + ?Sized>(a: &T, b: &T) -> bool {
    a.auto_eq(b)
}

/// Equal length and pairwise [`SameValue`]
pub fn shallow_compare<T: SameValue>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_value(y))
}

/// Equal key sets and pairwise [`SameValue`] of the values
fn record_compare<'a, K, V, I, F>(len_a: usize, len_b: usize, entries: I, lookup: F) -> bool
where
    V: SameValue + 'a,
    K: 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
    F: Fn(&K) -> Option<&'a V>,
{
    len_a == len_b
        && entries
            .into_iter()
            .all(|(key, value)| lookup(key).is_some_and(|other| value.same_value(other)))
}

macro_rules! primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SameValue for $ty {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl AutoCompare for $ty {
                fn auto_eq(&self, other: &Self) -> bool {
                    self.same_value(other)
                }
            }
        )*
    };
}

primitive!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, String, str,
);

macro_rules! float {
    ($($ty:ty),*) => {
        $(
            impl SameValue for $ty {
                fn same_value(&self, other: &Self) -> bool {
                    (self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
                }
            }

            impl AutoCompare for $ty {
                fn auto_eq(&self, other: &Self) -> bool {
                    self.same_value(other)
                }
            }
        )*
    };
}

float!(f32, f64);

impl<T: SameValue + ?Sized> SameValue for &T {
    fn same_value(&self, other: &Self) -> bool {
        (**self).same_value(*other)
    }
}

impl<T: AutoCompare + ?Sized> AutoCompare for &T {
    fn auto_eq(&self, other: &Self) -> bool {
        (**self).auto_eq(*other)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: AutoCompare> AutoCompare for Option<T> {
    fn auto_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.auto_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ?Sized> SameValue for Arc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> AutoCompare for Arc<T> {
    fn auto_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T> SameValue for Vec<T> {
    fn same_value(&self, _other: &Self) -> bool {
        false
    }
}

impl<T: SameValue> AutoCompare for Vec<T> {
    fn auto_eq(&self, other: &Self) -> bool {
        shallow_compare(self, other)
    }
}

impl<T: SameValue> AutoCompare for [T] {
    fn auto_eq(&self, other: &Self) -> bool {
        shallow_compare(self, other)
    }
}

impl<T: SameValue, const N: usize> AutoCompare for [T; N] {
    fn auto_eq(&self, other: &Self) -> bool {
        shallow_compare(self, other)
    }
}

impl<K, V, S> SameValue for HashMap<K, V, S> {
    fn same_value(&self, _other: &Self) -> bool {
        false
    }
}

impl<K: Eq + Hash, V: SameValue, S: BuildHasher> AutoCompare for HashMap<K, V, S> {
    fn auto_eq(&self, other: &Self) -> bool {
        record_compare(self.len(), other.len(), self, |key| other.get(key))
    }
}

impl<K, V> SameValue for BTreeMap<K, V> {
    fn same_value(&self, _other: &Self) -> bool {
        false
    }
}

impl<K: Ord, V: SameValue> AutoCompare for BTreeMap<K, V> {
    fn auto_eq(&self, other: &Self) -> bool {
        record_compare(self.len(), other.len(), self, |key| other.get(key))
    }
}

macro_rules! tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: SameValue),+> AutoCompare for ($($name,)+) {
            fn auto_eq(&self, other: &Self) -> bool {
                $(self.$index.same_value(&other.$index))&&+
            }
        }
    };
}

tuple!(A: 0);
tuple!(A: 0, B: 1);
tuple!(A: 0, B: 1, C: 2);
tuple!(A: 0, B: 1, C: 2, D: 3);
tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);

impl SameValue for Value {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if a.is_f64() || b.is_f64() => x.same_value(&y),
                _ => a == b,
            },
            _ => false,
        }
    }
}

impl AutoCompare for Value {
    fn auto_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => shallow_compare(a, b),
            (Value::Object(a), Value::Object(b)) => {
                record_compare(a.len(), b.len(), a, |key: &String| b.get(key))
            }
            _ => self.same_value(other),
        }
    }
}
