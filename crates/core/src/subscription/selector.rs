use crate::errors::CoreError;
use crate::foundation::Service;
use crate::state::{listener, Listener, Store};
use crate::subscription::compare::{shallow_compare, AutoCompare, SameValue};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Last delivered value shared between a subscription and its listener
struct Delivered<R> {
    last: Mutex<R>,
    active: AtomicBool,
}

impl<R: Clone> Delivered<R> {
    fn get(&self) -> R {
        match self.last.lock() {
            Ok(last) => last.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, value: R) -> Result<(), CoreError> {
        *self.last.lock().map_err(|_| CoreError::lock("subscription_value"))? = value;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Listener installed on the observed service
struct Attachment {
    target: Arc<dyn Service>,
    listener: Listener,
}

impl Attachment {
    fn detach(&self) -> Result<(), CoreError> {
        match self.target.as_stateful() {
            Some(stateful) => stateful.remove_listener(&self.listener),
            None => Ok(()),
        }
    }
}

/// Handle of a selector attached to a service
///
/// Holds the last value delivered to the consumer. Dropping the handle removes
/// the listener; [`unsubscribe`](Self::unsubscribe) does the same and reports
/// errors. Once detached, nothing is delivered, even from a notification pass
/// that is already running.
pub struct Subscription<R> {
    delivered: Arc<Delivered<R>>,
    attachment: Option<Attachment>,
}

impl<R: Clone> Subscription<R> {
    /// Get the last delivered value
    pub fn current(&self) -> R {
        self.delivered.get()
    }

    /// Check whether the target is observable and the listener is installed
    pub fn is_reactive(&self) -> bool {
        self.attachment.is_some()
    }

    /// Remove the listener from the observed service
    pub fn unsubscribe(mut self) -> Result<(), CoreError> {
        self.delivered.deactivate();
        match self.attachment.take() {
            Some(attachment) => attachment.detach(),
            None => Ok(()),
        }
    }
}

impl<R> Drop for Subscription<R> {
    fn drop(&mut self) {
        self.delivered.active.store(false, Ordering::Release);
        if let Some(attachment) = self.attachment.take() {
            if let Err(error) = attachment.detach() {
                tracing::warn!(
                    service = attachment.target.service_name(),
                    %error,
                    "failed to detach subscription"
                );
            }
        }
    }
}

impl<R: fmt::Debug + Clone> fmt::Debug for Subscription<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("current", &self.current())
            .field("reactive", &self.is_reactive())
            .finish()
    }
}

/// Subscribe to a slice of a service with the default comparator
///
/// `selector` runs once to produce the initial value. When the service is
/// stateful, every state change recomputes it and `on_change` is invoked when
/// the new value differs from the last delivered one.
pub fn subscribe<T, R, Sel, F>(
    instance: &Arc<T>,
    selector: Sel,
    on_change: F,
) -> Result<Subscription<R>, CoreError>
where
    T: Service,
    R: AutoCompare + Clone + Send + 'static,
    Sel: Fn(&T) -> Result<R, CoreError> + Send + Sync + 'static,
    F: Fn() + Send + Sync + 'static,
{
    subscribe_with(instance, selector, |a: &R, b: &R| a.auto_eq(b), on_change)
}

/// Subscribe to a slice of a service with a custom comparator
///
/// `compare` returns `true` when two selected values are considered equal.
pub fn subscribe_with<T, R, Sel, C, F>(
    instance: &Arc<T>,
    selector: Sel,
    compare: C,
    on_change: F,
) -> Result<Subscription<R>, CoreError>
where
    T: Service,
    R: Clone + Send + 'static,
    Sel: Fn(&T) -> Result<R, CoreError> + Send + Sync + 'static,
    C: Fn(&R, &R) -> bool + Send + Sync + 'static,
    F: Fn() + Send + Sync + 'static,
{
    let delivered = Arc::new(Delivered {
        last: Mutex::new(selector(instance.as_ref())?),
        active: AtomicBool::new(true),
    });

    let Some(stateful) = instance.as_stateful() else {
        return Ok(Subscription {
            delivered,
            attachment: None,
        });
    };

    let weak: Weak<T> = Arc::downgrade(instance);
    let shared = delivered.clone();
    let callback = listener(move || {
        if !shared.is_active() {
            return Ok(());
        }
        let Some(target) = weak.upgrade() else {
            return Ok(());
        };

        let candidate = selector(target.as_ref())?;
        if compare(&shared.get(), &candidate) {
            return Ok(());
        }
        shared.set(candidate)?;
        on_change();
        Ok(())
    });

    stateful.add_listener(callback.clone())?;

    let target: Arc<dyn Service> = instance.clone();
    Ok(Subscription {
        delivered,
        attachment: Some(Attachment {
            target,
            listener: callback,
        }),
    })
}

/// Subscribe to a slice of a store with the default comparator
pub fn select<S, R, Sel, F>(
    store: &Arc<Store<S>>,
    selector: Sel,
    on_change: F,
) -> Result<Subscription<R>, CoreError>
where
    S: Send + Sync + 'static,
    R: AutoCompare + Clone + Send + 'static,
    Sel: Fn(&S) -> R + Send + Sync + 'static,
    F: Fn() + Send + Sync + 'static,
{
    select_with(store, selector, |a: &R, b: &R| a.auto_eq(b), on_change)
}

/// Subscribe to a slice of a store with a custom comparator
pub fn select_with<S, R, Sel, C, F>(
    store: &Arc<Store<S>>,
    selector: Sel,
    compare: C,
    on_change: F,
) -> Result<Subscription<R>, CoreError>
where
    S: Send + Sync + 'static,
    R: Clone + Send + 'static,
    Sel: Fn(&S) -> R + Send + Sync + 'static,
    C: Fn(&R, &R) -> bool + Send + Sync + 'static,
    F: Fn() + Send + Sync + 'static,
{
    subscribe_with(
        store,
        move |store: &Store<S>| Ok(selector(&*store.read()?)),
        compare,
        on_change,
    )
}

/// Signal on every state change of a service
pub fn watch<T, F>(instance: &Arc<T>, on_change: F) -> Result<Subscription<()>, CoreError>
where
    T: Service,
    F: Fn() + Send + Sync + 'static,
{
    subscribe_with(instance, |_: &T| Ok(()), |_: &(), _: &()| false, on_change)
}

/// Signal when a list of dependencies derived from a service changes
///
/// The lists are compared element by element with [`SameValue`].
pub fn watch_deps<T, D, Deps, F>(
    instance: &Arc<T>,
    deps: Deps,
    on_change: F,
) -> Result<Subscription<Vec<D>>, CoreError>
where
    T: Service,
    D: SameValue + Clone + Send + 'static,
    Deps: Fn(&T) -> Result<Vec<D>, CoreError> + Send + Sync + 'static,
    F: Fn() + Send + Sync + 'static,
{
    subscribe_with(
        instance,
        deps,
        |a: &Vec<D>, b: &Vec<D>| shallow_compare(a, b),
        on_change,
    )
}
