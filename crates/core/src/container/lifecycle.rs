use crate::container::instance::{Instance, InstanceId};
use crate::debug::debug_event;
use crate::errors::CoreError;
use crate::foundation::traits::Service;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lifecycle state of an instance as seen by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No consumer has the instance mounted
    Unused,
    /// Mounted by this many consumers
    Active(usize),
}

/// Ref-count entry; capabilities are probed once at first mount
struct RefCountEntry {
    instance: Arc<dyn Service>,
    count: usize,
    deactivates: bool,
}

/// Reference counter driving activation hooks
///
/// The first mount of an instance runs its [`OnActivate`](crate::OnActivate)
/// hook, the last unmount runs its [`OnDeactivate`](crate::OnDeactivate) hook.
/// Hooks run after the entry has been updated and without any lock held; a
/// failing hook propagates its error and leaves the entry as it is.
#[derive(Default)]
pub struct LifecycleTracker {
    entries: Mutex<HashMap<InstanceId, RefCountEntry>>,
}

impl LifecycleTracker {
    /// Create a new lifecycle tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a consumer mount, returning the new count
    pub fn report_mount(&self, instance: &Instance) -> Result<usize, CoreError> {
        let activate = {
            let mut entries = self.entries.lock().map_err(|_| CoreError::lock("lifecycle_entries"))?;
            if let Some(entry) = entries.get_mut(&instance.id()) {
                entry.count += 1;
                return Ok(entry.count);
            }

            let service = instance.service();
            entries.insert(
                instance.id(),
                RefCountEntry {
                    instance: service.clone(),
                    count: 1,
                    deactivates: service.as_on_deactivate().is_some(),
                },
            );
            service.as_on_activate().is_some()
        };

        debug_event!(service = instance.service_name(), "service activated");
        if activate {
            if let Some(hook) = instance.service().as_on_activate() {
                hook.on_activate()?;
            }
        }

        Ok(1)
    }

    /// Record a consumer unmount, returning the remaining count
    ///
    /// Unmounting an instance that is not mounted is a no-op.
    pub fn report_unmount(&self, instance: &Instance) -> Result<usize, CoreError> {
        let released = {
            let mut entries = self.entries.lock().map_err(|_| CoreError::lock("lifecycle_entries"))?;
            let Some(entry) = entries.get_mut(&instance.id()) else {
                debug_event!(service = instance.service_name(), "unmount of an unmounted service ignored");
                return Ok(0);
            };

            if entry.count > 1 {
                entry.count -= 1;
                return Ok(entry.count);
            }
            entries.remove(&instance.id())
        };

        debug_event!(service = instance.service_name(), "service deactivated");
        if let Some(entry) = released.filter(|entry| entry.deactivates) {
            if let Some(hook) = entry.instance.as_on_deactivate() {
                hook.on_deactivate()?;
            }
        }

        Ok(0)
    }

    /// Get the lifecycle state of an instance
    pub fn state(&self, instance: &Instance) -> LifecycleState {
        match self.ref_count(instance) {
            0 => LifecycleState::Unused,
            count => LifecycleState::Active(count),
        }
    }

    /// Get the number of consumers that have an instance mounted
    pub fn ref_count(&self, instance: &Instance) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.get(&instance.id()).map_or(0, |entry| entry.count))
            .unwrap_or(0)
    }

    /// Get the number of instances currently mounted
    pub fn active_count(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for LifecycleTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleTracker")
            .field("active_count", &self.active_count())
            .finish()
    }
}
