use std::fmt;
use std::sync::{Mutex, Weak};

use crate::zone::{RegistryInner, ZoneId};

/// A releasable capability referencing a registry entry by id.
///
/// The handle holds a weak back-reference, not ownership: releasing it is a
/// "remove this id" message to the registry, and releasing after the
/// registry itself is gone is a safe no-op.
#[derive(Clone)]
pub struct ZoneHandle {
    id: ZoneId,
    registry: Weak<Mutex<RegistryInner>>,
}

impl ZoneHandle {
    pub(crate) fn new(id: ZoneId, registry: Weak<Mutex<RegistryInner>>) -> Self {
        Self { id, registry }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    /// Remove the referenced zone from its registry. Already-removed ids
    /// and dead registries are ignored.
    pub fn release(&self) {
        if let Some(inner) = self.registry.upgrade() {
            let mut inner = inner.lock().unwrap();
            inner.zones.retain(|z| z.id != self.id);
        }
    }
}

impl fmt::Debug for ZoneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneHandle").field("id", &self.id).finish()
    }
}
