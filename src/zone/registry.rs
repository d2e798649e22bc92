use std::sync::{Arc, Mutex};

use crate::errors::EngineError;
use crate::geometry::{Point, Region, RegionMask};
use crate::zone::{Zone, ZoneCallback, ZoneEvent, ZoneHandle, ZoneId};

pub(crate) struct RegistryInner {
    pub(crate) zones: Vec<Zone>,
    next_id: u32,
}

/// Owns the live set of zones, in insertion order.
///
/// The per-call result vector of [`test`](ZoneRegistry::test) is indexed by
/// that order, not by id, so positional indices must not be memoized across
/// add/remove calls.
pub struct ZoneRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                zones: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Validate and register a zone, returning the handle that removes it
    /// on release.
    pub fn add(
        &self,
        region: Region,
        cell_size: f64,
        callback: ZoneCallback,
    ) -> Result<ZoneHandle, EngineError> {
        let mask = RegionMask::build(&region, cell_size)?;
        let mut inner = self.inner.lock().unwrap();
        let id = ZoneId(inner.next_id);
        inner.next_id += 1;
        inner.zones.push(Zone {
            id,
            region,
            mask,
            callback,
        });
        Ok(ZoneHandle::new(id, Arc::downgrade(&self.inner)))
    }

    /// Segment-test every live zone, one boolean per zone in current order.
    ///
    /// Stateless: no memory of previous results. On a hit with
    /// `invoke_on_enter` set the zone's callback fires with `entered: true`;
    /// on a miss with `invoke_on_exit` set it fires with `entered: false`.
    /// Edge-triggering is the caller's responsibility.
    pub fn test(
        &self,
        p0: Point,
        p1: Point,
        invoke_on_enter: bool,
        invoke_on_exit: bool,
    ) -> Vec<bool> {
        // Collect under the lock, dispatch after releasing it: a callback is
        // allowed to release its own handle without deadlocking.
        let mut pending: Vec<(ZoneCallback, ZoneEvent)> = Vec::new();
        let hits: Vec<bool> = {
            let inner = self.inner.lock().unwrap();
            let hits: Vec<bool> = inner.zones.iter().map(|z| z.mask.test(p0, p1)).collect();
            for (zone, &hit) in inner.zones.iter().zip(&hits) {
                if (hit && invoke_on_enter) || (!hit && invoke_on_exit) {
                    pending.push((
                        zone.callback.clone(),
                        ZoneEvent {
                            x: p1.x,
                            y: p1.y,
                            entered: hit,
                            handle: ZoneHandle::new(zone.id, Arc::downgrade(&self.inner)),
                        },
                    ));
                }
            }
            hits
        };
        for (callback, event) in pending {
            callback(event);
        }
        hits
    }

    /// Fire one zone's callback directly with a membership edge. Used by the
    /// trial controller, which keeps the hysteresis memory itself.
    pub(crate) fn notify(&self, id: ZoneId, x: f64, y: f64, entered: bool) {
        let found = {
            let inner = self.inner.lock().unwrap();
            inner.zones.iter().find(|z| z.id == id).map(|z| {
                (
                    z.callback.clone(),
                    ZoneHandle::new(z.id, Arc::downgrade(&self.inner)),
                )
            })
        };
        if let Some((callback, handle)) = found {
            callback(ZoneEvent {
                x,
                y,
                entered,
                handle,
            });
        }
    }

    /// Delete every zone whose id is in `ids`; absent ids are ignored.
    pub fn remove(&self, ids: &[ZoneId]) {
        let mut inner = self.inner.lock().unwrap();
        inner.zones.retain(|z| !ids.contains(&z.id));
    }

    /// Live zone ids in current (insertion) order.
    pub fn ids(&self) -> Vec<ZoneId> {
        let inner = self.inner.lock().unwrap();
        inner.zones.iter().map(|z| z.id).collect()
    }

    /// The boundary a zone was registered with.
    pub fn region(&self, id: ZoneId) -> Option<Region> {
        let inner = self.inner.lock().unwrap();
        inner.zones.iter().find(|z| z.id == id).map(|z| z.region.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::zone::noop_callback;

    fn unit_square() -> Region {
        Region::rect(Point::new(-0.1, -0.1), Point::new(0.1, 0.1))
    }

    fn counting_callback() -> (ZoneCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let cb: ZoneCallback = Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (cb, count)
    }

    #[test]
    fn ids_are_monotone_and_never_reused() {
        let registry = ZoneRegistry::new();
        let a = registry.add(unit_square(), 0.01, noop_callback()).unwrap();
        let b = registry.add(unit_square(), 0.01, noop_callback()).unwrap();
        assert_eq!(a.id().as_u32(), 1);
        assert_eq!(b.id().as_u32(), 2);

        registry.remove(&[a.id(), b.id()]);
        let c = registry.add(unit_square(), 0.01, noop_callback()).unwrap();
        assert_eq!(c.id().as_u32(), 3);
    }

    #[test]
    fn add_surfaces_invalid_region() {
        let registry = ZoneRegistry::new();
        let bad = Region::new(vec![Point::new(0.0, 0.0)]);
        assert!(matches!(
            registry.add(bad, 0.01, noop_callback()),
            Err(EngineError::InvalidRegion(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_returns_one_result_per_zone_in_insertion_order() {
        let registry = ZoneRegistry::new();
        let left = Region::rect(Point::new(-0.3, -0.1), Point::new(-0.1, 0.1));
        let right = Region::rect(Point::new(0.1, -0.1), Point::new(0.3, 0.1));
        registry.add(left, 0.01, noop_callback()).unwrap();
        registry.add(right, 0.01, noop_callback()).unwrap();

        let p = Point::new(-0.2, 0.0);
        assert_eq!(registry.test(p, p, false, false), vec![true, false]);
        let p = Point::new(0.2, 0.0);
        assert_eq!(registry.test(p, p, false, false), vec![false, true]);
    }

    #[test]
    fn callbacks_honor_enter_and_exit_flags() {
        let registry = ZoneRegistry::new();
        let (cb, count) = counting_callback();
        registry.add(unit_square(), 0.01, cb).unwrap();

        let inside = Point::new(0.0, 0.0);
        let outside = Point::new(0.5, 0.5);

        registry.test(inside, inside, false, false);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        registry.test(inside, inside, true, false);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        registry.test(outside, outside, true, false);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        registry.test(outside, outside, false, true);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn released_handle_drops_zone_from_result_vector() {
        let registry = ZoneRegistry::new();
        let (cb, count) = counting_callback();
        let first = registry.add(unit_square(), 0.01, cb).unwrap();
        // Same region under a second id persists after the first is gone.
        registry.add(unit_square(), 0.01, noop_callback()).unwrap();

        let p = Point::new(0.0, 0.0);
        assert_eq!(registry.test(p, p, true, false).len(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        first.release();
        assert_eq!(registry.test(p, p, true, false), vec![true]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_after_registry_drop_is_a_noop() {
        let registry = ZoneRegistry::new();
        let handle = registry.add(unit_square(), 0.01, noop_callback()).unwrap();
        drop(registry);
        handle.release();
        handle.release();
    }

    #[test]
    fn remove_ignores_absent_ids() {
        let registry = ZoneRegistry::new();
        registry.add(unit_square(), 0.01, noop_callback()).unwrap();
        registry.remove(&[ZoneId(99)]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn region_lookup_by_id() {
        let registry = ZoneRegistry::new();
        let handle = registry.add(unit_square(), 0.01, noop_callback()).unwrap();
        assert_eq!(registry.region(handle.id()), Some(unit_square()));
        assert_eq!(registry.region(ZoneId(99)), None);
    }

    #[test]
    fn callback_may_release_its_own_handle() {
        let registry = ZoneRegistry::new();
        let cb: ZoneCallback = Arc::new(|event: ZoneEvent| {
            event.handle.release();
        });
        registry.add(unit_square(), 0.01, cb).unwrap();

        let p = Point::new(0.0, 0.0);
        registry.test(p, p, true, false);
        assert!(registry.is_empty());
    }
}
