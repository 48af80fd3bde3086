//! Bounded memo cache for single-record property evaluations.
//!
//! The cache is an explicit object owned by the caller and injected into
//! [`PolynomialPropertyModel`](crate::PolynomialPropertyModel); there is no
//! process-wide instance. One mutex guards the map, counters are atomics.
//! Returned values never depend on what happens to be cached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tc_core::RecordId;
use tracing::trace;

use crate::phase::Phase;
use crate::properties::ThermodynamicProperties;
use crate::record::DatabaseRecord;

/// Default number of memoized evaluations.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Identity of one evaluation.
///
/// Ids alone are not unique across compounds, so the key also carries every
/// numeric input of the evaluation: the Cp coefficients, the baseline values
/// and the phase. Two keys are equal only if the results are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub record: RecordId,
    pub reference: RecordId,
    pub phase: Phase,
    pub coefficient_bits: [u64; 6],
    pub h_ref_bits: u64,
    pub s_ref_bits: u64,
    pub elemental: bool,
    pub scheme: u32,
    pub t_bits: u64,
}

impl PropertyKey {
    pub fn new(
        record: &DatabaseRecord,
        reference: &DatabaseRecord,
        elemental: bool,
        scheme: u32,
        t: f64,
    ) -> Self {
        Self {
            record: record.id(),
            reference: reference.id(),
            phase: record.phase(),
            coefficient_bits: record.coefficients().as_array().map(f64::to_bits),
            h_ref_bits: reference.h298_kj().to_bits(),
            s_ref_bits: reference.s298().to_bits(),
            elemental,
            scheme,
            t_bits: t.to_bits(),
        }
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
    pub capacity: usize,
}

struct Slot {
    value: ThermodynamicProperties,
    last_used: u64,
}

#[derive(Default)]
struct LruState {
    slots: HashMap<PropertyKey, Slot>,
    clock: u64,
}

/// Least-recently-used cache of [`ThermodynamicProperties`].
pub struct PropertyCache {
    capacity: usize,
    state: Mutex<LruState>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for PropertyCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for PropertyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl PropertyCache {
    /// A capacity of 0 disables storage (every lookup misses).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(LruState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave a half-written slot behind,
    // so a poisoned map is still usable.
    fn lock(&self) -> MutexGuard<'_, LruState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &PropertyKey) -> Option<ThermodynamicProperties> {
        let mut state = self.lock();
        state.clock += 1;
        let now = state.clock;
        match state.slots.get_mut(key) {
            Some(slot) => {
                slot.last_used = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(slot.value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite; evicts the least recently used entry when full.
    pub fn insert(&self, key: PropertyKey, value: ThermodynamicProperties) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.lock();
        state.clock += 1;
        let now = state.clock;

        if !state.slots.contains_key(&key) && state.slots.len() >= self.capacity {
            let oldest = state
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(k, _)| *k);
            if let Some(oldest) = oldest {
                state.slots.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                trace!(record = %oldest.record, "property cache eviction");
            }
        }

        state.slots.insert(
            key,
            Slot {
                value,
                last_used: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.slots.clear();
        state.clock = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            len: self.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, h298: f64) -> DatabaseRecord {
        DatabaseRecord::builder(RecordId::from_index(id), "CO", Phase::Gas)
            .range(298.0, 1500.0)
            .reference(h298, 197.66)
            .constant_cp(29.1)
            .build()
            .unwrap()
    }

    fn key(id: u32, t: f64) -> PropertyKey {
        let r = record(id, -110.53);
        PropertyKey::new(&r, &r, false, 0, t)
    }

    fn value(t: f64) -> ThermodynamicProperties {
        ThermodynamicProperties::new(t, 30.0, t * 10.0, 1.0, None)
    }

    #[test]
    fn hit_and_miss_are_counted() {
        let cache = PropertyCache::new(4);
        assert!(cache.get(&key(0, 300.0)).is_none());
        cache.insert(key(0, 300.0), value(300.0));
        assert_eq!(cache.get(&key(0, 300.0)), Some(value(300.0)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.len, 1);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = PropertyCache::new(2);
        cache.insert(key(0, 300.0), value(300.0));
        cache.insert(key(0, 400.0), value(400.0));
        // touch 300 so that 400 becomes the oldest
        assert!(cache.get(&key(0, 300.0)).is_some());
        cache.insert(key(0, 500.0), value(500.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(0, 300.0)).is_some());
        assert!(cache.get(&key(0, 400.0)).is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn overwrite_does_not_evict() {
        let cache = PropertyCache::new(1);
        cache.insert(key(0, 300.0), value(300.0));
        cache.insert(key(0, 300.0), value(300.0));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = PropertyCache::new(0);
        cache.insert(key(0, 300.0), value(300.0));
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = PropertyCache::new(8);
        cache.insert(key(1, 300.0), value(300.0));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn same_id_with_different_content_is_a_different_key() {
        let a = record(0, -110.53);
        let b = record(0, -393.51);
        assert_ne!(
            PropertyKey::new(&a, &a, false, 0, 500.0),
            PropertyKey::new(&b, &b, false, 0, 500.0)
        );
        assert_eq!(
            PropertyKey::new(&a, &a, false, 0, 500.0),
            PropertyKey::new(&a.clone(), &a, false, 0, 500.0)
        );
    }
}
