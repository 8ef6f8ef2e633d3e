use super::config::ResidueSpec;
use super::residues::ResidueTable;
use crate::core::models::residue::ResidueType;
use crate::core::rotamers::rotamer::Rotamer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// A candidate list as stored in the cache. Immutable once stored.
pub type Candidates = Arc<[Rotamer]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub residue: ResidueSpec,
    pub residue_type: ResidueType,
}

impl CacheKey {
    pub fn new(residue: &ResidueSpec, residue_type: ResidueType) -> Self {
        Self {
            residue: residue.clone(),
            residue_type,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    candidates: Candidates,
    last_used: u64,
}

#[derive(Debug, Default)]
struct LruState {
    entries: HashMap<CacheKey, CacheEntry>,
    tick: u64,
}

impl LruState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// Hit and miss counters of a [`RotamerCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A bounded, least-recently-used store of rotamer candidate lists.
///
/// Shared between genes through an `Arc`. Puts are idempotent, so concurrent
/// misses on the same key only duplicate provider work.
#[derive(Debug)]
pub struct RotamerCache {
    capacity: usize,
    state: Mutex<LruState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RotamerCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Capacity for a gene with `residue_count` residues and `mutation_count` mutation types.
    ///
    /// `ceil(residue_count * (1 + 0.5 * mutation_count))`, at least 1.
    pub fn capacity_for(residue_count: usize, mutation_count: usize) -> usize {
        let size = residue_count as f64 * (1.0 + 0.5 * mutation_count as f64);
        (size.ceil() as usize).max(1)
    }

    fn lock(&self) -> MutexGuard<'_, LruState> {
        // Entries are immutable once stored, so a poisoned lock still holds valid data.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the candidates stored under `key`, marking them most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Candidates> {
        let mut state = self.lock();
        let tick = state.next_tick();
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = tick;
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(residue = %key.residue, residue_type = %key.residue_type, "Rotamer cache hit.");
                Some(Arc::clone(&entry.candidates))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `candidates` under `key`.
    ///
    /// Inserting a new key into a full cache first evicts the least recently
    /// used entry. Re-inserting an existing key replaces its value and
    /// refreshes its recency without evicting anything.
    pub fn put(&self, key: CacheKey, candidates: Candidates) {
        let mut state = self.lock();
        let tick = state.next_tick();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!(residue = %oldest.residue, residue_type = %oldest.residue_type, "Evicting least recently used rotamers.");
                state.entries.remove(&oldest);
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                candidates,
                last_used: tick,
            },
        );
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Rotamer caches and residue tables of one search run, keyed by gene name.
///
/// Genes configured with the same name share a cache and a residue table;
/// different names get independent ones. The registry is owned by the run and
/// torn down with it.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: Mutex<HashMap<String, Arc<RotamerCache>>>,
    tables: Mutex<HashMap<String, Arc<ResidueTable>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<RotamerCache>>> {
        self.caches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cache registered under `name`, creating it with `capacity` if absent.
    ///
    /// The capacity of an existing cache is never changed.
    pub fn get_or_create(&self, name: &str, capacity: usize) -> Arc<RotamerCache> {
        let mut caches = self.lock();
        Arc::clone(caches.entry(name.to_string()).or_insert_with(|| {
            debug!(gene = name, capacity, "Creating rotamer cache.");
            Arc::new(RotamerCache::new(capacity))
        }))
    }

    pub fn get(&self, name: &str) -> Option<Arc<RotamerCache>> {
        self.lock().get(name).cloned()
    }

    /// Returns the residue table registered under `name`, creating an
    /// unresolved one over `references` if absent.
    pub fn residue_table(&self, name: &str, references: &[ResidueSpec]) -> Arc<ResidueTable> {
        let mut tables = self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            tables
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(ResidueTable::new(references))),
        )
    }

    /// Drops the registry's handles to a gene's cache and residue table; genes
    /// still holding them keep them alive.
    pub fn remove(&self, name: &str) -> Option<Arc<RotamerCache>> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name);
        self.lock().remove(name)
    }

    pub fn clear(&self) {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(number: isize, residue_type: ResidueType) -> CacheKey {
        CacheKey::new(&ResidueSpec::new("Protein", number, None), residue_type)
    }

    fn candidates(n: usize) -> Candidates {
        vec![
            Rotamer {
                atoms: Vec::new(),
                bonds: Vec::new(),
            };
            n
        ]
        .into()
    }

    mod capacity_tests {
        use super::*;

        #[test]
        fn capacity_rounds_up() {
            assert_eq!(RotamerCache::capacity_for(1, 2), 2);
            assert_eq!(RotamerCache::capacity_for(3, 1), 5);
            assert_eq!(RotamerCache::capacity_for(4, 3), 10);
            assert_eq!(RotamerCache::capacity_for(2, 0), 2);
        }

        #[test]
        fn capacity_is_at_least_one() {
            assert_eq!(RotamerCache::capacity_for(0, 5), 1);
            assert_eq!(RotamerCache::new(0).capacity(), 1);
        }
    }

    mod lru_tests {
        use super::*;

        #[test]
        fn get_returns_the_stored_list() {
            let cache = RotamerCache::new(2);
            let stored = candidates(3);
            cache.put(key(1, ResidueType::Serine), Arc::clone(&stored));

            let fetched = cache.get(&key(1, ResidueType::Serine)).unwrap();
            assert!(Arc::ptr_eq(&fetched, &stored));
            assert!(cache.get(&key(1, ResidueType::Valine)).is_none());
            assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        }

        #[test]
        fn size_never_exceeds_capacity() {
            let cache = RotamerCache::new(3);
            for number in 0..10 {
                cache.put(key(number, ResidueType::Serine), candidates(1));
                assert!(cache.len() <= 3);
            }
            assert_eq!(cache.len(), 3);
        }

        #[test]
        fn evicts_least_recently_used_entry() {
            let cache = RotamerCache::new(2);
            cache.put(key(1, ResidueType::Serine), candidates(1));
            cache.put(key(2, ResidueType::Serine), candidates(1));
            assert!(cache.get(&key(1, ResidueType::Serine)).is_some());

            cache.put(key(3, ResidueType::Serine), candidates(1));

            assert!(cache.contains(&key(1, ResidueType::Serine)));
            assert!(!cache.contains(&key(2, ResidueType::Serine)));
            assert!(cache.contains(&key(3, ResidueType::Serine)));
        }

        #[test]
        fn reinserting_a_key_does_not_evict() {
            let cache = RotamerCache::new(2);
            cache.put(key(1, ResidueType::Serine), candidates(1));
            cache.put(key(2, ResidueType::Serine), candidates(1));
            cache.put(key(1, ResidueType::Serine), candidates(2));

            assert_eq!(cache.len(), 2);
            assert_eq!(cache.get(&key(1, ResidueType::Serine)).unwrap().len(), 2);
            assert!(cache.contains(&key(2, ResidueType::Serine)));
        }

        #[test]
        fn keys_differ_by_type_and_chain() {
            let cache = RotamerCache::new(4);
            cache.put(key(1, ResidueType::Serine), candidates(1));
            let chained = CacheKey::new(&ResidueSpec::new("Protein", 1, Some('A')), ResidueType::Serine);
            assert!(!cache.contains(&chained));
            assert!(!cache.contains(&key(1, ResidueType::Threonine)));
        }
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn same_name_shares_a_cache() {
            let registry = CacheRegistry::new();
            let a = registry.get_or_create("site", 4);
            let b = registry.get_or_create("site", 100);
            assert!(Arc::ptr_eq(&a, &b));
            assert_eq!(b.capacity(), 4);

            a.put(key(1, ResidueType::Serine), candidates(1));
            assert!(b.contains(&key(1, ResidueType::Serine)));
        }

        #[test]
        fn different_names_get_independent_caches() {
            let registry = CacheRegistry::new();
            let a = registry.get_or_create("first", 4);
            let b = registry.get_or_create("second", 4);
            assert!(!Arc::ptr_eq(&a, &b));
            assert_eq!(registry.len(), 2);
        }

        #[test]
        fn same_name_shares_a_residue_table() {
            let registry = CacheRegistry::new();
            let references = [ResidueSpec::new("Protein", 10, None)];
            let a = registry.residue_table("site", &references);
            let b = registry.residue_table("site", &[]);
            let c = registry.residue_table("other", &references);

            assert!(Arc::ptr_eq(&a, &b));
            assert_eq!(b.len(), 1);
            assert!(!Arc::ptr_eq(&a, &c));

            registry.remove("site");
            assert!(!Arc::ptr_eq(&a, &registry.residue_table("site", &references)));
        }

        #[test]
        fn remove_and_clear_tear_down_entries() {
            let registry = CacheRegistry::new();
            let held = registry.get_or_create("site", 4);
            registry.get_or_create("other", 4);

            assert!(registry.remove("site").is_some());
            assert!(registry.get("site").is_none());
            assert_eq!(held.capacity(), 4);

            let fresh = registry.get_or_create("site", 4);
            assert!(!Arc::ptr_eq(&held, &fresh));

            registry.clear();
            assert!(registry.is_empty());
        }

        #[test]
        fn cache_is_shareable_across_threads() {
            let registry = CacheRegistry::new();
            let cache = registry.get_or_create("site", 16);
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let cache = Arc::clone(&cache);
                    std::thread::spawn(move || {
                        for number in 0..4 {
                            cache.put(key(number, ResidueType::Serine), candidates(t + 1));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(cache.len(), 4);
        }
    }
}
