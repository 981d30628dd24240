//! Per-directory phonetic caches and the registry that owns them.
//!
//! A [`PhoneticCache`] holds one loaded [`DictionaryMapping`] generation
//! and republishes it atomically on reload. The [`CacheRegistry`] hands out
//! at most one live cache per canonical directory path.
//!
//! # Concurrency
//!
//! * Lookups are wait-free: they load the current snapshot through an
//!   `ArcSwap` and read immutable data. A lookup never blocks on a reload
//!   and never observes a half-built mapping.
//! * Reloads are serialized per instance by a mutex; reloads of different
//!   instances run fully in parallel.
//! * The registry's check-then-insert is atomic per path (the concurrent
//!   map's entry lock), so N racing `get_instance` calls for one uncached
//!   path construct exactly one instance and run exactly one load.
//!
//! # Lifecycle
//!
//! `Uninitialized -> Loaded` on successful construction, `Loaded -> Loaded`
//! on each successful reload, `Loaded -> Destroyed` on eviction. A failed
//! construction never enters the registry; a failed reload keeps serving
//! the prior generation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::dictionary::loader::load_dict;
use crate::dictionary::DictionaryMapping;
use crate::error::{DictError, Result};

/// A loaded dictionary bound to one canonical directory.
///
/// Obtained from [`CacheRegistry::get_instance`]; shared freely across
/// threads behind an `Arc`. All methods take `&self`.
#[derive(Debug)]
pub struct PhoneticCache {
    /// Canonical directory the dictionary was loaded from. Immutable for
    /// the life of the instance.
    dict_path: PathBuf,
    /// Current mapping generation. Replaced wholesale by reload, never
    /// edited in place.
    mapping: ArcSwap<DictionaryMapping>,
    /// Serializes reload (and destroy) for this instance.
    reload_lock: Mutex<()>,
    destroyed: AtomicBool,
}

impl PhoneticCache {
    /// Construct by synchronously loading the dictionary for `dict_path`.
    ///
    /// `dict_path` must already be canonical; the registry guarantees it.
    fn open(dict_path: PathBuf) -> Result<Self> {
        let mapping = load_dict(&dict_path)?;
        Ok(Self {
            dict_path,
            mapping: ArcSwap::from_pointee(mapping),
            reload_lock: Mutex::new(()),
            destroyed: AtomicBool::new(false),
        })
    }

    /// The canonical directory this cache serves.
    pub fn dict_path(&self) -> &Path {
        &self.dict_path
    }

    /// Pronunciation of the first dictionary record for `key`.
    ///
    /// Returns `Ok(None)` when the key is absent and
    /// [`DictError::InstanceDestroyed`] when the instance was evicted;
    /// obtain a fresh handle from the registry in that case.
    pub fn lookup(&self, key: &str) -> Result<Option<String>> {
        // Snapshot before the flag check: destroy publishes the flag
        // before swapping in the empty mapping, so a reader holding the
        // destroy-era mapping always sees the flag here and a surviving
        // `Ok` is always answered from a fully loaded generation.
        let snapshot = self.mapping.load();
        if self.destroyed.load(Ordering::Acquire) {
            return Err(DictError::InstanceDestroyed(self.dict_path.clone()));
        }
        Ok(snapshot.pronunciation(key).map(str::to_owned))
    }

    /// Pin the current mapping generation.
    ///
    /// The returned snapshot stays valid and fully consistent across later
    /// reloads; use it for a burst of lookups that must agree with each
    /// other.
    pub fn snapshot(&self) -> Result<Arc<DictionaryMapping>> {
        // Same snapshot-then-flag order as `lookup`.
        let snapshot = self.mapping.load_full();
        if self.destroyed.load(Ordering::Acquire) {
            return Err(DictError::InstanceDestroyed(self.dict_path.clone()));
        }
        Ok(snapshot)
    }

    /// Reload the dictionary from this instance's directory.
    ///
    /// On success the new mapping is published atomically and `true` is
    /// returned. On failure the previous mapping stays in service, the
    /// error is logged, and `false` is returned so the caller can retry
    /// later; a failed reload is never fatal. Concurrent reloads of the
    /// same instance are serialized.
    pub fn reload(&self) -> bool {
        let _guard = self.reload_lock.lock();
        if self.destroyed.load(Ordering::Acquire) {
            warn!(
                path = %self.dict_path.display(),
                "reload requested on a destroyed phonetic cache"
            );
            return false;
        }
        match load_dict(&self.dict_path) {
            Ok(new_mapping) => {
                self.mapping.store(Arc::new(new_mapping));
                info!(path = %self.dict_path.display(), "phonetic dictionary reloaded");
                true
            }
            Err(e) => {
                warn!(
                    path = %self.dict_path.display(),
                    error = %e,
                    "phonetic dictionary reload failed, previous mapping retained"
                );
                false
            }
        }
    }

    /// Whether this instance was destroyed by eviction.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Tear down: release the held mapping and refuse further use.
    ///
    /// Takes the reload lock so an in-flight reload cannot republish after
    /// the mapping is released. Readers still holding a pinned snapshot
    /// keep it alive until they drop it.
    fn destroy(&self) {
        let _guard = self.reload_lock.lock();
        // Flag before the swap: readers re-check the flag after loading
        // the mapping, so the empty mapping below is never served as a
        // "not found" answer.
        self.destroyed.store(true, Ordering::Release);
        self.mapping.store(Arc::new(DictionaryMapping::default()));
        debug!(path = %self.dict_path.display(), "phonetic cache destroyed");
    }
}

/// Owns every live [`PhoneticCache`], at most one per canonical directory.
///
/// The registry is an ordinary value the host application creates at
/// startup and passes around (typically inside an `Arc`); its shutdown is
/// deterministic via [`CacheRegistry::shutdown`] rather than left to drop
/// order.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    instances: DashMap<PathBuf, Arc<PhoneticCache>>,
}

impl CacheRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the cache for `path`.
    ///
    /// `path` is resolved to canonical form first, so textually different
    /// paths naming the same directory share one instance. For an uncached
    /// path the dictionary is loaded synchronously inside the insertion
    /// critical section; racing callers for the same path all receive the
    /// one instance that won. A failed load propagates and leaves nothing
    /// registered.
    ///
    /// The load holds the map's shard lock, so another uncached path that
    /// hashes to the same shard waits for it; lookups and reloads on live
    /// instances are unaffected.
    pub fn get_instance(&self, path: impl AsRef<Path>) -> Result<Arc<PhoneticCache>> {
        let canonical = canonicalize(path.as_ref())?;
        match self.instances.entry(canonical.clone()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let cache = Arc::new(PhoneticCache::open(canonical)?);
                entry.insert(Arc::clone(&cache));
                Ok(cache)
            }
        }
    }

    /// Get or create the cache for the default dictionary root.
    ///
    /// See [`crate::config::dict_root`] for how the root is resolved.
    pub fn get_default_instance(&self) -> Result<Arc<PhoneticCache>> {
        self.get_instance(crate::config::dict_root())
    }

    /// Remove and destroy the cache for `path`.
    ///
    /// Returns the evicted instance, or `None` when no instance exists for
    /// the path (including when the path can no longer be canonicalized).
    /// Eviction is a no-op for unknown paths, not an error. A later
    /// `get_instance` for the same path constructs a fresh instance.
    pub fn evict(&self, path: impl AsRef<Path>) -> Option<Arc<PhoneticCache>> {
        let canonical = match canonicalize(path.as_ref()) {
            Ok(canonical) => canonical,
            Err(e) => {
                debug!(path = %path.as_ref().display(), error = %e, "evict: cannot canonicalize");
                return None;
            }
        };
        let (_, cache) = self.instances.remove(&canonical)?;
        cache.destroy();
        Some(cache)
    }

    /// Destroy every remaining instance.
    ///
    /// Called by the host on shutdown so dictionary memory is released
    /// deterministically instead of whenever the last `Arc` happens to
    /// drop.
    pub fn shutdown(&self) {
        self.instances.retain(|_, cache| {
            cache.destroy();
            false
        });
        info!("phonetic cache registry shut down");
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the registry holds no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Resolve `path` to the absolute, symlink-free form used as an instance's
/// identity key.
fn canonicalize(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|source| DictError::Canonicalize {
        path: path.to_owned(),
        source,
    })
}
