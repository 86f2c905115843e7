//! Keyed store of materialized results.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use regex::Regex;

use crate::error::{Error, Result};

use super::clock::{Clock, SystemClock};
use super::policy::{CachePolicy, CachePolicyEngine, Expiration};

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    expiration: Expiration,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Arc<dyn Any + Send + Sync>, expiration: Expiration, now: Instant) -> Self {
        let expires_at = match expiration {
            Expiration::Never => None,
            Expiration::Absolute(lifetime) | Expiration::Sliding(lifetime) => now.checked_add(lifetime),
        };
        Self {
            value,
            expiration,
            expires_at,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }

    fn touch(&mut self, now: Instant) {
        if let Expiration::Sliding(window) = self.expiration {
            // Past the clock's range means the entry never expires.
            self.expires_at = now.checked_add(window);
        }
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a value.
    pub hits: u64,
    /// Reads that found nothing, an expired entry or a different type.
    pub misses: u64,
}

/// Thread-safe cache of materialized result sequences.
///
/// Values are stored whole as `Arc<Vec<T>>`; a read returns either the old or
/// the new value of a key, never a partial one.
pub struct ResultCache {
    clock: Arc<dyn Clock>,
    policies: RwLock<CachePolicyEngine>,
    entries: Mutex<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Empty cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty cache on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            policies: RwLock::new(CachePolicyEngine::new()),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Register a cache policy (see [`CachePolicyEngine::register`]).
    pub fn register_policy(&self, policy: CachePolicy) -> Result<()> {
        self.policies.write().register(policy)
    }

    /// Set the global policy.
    pub fn set_global_policy(&self, policy: CachePolicy) -> Result<()> {
        self.policies.write().set_global(policy)
    }

    /// Expiration that a write to `key` would get now.
    pub fn expiration_for(&self, key: &str) -> Expiration {
        self.policies.read().resolve(key).expiration()
    }

    /// Cached sequence for `key`, if present, unexpired and of type `T`.
    pub fn try_get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<Vec<T>>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!("cache entry '{}' expired", key);
        }

        let found = match entries.get_mut(key) {
            None => None,
            Some(entry) => match Arc::clone(&entry.value).downcast::<Vec<T>>() {
                Ok(value) => {
                    entry.touch(now);
                    Some(value)
                }
                Err(_) => {
                    warn!(
                        "cache entry '{}' is not a sequence of {}",
                        key,
                        std::any::type_name::<T>()
                    );
                    None
                }
            },
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("cache hit '{}'", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("cache miss '{}'", key);
        }
        found
    }

    /// Store `items` under `key` using the policy resolved for the key.
    pub fn add<T: Send + Sync + 'static>(&self, key: impl Into<String>, items: Arc<Vec<T>>) {
        let key = key.into();
        let expiration = self.expiration_for(&key);
        self.insert(key, items, expiration);
    }

    /// Store `items` under `key` with an explicit policy.
    pub fn add_with_policy<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        items: Arc<Vec<T>>,
        policy: &CachePolicy,
    ) -> Result<()> {
        policy.validate()?;
        self.insert(key.into(), items, policy.expiration());
        Ok(())
    }

    fn insert<T: Send + Sync + 'static>(&self, key: String, items: Arc<Vec<T>>, expiration: Expiration) {
        let now = self.clock.now();
        let entry = Entry::new(items, expiration, now);
        debug!("cache add '{}' ({:?})", key, expiration);
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(key, entry);
    }

    /// Remove one key. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Remove every key matching `pattern`. Returns the number removed.
    pub fn remove_matching(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !regex.is_match(key));
        Ok(before - entries.len())
    }

    /// Drop expired entries now. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Drop every entry and reset the counters. Policies are kept.
    pub fn reset(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("cache reset");
    }

    /// Number of stored entries, expired ones included until the next write or purge.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Hit and miss counters since creation or the last reset.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
