//! Verdict cache.
//!
//! Verdicts are stored per principal, then per location key. Both levels
//! expire on a sliding window: reading or writing an entry resets its
//! window, and any access for a principal resets that principal's window.
//!
//! Expiry is lazy. Stale entries are dropped when a lookup observes them,
//! and a stale principal map is dropped when that principal is next looked
//! up. Writes also sweep idle principals at most once per window, so a
//! principal that never returns is reclaimed as long as anyone else is
//! being queried. [`VerdictCache::purge_expired`] runs the same sweep on
//! demand.
//!
//! Every invalidation bumps a generation counter. A verdict computed before
//! an invalidation is refused by [`VerdictCache::put_if_current`], so an
//! in-flight query cannot undo it.
//!
//! Locking: the outer map is a sharded `DashMap`; each principal's map has
//! its own mutex. Lookups for different principals only share a shard read
//! lock, and lookups for the same principal serialize on its mutex. Locks
//! are always taken shard first, then principal.

mod clock;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use stats::CacheStats;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;
use parking_lot::Mutex;
use warden_core::config::CacheConfig;
use warden_core::error::ConfigError;
use warden_core::id::PrincipalId;
use warden_core::types::LocationKey;

use stats::StatsCounter;

fn is_stale(last_access: Instant, now: Instant, window: Duration) -> bool {
    now.saturating_duration_since(last_access) >= window
}

#[derive(Debug, Clone, Copy)]
struct CachedVerdict {
    verdict: bool,
    last_access: Instant,
}

enum Lookup {
    Hit(bool),
    Miss,
    EntryExpired,
    PrincipalExpired,
}

/// One principal's verdicts.
#[derive(Debug)]
struct PrincipalVerdicts {
    entries: HashMap<LocationKey, CachedVerdict>,
    last_access: Instant,
}

impl PrincipalVerdicts {
    fn new(now: Instant) -> Self {
        Self {
            entries: HashMap::new(),
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        is_stale(self.last_access, now, window)
    }

    fn lookup(&mut self, key: &LocationKey, now: Instant, window: Duration) -> Lookup {
        if self.is_expired(now, window) {
            return Lookup::PrincipalExpired;
        }
        self.last_access = now;

        let Some(entry) = self.entries.get_mut(key) else {
            return Lookup::Miss;
        };
        if is_stale(entry.last_access, now, window) {
            self.entries.remove(key);
            return Lookup::EntryExpired;
        }

        entry.last_access = now;
        Lookup::Hit(entry.verdict)
    }

    /// Store a verdict. Returns how many stale entries were discarded first.
    fn store(&mut self, key: LocationKey, verdict: bool, now: Instant, window: Duration) -> u64 {
        let mut discarded = 0;
        if self.is_expired(now, window) {
            discarded = self.entries.len() as u64;
            self.entries.clear();
        }

        self.last_access = now;
        self.entries.insert(key, CachedVerdict { verdict, last_access: now });
        discarded
    }

    /// Drop stale entries. Returns how many were dropped.
    fn purge(&mut self, now: Instant, window: Duration) -> u64 {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !is_stale(entry.last_access, now, window));
        (before - self.entries.len()) as u64
    }
}

/// Two-level, sliding-window cache of permission verdicts.
#[derive(Debug)]
pub struct VerdictCache {
    principals: DashMap<PrincipalId, Mutex<PrincipalVerdicts>>,
    window: Duration,
    clock: Arc<dyn Clock>,
    stats: StatsCounter,
    generation: AtomicU64,
    last_sweep: Mutex<Instant>,
}

impl VerdictCache {
    /// Create a cache using the system clock.
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let now = clock.now();
        Ok(Self {
            principals: DashMap::with_shard_amount(config.shard_amount),
            window: config.expire_after_access(),
            clock,
            stats: StatsCounter::default(),
            generation: AtomicU64::new(0),
            last_sweep: Mutex::new(now),
        })
    }

    /// The sliding expiry window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The cached verdict for this principal and key, if present and fresh.
    ///
    /// A hit refreshes the entry's window.
    pub fn get(&self, principal: PrincipalId, key: &LocationKey) -> Option<bool> {
        let now = self.clock.now();

        let lookup = match self.principals.get(&principal) {
            Some(verdicts) => verdicts.lock().lookup(key, now, self.window),
            None => Lookup::Miss,
        };

        match lookup {
            Lookup::Hit(verdict) => {
                self.stats.hit();
                Some(verdict)
            }
            Lookup::Miss => {
                self.stats.miss();
                None
            }
            Lookup::EntryExpired => {
                tracing::trace!(%principal, %key, "cached verdict expired");
                self.stats.evicted(1);
                self.stats.miss();
                None
            }
            Lookup::PrincipalExpired => {
                self.evict_principal_if_stale(principal, now);
                self.stats.miss();
                None
            }
        }
    }

    /// Store a verdict, replacing any previous one.
    pub fn put(&self, principal: PrincipalId, key: LocationKey, verdict: bool) {
        self.store(principal, key, verdict, None);
    }

    /// The current invalidation generation. Read it before computing a
    /// verdict and hand it to [`put_if_current`](Self::put_if_current).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store a verdict only if no invalidation happened since `generation`
    /// was read. Returns whether the verdict was stored.
    pub fn put_if_current(&self, principal: PrincipalId, key: LocationKey, verdict: bool, generation: u64) -> bool {
        self.store(principal, key, verdict, Some(generation))
    }

    fn is_current(&self, expected: Option<u64>) -> bool {
        expected.map_or(true, |generation| self.generation() == generation)
    }

    fn store(&self, principal: PrincipalId, key: LocationKey, verdict: bool, expected: Option<u64>) -> bool {
        let now = self.clock.now();

        // The generation is checked under the principal lock. Invalidations
        // bump it before removing anything, so a store that passes the check
        // is either removed by that invalidation or happens after it.
        let store_into = |verdicts: &Mutex<PrincipalVerdicts>| -> Option<u64> {
            let mut verdicts = verdicts.lock();
            if !self.is_current(expected) {
                return None;
            }
            Some(verdicts.store(key, verdict, now, self.window))
        };

        // Fast path: the principal already has a map, a shard read lock is enough.
        let stored = match self.principals.get(&principal) {
            Some(verdicts) => store_into(&*verdicts),
            None if !self.is_current(expected) => None,
            None => store_into(
                &*self
                    .principals
                    .entry(principal)
                    .or_insert_with(|| Mutex::new(PrincipalVerdicts::new(now))),
            ),
        };

        let Some(discarded) = stored else {
            tracing::debug!(%principal, %key, "dropped verdict computed before an invalidation");
            return false;
        };
        if discarded > 0 {
            tracing::trace!(%principal, discarded, "discarded stale verdicts on store");
            self.stats.evicted(discarded);
        }

        self.sweep_if_due(now);
        true
    }

    /// Sweep idle principals if a full window passed since the last sweep.
    fn sweep_if_due(&self, now: Instant) {
        let Some(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if !is_stale(*last_sweep, now, self.window) {
            return;
        }
        *last_sweep = now;
        drop(last_sweep);

        let discarded = self.purge_expired();
        if discarded > 0 {
            tracing::trace!(discarded, "swept idle verdicts");
        }
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop every verdict for a principal, e.g. when their session ends.
    pub fn invalidate(&self, principal: PrincipalId) {
        self.bump_generation();
        if self.principals.remove(&principal).is_some() {
            tracing::debug!(%principal, "invalidated principal verdicts");
        }
    }

    /// Drop one verdict.
    pub fn invalidate_entry(&self, principal: PrincipalId, key: &LocationKey) -> bool {
        self.bump_generation();
        match self.principals.get(&principal) {
            Some(verdicts) => verdicts.lock().entries.remove(key).is_some(),
            None => false,
        }
    }

    /// Drop the verdict for `key` across all principals, e.g. after the
    /// block there changed owner. Returns how many verdicts were dropped.
    pub fn invalidate_location(&self, key: &LocationKey) -> usize {
        self.bump_generation();
        let removed = self
            .principals
            .iter()
            .filter(|verdicts| verdicts.value().lock().entries.remove(key).is_some())
            .count();

        tracing::debug!(%key, removed, "invalidated location verdicts");
        removed
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.bump_generation();
        self.principals.clear();
    }

    /// Sweep stale entries and stale principal maps.
    ///
    /// Returns how many verdicts were discarded.
    pub fn purge_expired(&self) -> u64 {
        let now = self.clock.now();
        let window = self.window;
        let mut discarded = 0;

        self.principals.retain(|_, verdicts| {
            let verdicts = verdicts.get_mut();
            if verdicts.is_expired(now, window) {
                discarded += verdicts.entries.len() as u64;
                return false;
            }
            discarded += verdicts.purge(now, window);
            true
        });

        self.stats.evicted(discarded);
        discarded
    }

    /// Number of principals with a map, including stale ones not yet evicted.
    pub fn principal_count(&self) -> usize {
        self.principals.len()
    }

    /// Number of stored verdicts, including stale ones not yet evicted.
    pub fn entry_count(&self) -> usize {
        self.principals
            .iter()
            .map(|verdicts| verdicts.value().lock().entries.len())
            .sum()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn evict_principal_if_stale(&self, principal: PrincipalId, now: Instant) {
        // Re-check under the shard write lock: a concurrent put may have
        // refreshed the map since the lookup saw it stale.
        let removed = self
            .principals
            .remove_if(&principal, |_, verdicts| verdicts.lock().is_expired(now, self.window));

        if let Some((_, verdicts)) = removed {
            let count = verdicts.into_inner().entries.len() as u64;
            tracing::trace!(%principal, count, "evicted idle principal");
            self.stats.evicted(count);
        }
    }
}
