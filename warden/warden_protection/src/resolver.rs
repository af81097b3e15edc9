//! Permission resolver.
//!
//! The entry point the rest of the host uses: validate the location, try
//! the cache, fall back to the registry, remember the answer.

use std::sync::Arc;
use warden_core::config::CacheConfig;
use warden_core::id::PrincipalId;
use warden_core::types::{ActionKind, Location, LocationKey};
use warden_core::Result;

use crate::cache::VerdictCache;
use crate::registry::AuthorityRegistry;

/// Resolves permission queries through the verdict cache and the
/// authority registry.
///
/// Cached verdicts are keyed by principal and location only, so the first
/// action checked at a cell decides the cached answer for every action
/// there until the entry expires or is invalidated.
#[derive(Debug, Clone)]
pub struct ProtectionResolver {
    registry: Arc<AuthorityRegistry>,
    cache: Arc<VerdictCache>,
}

impl ProtectionResolver {
    /// Create a resolver over a loaded registry and a cache.
    pub fn new(registry: Arc<AuthorityRegistry>, cache: Arc<VerdictCache>) -> Self {
        tracing::info!(authorities = ?registry.active_names(), "protection resolver ready");
        Self { registry, cache }
    }

    /// Create a resolver with a fresh cache built from `config`.
    pub fn from_config(registry: Arc<AuthorityRegistry>, config: &CacheConfig) -> Result<Self> {
        let cache = VerdictCache::new(config)?;
        Ok(Self::new(registry, Arc::new(cache)))
    }

    /// Whether `principal` may perform `action` at `location`.
    ///
    /// Fails only for a malformed location, before the cache or any
    /// authority is consulted. No cache lock is held while authorities run.
    /// A verdict computed across an invalidation is returned but not cached.
    pub fn query(&self, principal: PrincipalId, location: &Location, action: ActionKind) -> Result<bool> {
        let key = location.key()?;

        if let Some(verdict) = self.cache.get(principal, &key) {
            return Ok(verdict);
        }

        let generation = self.cache.generation();
        let verdict = self.registry.resolve(principal, location, action);
        self.cache.put_if_current(principal, key, verdict, generation);
        Ok(verdict)
    }

    /// Forget every verdict for a principal. Call when their session ends.
    pub fn invalidate_principal(&self, principal: PrincipalId) {
        self.cache.invalidate(principal);
    }

    /// Forget every verdict at a cell. Call when protection there changes.
    pub fn invalidate_location(&self, key: &LocationKey) -> usize {
        self.cache.invalidate_location(key)
    }

    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    pub fn registry(&self) -> &AuthorityRegistry {
        &self.registry
    }
}
