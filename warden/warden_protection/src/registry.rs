//! Authority registry.
//!
//! Holds authorities in registration order, binds them, and combines their
//! answers for a single query.

use warden_core::error::BindError;
use warden_core::id::PrincipalId;
use warden_core::types::{ActionKind, Location};

use crate::authority::Authority;

/// Outcome of [`AuthorityRegistry::load_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Authorities that bound and are now active.
    pub loaded: Vec<String>,

    /// Authorities that failed to bind and were dropped.
    pub failed: Vec<(String, BindError)>,
}

/// Ordered collection of authorities.
///
/// Registration order matters: [`resolve`](Self::resolve) polls active
/// authorities in that order and stops at the first denial.
#[derive(Default)]
pub struct AuthorityRegistry {
    /// Registered but not yet loaded.
    pending: Vec<Box<dyn Authority>>,

    /// Loaded successfully, in registration order.
    active: Vec<Box<dyn Authority>>,
}

impl AuthorityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an authority. It is not queried until [`load_all`](Self::load_all)
    /// binds it.
    pub fn register(&mut self, authority: Box<dyn Authority>) {
        tracing::debug!(authority = authority.name(), "registered authority");
        self.pending.push(authority);
    }

    /// Bind every pending authority.
    ///
    /// Authorities that bind join the active set after those loaded earlier.
    /// Authorities that fail are dropped for good.
    pub fn load_all(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        for mut authority in self.pending.drain(..) {
            let name = authority.name().to_string();
            match authority.load() {
                Ok(()) => {
                    tracing::info!(authority = %name, "authority loaded");
                    report.loaded.push(name);
                    self.active.push(authority);
                }
                Err(e) => {
                    tracing::warn!(authority = %name, error = %e, "authority failed to load, excluding it");
                    report.failed.push((name, e));
                }
            }
        }

        report
    }

    /// Decide whether the action is allowed.
    ///
    /// The first active authority that answers `false` denies the action and
    /// later authorities are not asked. With no denial (or no authorities)
    /// the action is allowed.
    pub fn resolve(&self, principal: PrincipalId, location: &Location, action: ActionKind) -> bool {
        match self
            .active
            .iter()
            .find(|authority| !authority.has_permission(principal, location, action))
        {
            Some(authority) => {
                tracing::debug!(authority = authority.name(), %principal, %action, "action denied");
                false
            }
            None => true,
        }
    }

    /// Names of active authorities, in query order.
    pub fn active_names(&self) -> Vec<&str> {
        self.active.iter().map(|a| a.name()).collect()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl std::fmt::Debug for AuthorityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorityRegistry")
            .field("active", &self.active_names())
            .field("pending", &self.pending.len())
            .finish()
    }
}
