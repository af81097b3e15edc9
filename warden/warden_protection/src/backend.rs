//! External protection backends.
//!
//! Backends are the claim and lock systems that authorities bind to. The
//! host installs them in a [`BackendDirectory`] under a name; authorities
//! look them up by that name when they load.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use dashmap::DashMap;
use warden_core::error::{BackendError, BindError};
use warden_core::id::PrincipalId;
use warden_core::types::LocationKey;

/// A lock system: individual blocks may be locked to their owners.
pub trait LockBackend: Send + Sync {
    /// Whether the principal may use the block at `key`.
    fn is_allowed(&self, principal: PrincipalId, key: &LocationKey) -> Result<bool, BackendError>;
}

/// A claim system: regions of the world belong to owners who trust others.
pub trait ClaimBackend: Send + Sync {
    /// The claim covering `key`. Unclaimed land is a wilderness claim.
    fn claim_at(&self, key: &LocationKey) -> Result<Claim, BackendError>;
}

/// The kind of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    /// Unclaimed land.
    Wilderness,
    Basic,
    Town,
    Admin,
    Subdivision,
}

/// A snapshot of the claim covering a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// The kind of claim.
    pub kind: ClaimKind,

    /// The claim owner, if any.
    pub owner: Option<PrincipalId>,

    /// Principals the owner trusts.
    pub trusted: HashSet<PrincipalId>,
}

impl Claim {
    /// Unclaimed land.
    pub fn wilderness() -> Self {
        Self {
            kind: ClaimKind::Wilderness,
            owner: None,
            trusted: HashSet::new(),
        }
    }

    /// A claim of the given kind owned by `owner`.
    pub fn owned(kind: ClaimKind, owner: PrincipalId) -> Self {
        Self {
            kind,
            owner: Some(owner),
            trusted: HashSet::new(),
        }
    }

    /// Add a trusted principal.
    pub fn with_trusted(mut self, principal: PrincipalId) -> Self {
        self.trusted.insert(principal);
        self
    }

    pub fn is_wilderness(&self) -> bool {
        self.kind == ClaimKind::Wilderness
    }

    /// Whether the principal owns or is trusted in this claim.
    pub fn is_trusted(&self, principal: PrincipalId) -> bool {
        self.owner == Some(principal) || self.trusted.contains(&principal)
    }
}

#[derive(Clone)]
enum BackendHandle {
    Lock(Arc<dyn LockBackend>),
    Claim(Arc<dyn ClaimBackend>),
}

#[derive(Clone)]
struct InstalledBackend {
    handle: BackendHandle,
    enabled: bool,
}

/// The set of backends installed in the host, by name.
#[derive(Clone, Default)]
pub struct BackendDirectory {
    backends: Arc<DashMap<String, InstalledBackend>>,
}

impl BackendDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) a lock backend. Installed backends are enabled.
    pub fn install_lock(&self, name: impl Into<String>, backend: Arc<dyn LockBackend>) {
        self.install(name.into(), BackendHandle::Lock(backend));
    }

    /// Install (or replace) a claim backend. Installed backends are enabled.
    pub fn install_claim(&self, name: impl Into<String>, backend: Arc<dyn ClaimBackend>) {
        self.install(name.into(), BackendHandle::Claim(backend));
    }

    fn install(&self, name: String, handle: BackendHandle) {
        self.backends.insert(name, InstalledBackend { handle, enabled: true });
    }

    /// Mark a backend disabled. Returns `false` if it is not installed.
    pub fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    /// Mark a backend enabled. Returns `false` if it is not installed.
    pub fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.backends.get_mut(name) {
            Some(mut installed) => {
                installed.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Look up an enabled lock backend.
    pub fn lock_backend(&self, name: &str) -> Result<Arc<dyn LockBackend>, BindError> {
        match self.lookup(name)? {
            BackendHandle::Lock(backend) => Ok(backend),
            BackendHandle::Claim(_) => Err(BindError::WrongKind {
                name: name.to_string(),
                expected: "lock backend",
            }),
        }
    }

    /// Look up an enabled claim backend.
    pub fn claim_backend(&self, name: &str) -> Result<Arc<dyn ClaimBackend>, BindError> {
        match self.lookup(name)? {
            BackendHandle::Claim(backend) => Ok(backend),
            BackendHandle::Lock(_) => Err(BindError::WrongKind {
                name: name.to_string(),
                expected: "claim backend",
            }),
        }
    }

    fn lookup(&self, name: &str) -> Result<BackendHandle, BindError> {
        let installed = self
            .backends
            .get(name)
            .ok_or_else(|| BindError::NotInstalled(name.to_string()))?;

        if !installed.enabled {
            return Err(BindError::Disabled(name.to_string()));
        }

        Ok(installed.handle.clone())
    }
}

impl fmt::Debug for BackendDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.backends.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("BackendDirectory").field("backends", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::id::WorldId;

    struct OpenLocks;

    impl LockBackend for OpenLocks {
        fn is_allowed(&self, _: PrincipalId, _: &LocationKey) -> Result<bool, BackendError> {
            Ok(true)
        }
    }

    struct NoClaims;

    impl ClaimBackend for NoClaims {
        fn claim_at(&self, _: &LocationKey) -> Result<Claim, BackendError> {
            Ok(Claim::wilderness())
        }
    }

    #[test]
    fn test_lookup_by_kind() {
        let directory = BackendDirectory::new();
        directory.install_lock("locks", Arc::new(OpenLocks));
        directory.install_claim("claims", Arc::new(NoClaims));

        let key = LocationKey::new(WorldId::new(), 0, 0, 0);
        let locks = directory.lock_backend("locks").unwrap();
        assert!(locks.is_allowed(PrincipalId::new(), &key).unwrap());
        let claims = directory.claim_backend("claims").unwrap();
        assert!(claims.claim_at(&key).unwrap().is_wilderness());

        assert!(matches!(
            directory.claim_backend("locks"),
            Err(BindError::WrongKind { expected: "claim backend", .. })
        ));
        assert!(matches!(
            directory.lock_backend("claims"),
            Err(BindError::WrongKind { expected: "lock backend", .. })
        ));
    }

    #[test]
    fn test_missing_and_disabled() {
        let directory = BackendDirectory::new();
        assert!(matches!(directory.lock_backend("locks"), Err(BindError::NotInstalled(_))));
        assert!(!directory.disable("locks"));

        directory.install_lock("locks", Arc::new(OpenLocks));
        assert!(directory.disable("locks"));
        assert!(matches!(directory.lock_backend("locks"), Err(BindError::Disabled(_))));

        assert!(directory.enable("locks"));
        assert!(directory.lock_backend("locks").is_ok());
    }

    #[test]
    fn test_claim_trust() {
        let owner = PrincipalId::new();
        let friend = PrincipalId::new();
        let stranger = PrincipalId::new();
        let claim = Claim::owned(ClaimKind::Basic, owner).with_trusted(friend);

        assert!(!claim.is_wilderness());
        assert!(claim.is_trusted(owner));
        assert!(claim.is_trusted(friend));
        assert!(!claim.is_trusted(stranger));
    }
}
