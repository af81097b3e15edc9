//! Lock-based authority.

use std::sync::Arc;
use warden_core::error::BindError;
use warden_core::id::PrincipalId;
use warden_core::types::{ActionKind, Location};

use super::Authority;
use crate::backend::{BackendDirectory, LockBackend};

/// Authority backed by a block lock system.
///
/// Locks only protect blocks, so this authority abstains (allows) for any
/// action that is not block-affecting.
pub struct LockAuthority {
    name: String,
    directory: BackendDirectory,
    backend: Option<Arc<dyn LockBackend>>,
}

impl LockAuthority {
    /// Create an authority that binds to the lock backend installed under
    /// `name`.
    pub fn new(name: impl Into<String>, directory: BackendDirectory) -> Self {
        Self {
            name: name.into(),
            directory,
            backend: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.backend.is_some()
    }
}

impl Authority for LockAuthority {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<(), BindError> {
        self.backend = Some(self.directory.lock_backend(&self.name)?);
        Ok(())
    }

    fn has_permission(&self, principal: PrincipalId, location: &Location, action: ActionKind) -> bool {
        if !action.is_block_action() {
            return true;
        }

        let Some(backend) = &self.backend else {
            tracing::warn!(authority = %self.name, "queried before binding");
            return false;
        };

        let key = match location.key() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(authority = %self.name, error = %e, "malformed location");
                return false;
            }
        };

        backend.is_allowed(principal, &key).unwrap_or_else(|e| {
            tracing::warn!(authority = %self.name, %principal, %key, error = %e, "lock lookup failed, denying");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use warden_core::error::BackendError;
    use warden_core::id::WorldId;
    use warden_core::types::LocationKey;

    /// Blocks locked to a single owner each.
    #[derive(Default)]
    struct Locks {
        owners: Mutex<HashMap<LocationKey, PrincipalId>>,
        broken: bool,
    }

    impl LockBackend for Locks {
        fn is_allowed(&self, principal: PrincipalId, key: &LocationKey) -> Result<bool, BackendError> {
            if self.broken {
                return Err(BackendError::Unavailable("lock database offline".into()));
            }
            Ok(self.owners.lock().get(key).map_or(true, |owner| *owner == principal))
        }
    }

    fn setup(locks: Locks) -> (LockAuthority, Arc<Locks>) {
        let locks = Arc::new(locks);
        let directory = BackendDirectory::new();
        directory.install_lock("BlockLocker", locks.clone());
        let mut authority = LockAuthority::new("BlockLocker", directory);
        authority.load().unwrap();
        (authority, locks)
    }

    #[test]
    fn test_locked_block() {
        let (authority, locks) = setup(Locks::default());
        let world = WorldId::new();
        let owner = PrincipalId::new();
        let stranger = PrincipalId::new();
        let chest = Location::new(world, 4.5, 64.0, 4.5);
        locks.owners.lock().insert(chest.key().unwrap(), owner);

        assert!(authority.has_permission(owner, &chest, ActionKind::ContainerAction));
        assert!(!authority.has_permission(stranger, &chest, ActionKind::ContainerAction));
        assert!(!authority.has_permission(stranger, &chest, ActionKind::BreakBlock));
    }

    #[test]
    fn test_abstains_for_non_block_actions() {
        let (authority, locks) = setup(Locks::default());
        let owner = PrincipalId::new();
        let stranger = PrincipalId::new();
        let chest = Location::new(WorldId::new(), 0.0, 0.0, 0.0);
        locks.owners.lock().insert(chest.key().unwrap(), owner);

        for action in ActionKind::ALL.into_iter().filter(|a| !a.is_block_action()) {
            assert!(authority.has_permission(stranger, &chest, action));
        }
    }

    #[test]
    fn test_backend_failure_denies() {
        let (authority, _) = setup(Locks { broken: true, ..Locks::default() });
        let location = Location::new(WorldId::new(), 0.0, 0.0, 0.0);
        assert!(!authority.has_permission(PrincipalId::new(), &location, ActionKind::BlockAction));
        assert!(authority.has_permission(PrincipalId::new(), &location, ActionKind::Movement));
    }

    #[test]
    fn test_load_fails_without_backend() {
        let mut authority = LockAuthority::new("BlockLocker", BackendDirectory::new());
        assert!(matches!(authority.load(), Err(BindError::NotInstalled(_))));
        assert!(!authority.is_bound());

        let location = Location::new(WorldId::new(), 0.0, 0.0, 0.0);
        assert!(!authority.has_permission(PrincipalId::new(), &location, ActionKind::BlockAction));
    }
}
