//! Claim-based authority.

use std::sync::Arc;
use warden_core::error::BindError;
use warden_core::id::PrincipalId;
use warden_core::types::{ActionKind, Location};

use super::Authority;
use crate::backend::{BackendDirectory, ClaimBackend};

/// Authority backed by a land claim system.
///
/// Opines on every action: allowed in the wilderness, otherwise only for
/// principals the claim trusts.
pub struct ClaimAuthority {
    name: String,
    directory: BackendDirectory,
    backend: Option<Arc<dyn ClaimBackend>>,
}

impl ClaimAuthority {
    /// Create an authority that binds to the claim backend installed under
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

impl Authority for ClaimAuthority {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<(), BindError> {
        self.backend = Some(self.directory.claim_backend(&self.name)?);
        Ok(())
    }

    fn has_permission(&self, principal: PrincipalId, location: &Location, _action: ActionKind) -> bool {
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

        match backend.claim_at(&key) {
            Ok(claim) => claim.is_wilderness() || claim.is_trusted(principal),
            Err(e) => {
                tracing::warn!(authority = %self.name, %principal, %key, error = %e, "claim lookup failed, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use warden_core::error::BackendError;
    use warden_core::id::WorldId;
    use warden_core::types::LocationKey;
    use crate::backend::{Claim, ClaimKind};

    /// Claims keyed by exact cell; everything else is wilderness.
    struct Claims(HashMap<LocationKey, Claim>);

    impl ClaimBackend for Claims {
        fn claim_at(&self, key: &LocationKey) -> Result<Claim, BackendError> {
            Ok(self.0.get(key).cloned().unwrap_or_else(Claim::wilderness))
        }
    }

    struct Offline;

    impl ClaimBackend for Offline {
        fn claim_at(&self, _: &LocationKey) -> Result<Claim, BackendError> {
            Err(BackendError::LookupFailed("claim storage unreachable".into()))
        }
    }

    fn bind(backend: Arc<dyn ClaimBackend>) -> ClaimAuthority {
        let directory = BackendDirectory::new();
        directory.install_claim("GriefDefender", backend);
        let mut authority = ClaimAuthority::new("GriefDefender", directory);
        authority.load().unwrap();
        authority
    }

    #[test]
    fn test_claim_trust_decides_every_action() {
        let world = WorldId::new();
        let owner = PrincipalId::new();
        let friend = PrincipalId::new();
        let stranger = PrincipalId::new();
        let house = Location::new(world, 10.0, 70.0, 10.0);

        let mut claims = HashMap::new();
        claims.insert(
            house.key().unwrap(),
            Claim::owned(ClaimKind::Basic, owner).with_trusted(friend),
        );
        let authority = bind(Arc::new(Claims(claims)));

        for action in ActionKind::ALL {
            assert!(authority.has_permission(owner, &house, action));
            assert!(authority.has_permission(friend, &house, action));
            assert!(!authority.has_permission(stranger, &house, action));
        }

        let field = Location::new(world, 500.0, 70.0, 500.0);
        assert!(authority.has_permission(stranger, &field, ActionKind::PlaceBlock));
    }

    #[test]
    fn test_backend_failure_denies() {
        let authority = bind(Arc::new(Offline));
        let location = Location::new(WorldId::new(), 0.0, 0.0, 0.0);
        assert!(!authority.has_permission(PrincipalId::new(), &location, ActionKind::Other));
    }

    #[test]
    fn test_load_fails_for_disabled_backend() {
        let directory = BackendDirectory::new();
        directory.install_claim("GriefDefender", Arc::new(Offline));
        directory.disable("GriefDefender");

        let mut authority = ClaimAuthority::new("GriefDefender", directory);
        assert_eq!(authority.load(), Err(BindError::Disabled("GriefDefender".into())));
        assert!(!authority.is_bound());
    }
}
