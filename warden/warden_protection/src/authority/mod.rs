//! Authorities.
//!
//! An [`Authority`] binds to one external protection backend and answers
//! yes or no for a principal, location and action. This module defines the
//! contract and provides the lock-based and claim-based modules.

mod claim;
mod lock;

pub use claim::ClaimAuthority;
pub use lock::LockAuthority;

use warden_core::error::BindError;
use warden_core::id::PrincipalId;
use warden_core::types::{ActionKind, Location};

/// A pluggable protection backend binding.
///
/// Contract:
///
/// * `load` is called once, before any query. If it fails the authority is
///   dropped and never queried.
/// * `has_permission` never fails. Backend errors are converted into a
///   conservative `false` by the implementation.
/// * An authority with no opinion on an action returns `true`. Returning
///   `false` is a veto.
pub trait Authority: Send + Sync {
    /// Stable label used in diagnostics.
    fn name(&self) -> &str;

    /// Bind to the external backend.
    fn load(&mut self) -> Result<(), BindError>;

    /// Whether the principal may perform the action at the location.
    fn has_permission(&self, principal: PrincipalId, location: &Location, action: ActionKind) -> bool;
}

impl std::fmt::Debug for dyn Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authority").field("name", &self.name()).finish()
    }
}
