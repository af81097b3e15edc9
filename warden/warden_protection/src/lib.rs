//! # Warden Protection
//!
//! `warden_protection` answers "may this principal perform this action at
//! this location?" by consulting pluggable protection backends.
//!
//! Key concepts:
//!
//! 1. **Authority**: A pluggable backend binding that can veto or permit an
//!    action. An authority with no opinion on an action permits it.
//!
//! 2. **Registry**: The ordered set of loaded authorities. The first denial
//!    wins; with no authorities everything is allowed.
//!
//! 3. **Verdict Cache**: Per-principal, per-location verdicts with a sliding
//!    expiry window and lazy eviction.
//!
//! 4. **Resolver**: The single entry point, combining cache and registry.

pub mod authority;
pub mod backend;
pub mod cache;
pub mod registry;
pub mod resolver;

// Re-export key types and traits for convenience
pub use authority::{Authority, ClaimAuthority, LockAuthority};
pub use backend::{BackendDirectory, Claim, ClaimBackend, ClaimKind, LockBackend};
pub use cache::{CacheStats, Clock, ManualClock, SystemClock, VerdictCache};
pub use registry::{AuthorityRegistry, LoadReport};
pub use resolver::ProtectionResolver;
