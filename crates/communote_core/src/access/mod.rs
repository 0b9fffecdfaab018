//! Access resolution and the soft-delete read policy.
//!
//! # Responsibility
//! - Decide, for any (principal, note) pair, whether access is permitted and
//!   at which capability.
//! - Define the single read-scope predicate every read path threads through.
//!
//! # Invariants
//! - Resolution precedence is fixed: existence/tombstone, owner, grant,
//!   public flag. First match wins.
//! - Administrator status is never consulted here; the moderation queue owns
//!   the only override path.

pub mod policy;
pub mod resolver;

pub use policy::ReadScope;
pub use resolver::{resolve, AccessDecision};
