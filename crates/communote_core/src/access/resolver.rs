//! Ordered visibility resolver for (principal, note) pairs.
//!
//! # Responsibility
//! - Collapse the owner/grant/public fallback paths into one tagged decision.
//!
//! # Invariants
//! - Precedence: missing-or-tombstoned, owner, grant, public, deny.
//! - Owners always resolve to `Allow(Edit)` regardless of grants or the
//!   public flag.
//! - Public notes resolve to `Allow(View)` for non-owners, never `Edit`.
//! - A denied read is indistinguishable from a missing note upstream.

use crate::access::policy::ReadScope;
use crate::model::grant::Capability;
use crate::model::note::Note;
use crate::model::principal::Principal;

/// Tagged result of access resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(Capability),
    Deny,
}

impl AccessDecision {
    /// Returns whether the decision grants at least the requested capability.
    pub fn permits(self, requested: Capability) -> bool {
        match self {
            Self::Allow(capability) => capability.covers(requested),
            Self::Deny => false,
        }
    }

    pub fn is_deny(self) -> bool {
        self == Self::Deny
    }
}

/// Resolves access for one principal against one (possibly absent) note.
///
/// The caller supplies the note row as fetched from storage and the
/// principal's active grant capability on it, if any. Keeping this a pure
/// function keeps the precedence rule testable without persistence.
pub fn resolve(
    principal: &Principal,
    note: Option<&Note>,
    grant: Option<Capability>,
    scope: ReadScope,
) -> AccessDecision {
    let Some(note) = note else {
        return AccessDecision::Deny;
    };

    if note.is_deleted && !scope.includes_deleted() {
        return AccessDecision::Deny;
    }

    if note.user_id == principal.id {
        return AccessDecision::Allow(Capability::Edit);
    }

    if let Some(capability) = grant {
        return AccessDecision::Allow(capability);
    }

    if note.is_public {
        return AccessDecision::Allow(Capability::View);
    }

    AccessDecision::Deny
}
