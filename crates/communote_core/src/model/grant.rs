//! Sharing grants and access capabilities.
//!
//! # Responsibility
//! - Define the capability ladder used by access resolution.
//! - Define the stored grant row linking a note to a recipient.
//!
//! # Invariants
//! - At most one active grant exists per (note, recipient) pair.
//! - Revocation tombstones the row (`is_revoked`), it never deletes it.

use crate::model::note::NoteId;
use crate::model::principal::PrincipalId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a grant row.
pub type GrantId = Uuid;

/// Level of access a principal holds on a note.
///
/// Ordering is meaningful: `View < Edit`, so a capability satisfies any
/// request at or below its own level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Read-only access.
    View,
    /// Read-write access.
    Edit,
}

impl Capability {
    /// Returns whether this capability covers the requested one.
    pub fn covers(self, requested: Capability) -> bool {
        self >= requested
    }
}

/// Stored sharing grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub note_id: NoteId,
    /// The note's owner at grant time.
    pub shared_by: PrincipalId,
    pub shared_with: PrincipalId,
    pub capability: Capability,
    /// Revocation tombstone; revoked grants stay on record.
    pub is_revoked: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
