//! Sharing use-case service (the grant store's public face).
//!
//! # Invariants
//! - Only the note's owner may create, revoke or list grants.
//! - Sharing with oneself is rejected before any persistence touch.
//! - Revoking a missing grant is a no-op, not an error.

use crate::access::policy::ReadScope;
use crate::model::grant::{Capability, Grant};
use crate::model::note::{Note, NoteId};
use crate::model::principal::{Principal, PrincipalId};
use crate::repo::grant_repo::GrantRepository;
use crate::repo::note_repo::NoteRepository;
use crate::service::error::{EngineError, EngineResult};

/// Share service facade over the note and grant repositories.
pub struct ShareService<N: NoteRepository, G: GrantRepository> {
    notes: N,
    grants: G,
}

impl<N: NoteRepository, G: GrantRepository> ShareService<N, G> {
    pub fn new(notes: N, grants: G) -> Self {
        Self { notes, grants }
    }

    /// Grants `recipient` the given capability on the note.
    ///
    /// A duplicate share replaces the capability of the existing active
    /// grant in place; it never creates a second row.
    pub fn share_note(
        &self,
        owner: &Principal,
        note_id: NoteId,
        recipient: PrincipalId,
        capability: Capability,
    ) -> EngineResult<()> {
        let note = self.owned_note(owner, note_id)?;
        if recipient == owner.id {
            return Err(EngineError::InvalidArgument(
                "cannot share a note with its owner".to_string(),
            ));
        }

        self.grants
            .upsert_grant(note.id, owner.id, recipient, capability)?;
        Ok(())
    }

    /// Revokes the recipient's active grant. Missing grants are ignored.
    pub fn unshare_note(
        &self,
        owner: &Principal,
        note_id: NoteId,
        recipient: PrincipalId,
    ) -> EngineResult<()> {
        let note = self.owned_note(owner, note_id)?;
        self.grants.revoke_grant(note.id, recipient)?;
        Ok(())
    }

    /// Lists active grants on the note. Owner only.
    pub fn list_grants(&self, owner: &Principal, note_id: NoteId) -> EngineResult<Vec<Grant>> {
        let note = self.owned_note(owner, note_id)?;
        Ok(self.grants.list_active_grants(note.id)?)
    }

    fn owned_note(&self, owner: &Principal, note_id: NoteId) -> EngineResult<Note> {
        let note = self
            .notes
            .fetch_note(note_id, ReadScope::Active)?
            .ok_or(EngineError::NotFound)?;
        if note.user_id != owner.id {
            return Err(EngineError::PermissionDenied);
        }
        Ok(note)
    }
}
