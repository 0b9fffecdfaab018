//! Note use-case service.
//!
//! # Responsibility
//! - Provide the resolver-gated note operations: get/create/update/delete,
//!   the three listings and the owner-scoped search filter.
//!
//! # Invariants
//! - Every read resolves access first; DENY surfaces as `NotFound`.
//! - Updates require `ALLOW(edit)` and use full replacement semantics.
//! - Deletion is owner-only through this path; administrator removal runs
//!   through moderation resolution instead.

use crate::access::policy::ReadScope;
use crate::access::resolver::{resolve, AccessDecision};
use crate::model::grant::Capability;
use crate::model::note::{
    normalize_tags, validate_note_fields, Note, NoteDraft, NoteId, NoteUpdate,
};
use crate::model::principal::Principal;
use crate::repo::grant_repo::GrantRepository;
use crate::repo::note_repo::{NoteRepository, NoteSearchFilter};
use crate::service::error::{EngineError, EngineResult};
use uuid::Uuid;

/// Note service facade over the note and grant repositories.
pub struct NoteService<N: NoteRepository, G: GrantRepository> {
    notes: N,
    grants: G,
}

impl<N: NoteRepository, G: GrantRepository> NoteService<N, G> {
    pub fn new(notes: N, grants: G) -> Self {
        Self { notes, grants }
    }

    /// Fetches one note if the caller may view it.
    pub fn get_note(&self, principal: &Principal, note_id: NoteId) -> EngineResult<Note> {
        let (note, decision) = self.resolve_note(principal, note_id)?;
        if !decision.permits(Capability::View) {
            return Err(EngineError::NotFound);
        }
        note.ok_or(EngineError::NotFound)
    }

    /// Creates a note owned by the caller.
    pub fn create_note(&self, principal: &Principal, draft: NoteDraft) -> EngineResult<Note> {
        validate_note_fields(&draft.title)?;
        let normalized = NoteDraft {
            tags: normalize_tags(&draft.tags),
            ..draft
        };

        let id = self
            .notes
            .insert_note(Uuid::new_v4(), principal.id, &normalized)?;
        self.notes
            .fetch_note(id, ReadScope::Active)?
            .ok_or(EngineError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    /// Replaces all mutable fields of a note the caller may edit.
    pub fn update_note(
        &self,
        principal: &Principal,
        note_id: NoteId,
        update: NoteUpdate,
    ) -> EngineResult<Note> {
        let (_, decision) = self.resolve_note(principal, note_id)?;
        if !decision.permits(Capability::View) {
            return Err(EngineError::NotFound);
        }
        if !decision.permits(Capability::Edit) {
            return Err(EngineError::PermissionDenied);
        }

        validate_note_fields(&update.title)?;
        let normalized = NoteUpdate {
            tags: normalize_tags(&update.tags),
            ..update
        };

        self.notes.update_note_full(note_id, &normalized)?;
        self.notes
            .fetch_note(note_id, ReadScope::Active)?
            .ok_or(EngineError::InconsistentState(
                "updated note not found in read-back",
            ))
    }

    /// Soft-deletes a note. Owner only; edit grants do not extend to delete.
    pub fn delete_note(&self, principal: &Principal, note_id: NoteId) -> EngineResult<()> {
        let (note, decision) = self.resolve_note(principal, note_id)?;
        if !decision.permits(Capability::View) {
            return Err(EngineError::NotFound);
        }
        let note = note.ok_or(EngineError::NotFound)?;
        if note.user_id != principal.id {
            return Err(EngineError::PermissionDenied);
        }

        self.notes.soft_delete_note(note_id)?;
        Ok(())
    }

    /// Lists the caller's own active notes, newest first.
    pub fn list_notes(&self, principal: &Principal) -> EngineResult<Vec<Note>> {
        Ok(self.notes.list_owned(principal.id)?)
    }

    /// Lists active notes shared with the caller through active grants.
    pub fn list_shared_with(&self, principal: &Principal) -> EngineResult<Vec<Note>> {
        Ok(self.notes.list_shared_with(principal.id)?)
    }

    /// Lists active public notes excluding the caller's own.
    pub fn list_public(
        &self,
        principal: &Principal,
        limit: Option<u32>,
    ) -> EngineResult<Vec<Note>> {
        Ok(self.notes.list_public(principal.id, limit)?)
    }

    /// Filters the caller's own active notes. Plain matching, no ranking.
    pub fn search_notes(
        &self,
        principal: &Principal,
        filter: NoteSearchFilter,
    ) -> EngineResult<Vec<Note>> {
        let normalized = NoteSearchFilter {
            tags: normalize_tags(&filter.tags),
            ..filter
        };
        Ok(self.notes.search_notes(principal.id, &normalized)?)
    }

    fn resolve_note(
        &self,
        principal: &Principal,
        note_id: NoteId,
    ) -> EngineResult<(Option<Note>, AccessDecision)> {
        let note = self.notes.fetch_note(note_id, ReadScope::Active)?;
        let grant = match note.as_ref() {
            Some(note) if note.user_id != principal.id => {
                self.grants.active_capability(note_id, principal.id)?
            }
            _ => None,
        };
        let decision = resolve(principal, note.as_ref(), grant, ReadScope::Active);
        Ok((note, decision))
    }
}
