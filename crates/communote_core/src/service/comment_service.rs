//! Comment use-case service.
//!
//! # Invariants
//! - Commenting and listing require at least view access to the parent
//!   note; DENY surfaces as `NotFound` (same ambiguity policy as notes).
//! - Deletion through this path is author-only; administrators remove
//!   comments via moderation resolution.

use crate::access::policy::ReadScope;
use crate::access::resolver::resolve;
use crate::model::comment::{validate_comment_body, Comment, CommentId};
use crate::model::grant::Capability;
use crate::model::note::NoteId;
use crate::model::principal::Principal;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::grant_repo::GrantRepository;
use crate::repo::note_repo::NoteRepository;
use crate::service::error::{EngineError, EngineResult};
use uuid::Uuid;

/// Comment service facade over note, grant and comment repositories.
pub struct CommentService<N: NoteRepository, G: GrantRepository, C: CommentRepository> {
    notes: N,
    grants: G,
    comments: C,
}

impl<N: NoteRepository, G: GrantRepository, C: CommentRepository> CommentService<N, G, C> {
    pub fn new(notes: N, grants: G, comments: C) -> Self {
        Self {
            notes,
            grants,
            comments,
        }
    }

    /// Adds a comment under a note the caller may view.
    pub fn add_comment(
        &self,
        principal: &Principal,
        note_id: NoteId,
        content: &str,
    ) -> EngineResult<Comment> {
        self.require_view(principal, note_id)?;
        validate_comment_body(content)?;

        let id = self
            .comments
            .insert_comment(Uuid::new_v4(), note_id, principal.id, content.trim())?;
        self.comments
            .fetch_comment(id, ReadScope::Active)?
            .ok_or(EngineError::InconsistentState(
                "created comment not found in read-back",
            ))
    }

    /// Lists active comments under a note the caller may view.
    pub fn list_comments(
        &self,
        principal: &Principal,
        note_id: NoteId,
    ) -> EngineResult<Vec<Comment>> {
        self.require_view(principal, note_id)?;
        Ok(self.comments.list_for_note(note_id)?)
    }

    /// Soft-deletes the caller's own comment.
    pub fn delete_comment(
        &self,
        principal: &Principal,
        comment_id: CommentId,
    ) -> EngineResult<()> {
        let comment = self
            .comments
            .fetch_comment(comment_id, ReadScope::Active)?
            .ok_or(EngineError::NotFound)?;
        if comment.user_id != principal.id {
            return Err(EngineError::PermissionDenied);
        }

        self.comments.soft_delete_comment(comment_id)?;
        Ok(())
    }

    fn require_view(&self, principal: &Principal, note_id: NoteId) -> EngineResult<()> {
        let note = self.notes.fetch_note(note_id, ReadScope::Active)?;
        let grant = match note.as_ref() {
            Some(note) if note.user_id != principal.id => {
                self.grants.active_capability(note_id, principal.id)?
            }
            _ => None,
        };
        let decision = resolve(principal, note.as_ref(), grant, ReadScope::Active);
        if !decision.permits(Capability::View) {
            return Err(EngineError::NotFound);
        }
        Ok(())
    }
}
