//! Comment domain model.
//!
//! # Invariants
//! - A comment references an existing, non-deleted note at creation time.
//! - `is_deleted` is the source of truth for tombstone state.

use crate::model::note::NoteId;
use crate::model::principal::PrincipalId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a comment.
pub type CommentId = Uuid;

/// Stored comment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub note_id: NoteId,
    /// Comment author.
    pub user_id: PrincipalId,
    pub content: String,
    /// Soft delete tombstone.
    pub is_deleted: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Comment {
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Validates a comment body before persistence.
pub fn validate_comment_body(content: &str) -> Result<(), CommentValidationError> {
    if content.trim().is_empty() {
        return Err(CommentValidationError::EmptyBody);
    }
    Ok(())
}

/// Comment write validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentValidationError {
    EmptyBody,
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "comment body must not be blank"),
        }
    }
}

impl Error for CommentValidationError {}
