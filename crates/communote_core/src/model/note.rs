//! Note domain model.
//!
//! # Responsibility
//! - Define the note record and its write-time validation.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `user_id` (the owner) is set at creation and immutable thereafter.
//! - `is_deleted` is the source of truth for tombstone state.
//! - Tags are normalized to lowercase and deduplicated before persistence.

use crate::model::principal::PrincipalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Owner principal; never reassigned.
    pub user_id: PrincipalId,
    /// Public notes are world-readable but never world-editable.
    pub is_public: bool,
    /// Soft delete tombstone.
    pub is_deleted: bool,
    pub category: Option<String>,
    /// Normalized lowercase tags, sorted and deduplicated.
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Write payload for note creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Write payload for note updates.
///
/// Updates use full replacement semantics: every field below overwrites the
/// stored value, including the tag set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteUpdate {
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Validates note write payload fields shared by create and update.
pub fn validate_note_fields(title: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    Ok(())
}

/// Normalizes one tag value; blank tags are dropped.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

/// Note write validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be blank"),
        }
    }
}

impl Error for NoteValidationError {}
