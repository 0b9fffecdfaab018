//! Shared error taxonomy for engine operations.
//!
//! # Invariants
//! - `NotFound` intentionally covers both "absent" and "not yours to see" on
//!   read paths, for every entity kind.
//! - Transport failures stay wrapped in `Repo`; UI layers translate the
//!   structured kinds, never a generic failure.

use crate::model::comment::CommentValidationError;
use crate::model::note::NoteValidationError;
use crate::model::principal::ProfileValidationError;
use crate::model::report::{ReportId, ReportValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error taxonomy exposed to UI collaborators.
#[derive(Debug)]
pub enum EngineError {
    /// Entity absent or invisible to the caller.
    NotFound,
    /// Caller lacks the required capability on a visible entity.
    PermissionDenied,
    /// Malformed or self-referential request.
    InvalidArgument(String),
    /// Second resolution attempt on an already-resolved report.
    AlreadyResolved(ReportId),
    /// Duplicate unique constraint, e.g. username collision.
    Conflict(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal mismatch between a committed write and its read-back.
    InconsistentState(&'static str),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::AlreadyResolved(id) => write!(f, "report already resolved: {id}"),
            Self::Conflict(what) => write!(f, "conflict on {what}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(_) => Self::NotFound,
            RepoError::UniqueViolation(column) => Self::Conflict(column.to_string()),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for EngineError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<CommentValidationError> for EngineError {
    fn from(value: CommentValidationError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<ReportValidationError> for EngineError {
    fn from(value: ReportValidationError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<ProfileValidationError> for EngineError {
    fn from(value: ProfileValidationError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}
