//! Moderation report domain model.
//!
//! # Responsibility
//! - Define the report row and its resolution state machine vocabulary.
//!
//! # Invariants
//! - `resolved` is monotonic: it moves false -> true exactly once.
//! - `resolved_by` / `resolved_at` are set if and only if `resolved` is true.

use crate::model::principal::PrincipalId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a report.
pub type ReportId = Uuid;

/// Kind of content a report points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Note,
    Comment,
}

/// Reference to the reported content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTarget {
    pub kind: TargetKind,
    pub id: Uuid,
}

/// Administrator verdict on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    /// Content stays untouched; only the report is closed.
    Approve,
    /// Content is soft-deleted together with closing the report.
    Remove,
}

/// Stored moderation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub target: ReportTarget,
    pub reported_by: PrincipalId,
    pub reason: String,
    pub resolved: bool,
    pub resolved_by: Option<PrincipalId>,
    /// Unix epoch milliseconds; set together with `resolved_by`.
    pub resolved_at: Option<i64>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Report {
    pub fn is_open(&self) -> bool {
        !self.resolved
    }
}

/// Snapshot of reported content shown to a reviewing administrator.
///
/// Unlike every other read path this view may carry already-deleted content,
/// so a REMOVE outcome stays auditable after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedContent {
    pub target: ReportTarget,
    pub author: PrincipalId,
    /// Present for notes, absent for comments.
    pub title: Option<String>,
    pub body: String,
    pub is_deleted: bool,
}

/// Validates a report reason before persistence.
pub fn validate_report_reason(reason: &str) -> Result<(), ReportValidationError> {
    if reason.trim().is_empty() {
        return Err(ReportValidationError::EmptyReason);
    }
    Ok(())
}

/// Report write validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportValidationError {
    EmptyReason,
}

impl Display for ReportValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyReason => write!(f, "report reason must not be blank"),
        }
    }
}

impl Error for ReportValidationError {}
