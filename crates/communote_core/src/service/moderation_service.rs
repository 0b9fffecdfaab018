//! Moderation queue use-case service.
//!
//! # Responsibility
//! - File reports against notes or comments and drive their resolution.
//! - Give reviewing administrators the one sanctioned view of tombstoned
//!   content.
//!
//! # Invariants
//! - Administrator capability is checked here and nowhere else in the
//!   engine.
//! - A report resolves exactly once; the losing call of a concurrent race
//!   receives `AlreadyResolved`.
//! - A REMOVE outcome either commits together with the target tombstone or
//!   not at all.

use crate::access::policy::ReadScope;
use crate::model::principal::Principal;
use crate::model::report::{
    validate_report_reason, Report, ReportId, ReportOutcome, ReportTarget, ReportedContent,
    TargetKind,
};
use crate::repo::report_repo::{ReportRepository, ResolutionApplied};
use crate::service::error::{EngineError, EngineResult};
use log::info;
use uuid::Uuid;

/// Moderation service facade over the report repository.
pub struct ModerationService<R: ReportRepository> {
    reports: R,
}

impl<R: ReportRepository> ModerationService<R> {
    pub fn new(reports: R) -> Self {
        Self { reports }
    }

    /// Files a report against a visible note or comment.
    ///
    /// Multiple open reports against the same target are permitted and
    /// resolve independently.
    pub fn file_report(
        &self,
        reporter: &Principal,
        kind: TargetKind,
        target_id: Uuid,
        reason: &str,
    ) -> EngineResult<Report> {
        validate_report_reason(reason)?;
        let target = ReportTarget {
            kind,
            id: target_id,
        };

        let author = self
            .reports
            .target_author(target, ReadScope::Active)?
            .ok_or(EngineError::NotFound)?;
        if author == reporter.id {
            return Err(EngineError::InvalidArgument(
                "cannot report one's own content".to_string(),
            ));
        }

        let id = self
            .reports
            .insert_report(Uuid::new_v4(), target, reporter.id, reason.trim())?;
        info!(
            "event=report_filed module=moderation status=ok report_id={id} target_kind={}",
            kind_label(kind)
        );
        self.reports
            .fetch_report(id)?
            .ok_or(EngineError::InconsistentState(
                "created report not found in read-back",
            ))
    }

    /// Lists unresolved reports, newest first. Administrator only.
    pub fn list_open_reports(&self, admin: &Principal) -> EngineResult<Vec<Report>> {
        self.require_admin(admin)?;
        Ok(self.reports.list_unresolved()?)
    }

    /// Fetches reported content for review, tombstoned or not.
    ///
    /// Administrator only; this is the single read path allowed to cross
    /// the soft-delete policy.
    pub fn review_target(
        &self,
        admin: &Principal,
        kind: TargetKind,
        target_id: Uuid,
    ) -> EngineResult<ReportedContent> {
        self.require_admin(admin)?;
        let target = ReportTarget {
            kind,
            id: target_id,
        };
        self.reports
            .fetch_target(target, ReadScope::ModerationReview)?
            .ok_or(EngineError::NotFound)
    }

    /// Resolves one report with the administrator's verdict.
    pub fn resolve_report(
        &self,
        admin: &Principal,
        report_id: ReportId,
        outcome: ReportOutcome,
    ) -> EngineResult<Report> {
        self.require_admin(admin)?;

        match self.reports.resolve_report(report_id, admin.id, outcome)? {
            ResolutionApplied::Applied => {}
            ResolutionApplied::AlreadyResolved => {
                return Err(EngineError::AlreadyResolved(report_id));
            }
        }

        info!(
            "event=report_resolved module=moderation status=ok report_id={report_id} outcome={}",
            outcome_label(outcome)
        );
        self.reports
            .fetch_report(report_id)?
            .ok_or(EngineError::InconsistentState(
                "resolved report not found in read-back",
            ))
    }

    fn require_admin(&self, principal: &Principal) -> EngineResult<()> {
        if principal.is_admin {
            Ok(())
        } else {
            Err(EngineError::PermissionDenied)
        }
    }
}

fn kind_label(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Note => "note",
        TargetKind::Comment => "comment",
    }
}

fn outcome_label(outcome: ReportOutcome) -> &'static str {
    match outcome {
        ReportOutcome::Approve => "approve",
        ReportOutcome::Remove => "remove",
    }
}
