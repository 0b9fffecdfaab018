//! Access resolution and moderation engine for a shared-notes application.
//! This crate is the single source of truth for business invariants.

pub mod access;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::policy::ReadScope;
pub use access::resolver::{resolve, AccessDecision};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::comment::{Comment, CommentId};
pub use model::grant::{Capability, Grant, GrantId};
pub use model::note::{Note, NoteDraft, NoteId, NoteUpdate};
pub use model::principal::{Principal, PrincipalId, Profile};
pub use model::report::{
    Report, ReportId, ReportOutcome, ReportTarget, ReportedContent, TargetKind,
};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::grant_repo::{GrantRepository, SqliteGrantRepository};
pub use repo::note_repo::{NoteRepository, NoteSearchFilter, SqliteNoteRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::report_repo::{ReportRepository, ResolutionApplied, SqliteReportRepository};
pub use repo::{RepoError, RepoResult};
pub use service::comment_service::CommentService;
pub use service::error::{EngineError, EngineResult};
pub use service::moderation_service::ModerationService;
pub use service::note_service::NoteService;
pub use service::profile_service::ProfileService;
pub use service::share_service::ShareService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
