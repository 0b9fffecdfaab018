//! Soft-delete read scope.
//!
//! Every read path takes a [`ReadScope`] instead of re-implementing its own
//! `is_deleted` filter, so a new read path cannot forget the tombstone rule.

/// Which rows a read path is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    /// Ordinary flows: tombstoned rows are invisible.
    Active,
    /// Administrator review of a report target. The one sanctioned hole in
    /// the soft-delete policy: a reviewer must still see content after a
    /// REMOVE outcome tombstoned it.
    ModerationReview,
}

impl ReadScope {
    pub fn includes_deleted(self) -> bool {
        matches!(self, Self::ModerationReview)
    }
}
