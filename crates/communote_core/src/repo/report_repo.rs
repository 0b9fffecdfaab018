//! Moderation report repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist reports and drive the unresolved -> resolved transition.
//! - Fetch report targets for authorship checks and administrator review.
//!
//! # Invariants
//! - `resolve_report` is a compare-and-swap on the resolved flag; the losing
//!   call of a race observes no state change.
//! - A REMOVE outcome tombstones the target inside the same transaction; if
//!   the target mutation fails the resolution rolls back entirely.
//! - Target review reads may see tombstoned rows (moderation scope).

use crate::access::policy::ReadScope;
use crate::model::principal::PrincipalId;
use crate::model::report::{
    Report, ReportId, ReportOutcome, ReportTarget, ReportedContent, TargetKind,
};
use crate::repo::{
    bool_to_int, ensure_connection_ready, flag_from_int, parse_uuid, RepoError, RepoResult,
    TableRequirement,
};
use rusqlite::{params, Connection, Row, Transaction};

const REPORT_SELECT_SQL: &str = "SELECT
    id,
    content_type,
    content_id,
    reported_by,
    reason,
    resolved,
    resolved_by,
    resolved_at,
    created_at
FROM flagged_content";

/// Result of one resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionApplied {
    /// This call won the transition and any companion effect was committed.
    Applied,
    /// The report was already resolved; nothing changed.
    AlreadyResolved,
}

/// Repository interface for moderation reports.
pub trait ReportRepository {
    fn insert_report(
        &self,
        id: ReportId,
        target: ReportTarget,
        reported_by: PrincipalId,
        reason: &str,
    ) -> RepoResult<ReportId>;
    fn fetch_report(&self, id: ReportId) -> RepoResult<Option<Report>>;
    /// Lists unresolved reports, newest first.
    fn list_unresolved(&self) -> RepoResult<Vec<Report>>;
    /// Returns the target's author if the target exists in the given scope.
    fn target_author(
        &self,
        target: ReportTarget,
        scope: ReadScope,
    ) -> RepoResult<Option<PrincipalId>>;
    /// Fetches the reported content for administrator review.
    fn fetch_target(
        &self,
        target: ReportTarget,
        scope: ReadScope,
    ) -> RepoResult<Option<ReportedContent>>;
    /// Marks the report resolved and, on REMOVE, tombstones the target in
    /// the same transaction.
    fn resolve_report(
        &self,
        id: ReportId,
        resolved_by: PrincipalId,
        outcome: ReportOutcome,
    ) -> RepoResult<ResolutionApplied>;
}

/// SQLite-backed report repository.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                TableRequirement {
                    table: "flagged_content",
                    columns: &[
                        "id",
                        "content_type",
                        "content_id",
                        "reported_by",
                        "reason",
                        "resolved",
                        "resolved_by",
                        "resolved_at",
                    ],
                },
                TableRequirement {
                    table: "notes",
                    columns: &["id", "user_id", "is_deleted"],
                },
                TableRequirement {
                    table: "comments",
                    columns: &["id", "user_id", "is_deleted"],
                },
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn insert_report(
        &self,
        id: ReportId,
        target: ReportTarget,
        reported_by: PrincipalId,
        reason: &str,
    ) -> RepoResult<ReportId> {
        self.conn.execute(
            "INSERT INTO flagged_content (id, content_type, content_id, reported_by, reason)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                target_kind_to_db(target.kind),
                target.id.to_string(),
                reported_by.to_string(),
                reason,
            ],
        )?;
        Ok(id)
    }

    fn fetch_report(&self, id: ReportId) -> RepoResult<Option<Report>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REPORT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_report_row(row)?));
        }
        Ok(None)
    }

    fn list_unresolved(&self) -> RepoResult<Vec<Report>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REPORT_SELECT_SQL}
             WHERE resolved = 0
             ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            reports.push(parse_report_row(row)?);
        }
        Ok(reports)
    }

    fn target_author(
        &self,
        target: ReportTarget,
        scope: ReadScope,
    ) -> RepoResult<Option<PrincipalId>> {
        let sql = match target.kind {
            TargetKind::Note => {
                "SELECT user_id FROM notes WHERE id = ?1 AND (?2 = 1 OR is_deleted = 0);"
            }
            TargetKind::Comment => {
                "SELECT user_id FROM comments WHERE id = ?1 AND (?2 = 1 OR is_deleted = 0);"
            }
        };
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![
            target.id.to_string(),
            bool_to_int(scope.includes_deleted())
        ])?;
        if let Some(row) = rows.next()? {
            let author_text: String = row.get(0)?;
            return Ok(Some(parse_uuid(&author_text, "target.user_id")?));
        }
        Ok(None)
    }

    fn fetch_target(
        &self,
        target: ReportTarget,
        scope: ReadScope,
    ) -> RepoResult<Option<ReportedContent>> {
        let sql = match target.kind {
            TargetKind::Note => {
                "SELECT user_id, title, content, is_deleted
                 FROM notes
                 WHERE id = ?1 AND (?2 = 1 OR is_deleted = 0);"
            }
            TargetKind::Comment => {
                "SELECT user_id, NULL AS title, content, is_deleted
                 FROM comments
                 WHERE id = ?1 AND (?2 = 1 OR is_deleted = 0);"
            }
        };
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![
            target.id.to_string(),
            bool_to_int(scope.includes_deleted())
        ])?;
        if let Some(row) = rows.next()? {
            let author_text: String = row.get(0)?;
            let is_deleted = flag_from_int(row.get(3)?, "target.is_deleted")?;
            return Ok(Some(ReportedContent {
                target,
                author: parse_uuid(&author_text, "target.user_id")?,
                title: row.get(1)?,
                body: row.get(2)?,
                is_deleted,
            }));
        }
        Ok(None)
    }

    fn resolve_report(
        &self,
        id: ReportId,
        resolved_by: PrincipalId,
        outcome: ReportOutcome,
    ) -> RepoResult<ResolutionApplied> {
        let tx = self.conn.unchecked_transaction()?;

        let target = fetch_target_ref(&tx, id)?.ok_or(RepoError::NotFound(id))?;

        // CAS on the resolved flag: exactly one concurrent resolution wins.
        let changed = tx.execute(
            "UPDATE flagged_content
             SET
                resolved = 1,
                resolved_by = ?2,
                resolved_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND resolved = 0;",
            params![id.to_string(), resolved_by.to_string()],
        )?;

        if changed == 0 {
            return Ok(ResolutionApplied::AlreadyResolved);
        }

        if outcome == ReportOutcome::Remove {
            let sql = match target.kind {
                TargetKind::Note => "UPDATE notes SET is_deleted = 1 WHERE id = ?1;",
                TargetKind::Comment => "UPDATE comments SET is_deleted = 1 WHERE id = ?1;",
            };
            let removed = tx.execute(sql, [target.id.to_string()])?;
            if removed == 0 {
                // Companion mutation failed: drop the transaction so the
                // report stays unresolved.
                return Err(RepoError::NotFound(target.id));
            }
        }

        tx.commit()?;
        Ok(ResolutionApplied::Applied)
    }
}

fn fetch_target_ref(tx: &Transaction<'_>, id: ReportId) -> RepoResult<Option<ReportTarget>> {
    let mut stmt = tx.prepare(
        "SELECT content_type, content_id
         FROM flagged_content
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        let kind_text: String = row.get(0)?;
        let id_text: String = row.get(1)?;
        let kind = parse_target_kind(&kind_text)?;
        return Ok(Some(ReportTarget {
            kind,
            id: parse_uuid(&id_text, "flagged_content.content_id")?,
        }));
    }
    Ok(None)
}

fn parse_report_row(row: &Row<'_>) -> RepoResult<Report> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("content_type")?;
    let content_id_text: String = row.get("content_id")?;
    let reported_by_text: String = row.get("reported_by")?;
    let resolved = flag_from_int(row.get("resolved")?, "flagged_content.resolved")?;
    let resolved_by = match row.get::<_, Option<String>>("resolved_by")? {
        Some(value) => Some(parse_uuid(&value, "flagged_content.resolved_by")?),
        None => None,
    };
    let resolved_at: Option<i64> = row.get("resolved_at")?;

    // resolved_by/resolved_at travel with the resolved flag; a mismatch is
    // corrupt state, not a decodable row.
    if resolved != resolved_by.is_some() || resolved != resolved_at.is_some() {
        return Err(RepoError::InvalidData(format!(
            "report {id_text} has inconsistent resolution fields"
        )));
    }

    Ok(Report {
        id: parse_uuid(&id_text, "flagged_content.id")?,
        target: ReportTarget {
            kind: parse_target_kind(&kind_text)?,
            id: parse_uuid(&content_id_text, "flagged_content.content_id")?,
        },
        reported_by: parse_uuid(&reported_by_text, "flagged_content.reported_by")?,
        reason: row.get("reason")?,
        resolved,
        resolved_by,
        resolved_at,
        created_at: row.get("created_at")?,
    })
}

fn target_kind_to_db(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Note => "note",
        TargetKind::Comment => "comment",
    }
}

fn parse_target_kind(value: &str) -> RepoResult<TargetKind> {
    match value {
        "note" => Ok(TargetKind::Note),
        "comment" => Ok(TargetKind::Comment),
        other => Err(RepoError::InvalidData(format!(
            "invalid content_type `{other}` in flagged_content"
        ))),
    }
}
