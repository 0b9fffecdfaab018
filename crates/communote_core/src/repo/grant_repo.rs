//! Grant repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Own the many-to-many sharing relation between notes and principals.
//!
//! # Invariants
//! - At most one active grant per (note, recipient): duplicates upsert the
//!   capability in place inside one transaction.
//! - Revocation tombstones the row (`is_revoked = 1`), it never deletes it.
//! - Mutations are immediately visible to the next capability lookup; there
//!   is no cache in front of this table.

use crate::model::grant::{Capability, Grant};
use crate::model::note::NoteId;
use crate::model::principal::PrincipalId;
use crate::repo::{
    ensure_connection_ready, flag_from_int, parse_uuid, RepoResult, TableRequirement,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const GRANT_SELECT_SQL: &str = "SELECT
    id,
    note_id,
    shared_by,
    shared_with,
    can_edit,
    is_revoked,
    created_at
FROM note_grants";

/// Repository interface for sharing grants.
pub trait GrantRepository {
    /// Creates or updates the single active grant for (note, recipient).
    fn upsert_grant(
        &self,
        note_id: NoteId,
        shared_by: PrincipalId,
        shared_with: PrincipalId,
        capability: Capability,
    ) -> RepoResult<()>;
    /// Tombstones the active grant. Returns whether a grant was revoked.
    fn revoke_grant(&self, note_id: NoteId, shared_with: PrincipalId) -> RepoResult<bool>;
    /// Lists active grants for one note, oldest first.
    fn list_active_grants(&self, note_id: NoteId) -> RepoResult<Vec<Grant>>;
    /// Looks up the principal's active capability on one note.
    fn active_capability(
        &self,
        note_id: NoteId,
        principal: PrincipalId,
    ) -> RepoResult<Option<Capability>>;
}

/// SQLite-backed grant repository.
pub struct SqliteGrantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGrantRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[TableRequirement {
                table: "note_grants",
                columns: &[
                    "id",
                    "note_id",
                    "shared_by",
                    "shared_with",
                    "can_edit",
                    "is_revoked",
                ],
            }],
        )?;
        Ok(Self { conn })
    }
}

impl GrantRepository for SqliteGrantRepository<'_> {
    fn upsert_grant(
        &self,
        note_id: NoteId,
        shared_by: PrincipalId,
        shared_with: PrincipalId,
        capability: Capability,
    ) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE note_grants
             SET can_edit = ?3
             WHERE note_id = ?1
               AND shared_with = ?2
               AND is_revoked = 0;",
            params![
                note_id.to_string(),
                shared_with.to_string(),
                capability_to_db(capability),
            ],
        )?;

        if changed == 0 {
            tx.execute(
                "INSERT INTO note_grants (id, note_id, shared_by, shared_with, can_edit)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    Uuid::new_v4().to_string(),
                    note_id.to_string(),
                    shared_by.to_string(),
                    shared_with.to_string(),
                    capability_to_db(capability),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn revoke_grant(&self, note_id: NoteId, shared_with: PrincipalId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE note_grants
             SET is_revoked = 1
             WHERE note_id = ?1
               AND shared_with = ?2
               AND is_revoked = 0;",
            params![note_id.to_string(), shared_with.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn list_active_grants(&self, note_id: NoteId) -> RepoResult<Vec<Grant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRANT_SELECT_SQL}
             WHERE note_id = ?1
               AND is_revoked = 0
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        let mut grants = Vec::new();
        while let Some(row) = rows.next()? {
            grants.push(parse_grant_row(row)?);
        }
        Ok(grants)
    }

    fn active_capability(
        &self,
        note_id: NoteId,
        principal: PrincipalId,
    ) -> RepoResult<Option<Capability>> {
        let mut stmt = self.conn.prepare(
            "SELECT can_edit
             FROM note_grants
             WHERE note_id = ?1
               AND shared_with = ?2
               AND is_revoked = 0;",
        )?;
        let mut rows = stmt.query(params![note_id.to_string(), principal.to_string()])?;
        if let Some(row) = rows.next()? {
            let can_edit = flag_from_int(row.get(0)?, "note_grants.can_edit")?;
            return Ok(Some(capability_from_flag(can_edit)));
        }
        Ok(None)
    }
}

fn capability_to_db(capability: Capability) -> i64 {
    match capability {
        Capability::View => 0,
        Capability::Edit => 1,
    }
}

fn capability_from_flag(can_edit: bool) -> Capability {
    if can_edit {
        Capability::Edit
    } else {
        Capability::View
    }
}

fn parse_grant_row(row: &Row<'_>) -> RepoResult<Grant> {
    let id_text: String = row.get("id")?;
    let note_id_text: String = row.get("note_id")?;
    let shared_by_text: String = row.get("shared_by")?;
    let shared_with_text: String = row.get("shared_with")?;
    let can_edit = flag_from_int(row.get("can_edit")?, "note_grants.can_edit")?;
    let is_revoked = flag_from_int(row.get("is_revoked")?, "note_grants.is_revoked")?;

    Ok(Grant {
        id: parse_uuid(&id_text, "note_grants.id")?,
        note_id: parse_uuid(&note_id_text, "note_grants.note_id")?,
        shared_by: parse_uuid(&shared_by_text, "note_grants.shared_by")?,
        shared_with: parse_uuid(&shared_with_text, "note_grants.shared_with")?,
        capability: capability_from_flag(can_edit),
        is_revoked,
        created_at: row.get("created_at")?,
    })
}
