//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide note persistence APIs including tag-link replacement.
//! - Keep every read constrained by the caller's [`ReadScope`].
//!
//! # Invariants
//! - Ordinary reads see `is_deleted = 0` rows only.
//! - `soft_delete_note` tombstones the note and revokes its active grants in
//!   one transaction.
//! - Tag links are replaced wholesale inside the owning transaction.
//! - List/search ordering is `updated_at DESC, id ASC`.

use crate::access::policy::ReadScope;
use crate::model::note::{Note, NoteDraft, NoteId, NoteUpdate};
use crate::model::principal::PrincipalId;
use crate::repo::{
    bool_to_int, ensure_connection_ready, flag_from_int, parse_uuid, RepoError, RepoResult,
    TableRequirement,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    user_id,
    is_public,
    is_deleted,
    category,
    created_at,
    updated_at
FROM notes";

const PUBLIC_LIST_DEFAULT_LIMIT: u32 = 20;

/// Field filter for owner-scoped note search. No ranking, plain matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteSearchFilter {
    /// Substring matched against title or content, case-insensitive.
    pub text: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Every listed tag must be present on the note.
    pub tags: Vec<String>,
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts one note row plus its tag links. Tags must be pre-normalized.
    fn insert_note(&self, id: NoteId, owner: PrincipalId, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Fetches one note honoring the read scope.
    fn fetch_note(&self, id: NoteId, scope: ReadScope) -> RepoResult<Option<Note>>;
    /// Replaces all mutable note fields and the full tag set.
    fn update_note_full(&self, id: NoteId, update: &NoteUpdate) -> RepoResult<()>;
    /// Tombstones the note and revokes its active grants atomically.
    fn soft_delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Lists the owner's active notes, newest first.
    fn list_owned(&self, owner: PrincipalId) -> RepoResult<Vec<Note>>;
    /// Lists active notes reachable by the principal through active grants.
    fn list_shared_with(&self, principal: PrincipalId) -> RepoResult<Vec<Note>>;
    /// Lists active public notes excluding the principal's own.
    fn list_public(&self, excluding: PrincipalId, limit: Option<u32>) -> RepoResult<Vec<Note>>;
    /// Filters the owner's active notes by text/category/tags.
    fn search_notes(&self, owner: PrincipalId, filter: &NoteSearchFilter) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                TableRequirement {
                    table: "notes",
                    columns: &[
                        "id",
                        "title",
                        "content",
                        "user_id",
                        "is_public",
                        "is_deleted",
                        "category",
                        "updated_at",
                    ],
                },
                TableRequirement {
                    table: "tags",
                    columns: &["id", "name"],
                },
                TableRequirement {
                    table: "note_tags",
                    columns: &["note_id", "tag_id"],
                },
            ],
        )?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, id: NoteId, owner: PrincipalId, draft: &NoteDraft) -> RepoResult<NoteId> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notes (id, title, content, user_id, is_public, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                draft.title.as_str(),
                draft.content.as_str(),
                owner.to_string(),
                bool_to_int(draft.is_public),
                draft.category.as_deref(),
            ],
        )?;
        replace_tag_links(&tx, id, &draft.tags)?;
        tx.commit()?;
        Ok(id)
    }

    fn fetch_note(&self, id: NoteId, scope: ReadScope) -> RepoResult<Option<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![
            id.to_string(),
            bool_to_int(scope.includes_deleted())
        ])?;
        if let Some(row) = rows.next()? {
            let note = parse_note_row(self.conn, row)?;
            return Ok(Some(note));
        }

        Ok(None)
    }

    fn update_note_full(&self, id: NoteId, update: &NoteUpdate) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                is_public = ?4,
                category = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                update.title.as_str(),
                update.content.as_str(),
                bool_to_int(update.is_public),
                update.category.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        replace_tag_links(&tx, id, &update.tags)?;
        tx.commit()?;
        Ok(())
    }

    fn soft_delete_note(&self, id: NoteId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        // Grants are owned by the note and go down with it.
        tx.execute(
            "UPDATE note_grants
             SET is_revoked = 1
             WHERE note_id = ?1
               AND is_revoked = 0;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_owned(&self, owner: PrincipalId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE user_id = ?1
               AND is_deleted = 0
             ORDER BY updated_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner.to_string()])?;
        collect_notes(self.conn, &mut rows)
    }

    fn list_shared_with(&self, principal: PrincipalId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                notes.id,
                notes.title,
                notes.content,
                notes.user_id,
                notes.is_public,
                notes.is_deleted,
                notes.category,
                notes.created_at,
                notes.updated_at
             FROM note_grants
             INNER JOIN notes ON notes.id = note_grants.note_id
             WHERE note_grants.shared_with = ?1
               AND note_grants.is_revoked = 0
               AND notes.is_deleted = 0
             ORDER BY notes.updated_at DESC, notes.id ASC;",
        )?;
        let mut rows = stmt.query([principal.to_string()])?;
        collect_notes(self.conn, &mut rows)
    }

    fn list_public(&self, excluding: PrincipalId, limit: Option<u32>) -> RepoResult<Vec<Note>> {
        let applied_limit = limit.unwrap_or(PUBLIC_LIST_DEFAULT_LIMIT);
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE is_public = 1
               AND is_deleted = 0
               AND user_id <> ?1
             ORDER BY updated_at DESC, id ASC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![excluding.to_string(), i64::from(applied_limit)])?;
        collect_notes(self.conn, &mut rows)
    }

    fn search_notes(&self, owner: PrincipalId, filter: &NoteSearchFilter) -> RepoResult<Vec<Note>> {
        let mut sql = format!(
            "{NOTE_SELECT_SQL}
             WHERE user_id = ?
               AND is_deleted = 0"
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(owner.to_string())];

        if let Some(text) = filter.text.as_deref() {
            let pattern = format!("%{}%", escape_like(text));
            sql.push_str(" AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')");
            bind_values.push(Value::Text(pattern.clone()));
            bind_values.push(Value::Text(pattern));
        }

        if let Some(category) = filter.category.as_deref() {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.to_string()));
        }

        for tag in &filter.tags {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    INNER JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_id = notes.id
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        collect_notes(self.conn, &mut rows)
    }
}

/// Escapes `%`, `_` and the escape char itself for LIKE patterns.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn collect_notes(conn: &Connection, rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Note>> {
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(parse_note_row(conn, row)?);
    }
    Ok(notes)
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "notes.id")?;
    let user_id_text: String = row.get("user_id")?;
    let user_id = parse_uuid(&user_id_text, "notes.user_id")?;
    let is_public = flag_from_int(row.get("is_public")?, "notes.is_public")?;
    let is_deleted = flag_from_int(row.get("is_deleted")?, "notes.is_deleted")?;
    let tags = load_tags_for_note(conn, &id_text)?;

    Ok(Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        user_id,
        is_public,
        is_deleted,
        category: row.get("category")?,
        tags,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_tags_for_note(conn: &Connection, note_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_id = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([note_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

fn replace_tag_links(tx: &Transaction<'_>, note_id: NoteId, tags: &[String]) -> RepoResult<()> {
    let note_id_text = note_id.to_string();
    tx.execute(
        "DELETE FROM note_tags WHERE note_id = ?1;",
        [note_id_text.as_str()],
    )?;

    for tag in tags {
        tx.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
            [tag.as_str()],
        )?;
        tx.execute(
            "INSERT INTO note_tags (note_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![note_id_text.as_str(), tag.as_str()],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
