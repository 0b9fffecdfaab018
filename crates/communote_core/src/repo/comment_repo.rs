//! Comment repository contract and SQLite implementation.
//!
//! # Invariants
//! - Ordinary reads see `is_deleted = 0` rows only.
//! - Listing order is `created_at ASC, id ASC` (conversation order).

use crate::access::policy::ReadScope;
use crate::model::comment::{Comment, CommentId};
use crate::model::note::NoteId;
use crate::model::principal::PrincipalId;
use crate::repo::{
    bool_to_int, ensure_connection_ready, flag_from_int, parse_uuid, RepoError, RepoResult,
    TableRequirement,
};
use rusqlite::{params, Connection, Row};

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    note_id,
    user_id,
    content,
    is_deleted,
    created_at
FROM comments";

/// Repository interface for comment operations.
pub trait CommentRepository {
    fn insert_comment(
        &self,
        id: CommentId,
        note_id: NoteId,
        author: PrincipalId,
        content: &str,
    ) -> RepoResult<CommentId>;
    fn fetch_comment(&self, id: CommentId, scope: ReadScope) -> RepoResult<Option<Comment>>;
    /// Lists active comments under one note in conversation order.
    fn list_for_note(&self, note_id: NoteId) -> RepoResult<Vec<Comment>>;
    fn soft_delete_comment(&self, id: CommentId) -> RepoResult<()>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[TableRequirement {
                table: "comments",
                columns: &["id", "note_id", "user_id", "content", "is_deleted"],
            }],
        )?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn insert_comment(
        &self,
        id: CommentId,
        note_id: NoteId,
        author: PrincipalId,
        content: &str,
    ) -> RepoResult<CommentId> {
        self.conn.execute(
            "INSERT INTO comments (id, note_id, user_id, content)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                note_id.to_string(),
                author.to_string(),
                content,
            ],
        )?;
        Ok(id)
    }

    fn fetch_comment(&self, id: CommentId, scope: ReadScope) -> RepoResult<Option<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;
        let mut rows = stmt.query(params![
            id.to_string(),
            bool_to_int(scope.includes_deleted())
        ])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_for_note(&self, note_id: NoteId) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE note_id = ?1
               AND is_deleted = 0
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn soft_delete_comment(&self, id: CommentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE comments
             SET is_deleted = 1
             WHERE id = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id_text: String = row.get("id")?;
    let note_id_text: String = row.get("note_id")?;
    let user_id_text: String = row.get("user_id")?;
    let is_deleted = flag_from_int(row.get("is_deleted")?, "comments.is_deleted")?;

    Ok(Comment {
        id: parse_uuid(&id_text, "comments.id")?,
        note_id: parse_uuid(&note_id_text, "comments.note_id")?,
        user_id: parse_uuid(&user_id_text, "comments.user_id")?,
        content: row.get("content")?,
        is_deleted,
        created_at: row.get("created_at")?,
    })
}
