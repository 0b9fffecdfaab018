//! Profile repository contract and SQLite implementation.
//!
//! # Invariants
//! - Usernames are unique; a collision surfaces as `UniqueViolation` rather
//!   than a raw SQLite constraint error.

use crate::model::principal::{PrincipalId, Profile};
use crate::repo::note_repo::escape_like;
use crate::repo::{
    bool_to_int, ensure_connection_ready, flag_from_int, parse_uuid, RepoError, RepoResult,
    TableRequirement,
};
use rusqlite::{params, Connection, Row};

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    username,
    full_name,
    is_admin,
    created_at,
    updated_at
FROM profiles";

/// Repository interface for profile rows.
pub trait ProfileRepository {
    fn insert_profile(
        &self,
        id: PrincipalId,
        username: &str,
        full_name: Option<&str>,
        is_admin: bool,
    ) -> RepoResult<()>;
    fn fetch_profile(&self, id: PrincipalId) -> RepoResult<Option<Profile>>;
    fn fetch_by_username(&self, username: &str) -> RepoResult<Option<Profile>>;
    /// Username substring search for the share dialog, excluding the caller.
    fn search_by_username(
        &self,
        term: &str,
        exclude: PrincipalId,
        limit: u32,
    ) -> RepoResult<Vec<Profile>>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[TableRequirement {
                table: "profiles",
                columns: &["id", "username", "full_name", "is_admin"],
            }],
        )?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn insert_profile(
        &self,
        id: PrincipalId,
        username: &str,
        full_name: Option<&str>,
        is_admin: bool,
    ) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO profiles (id, username, full_name, is_admin)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                username,
                full_name,
                bool_to_int(is_admin)
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(RepoError::UniqueViolation(
                "profiles.username",
            )),
            Err(err) => Err(err.into()),
        }
    }

    fn fetch_profile(&self, id: PrincipalId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn fetch_by_username(&self, username: &str) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query([username])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn search_by_username(
        &self,
        term: &str,
        exclude: PrincipalId,
        limit: u32,
    ) -> RepoResult<Vec<Profile>> {
        let pattern = format!("%{}%", escape_like(term));
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL}
             WHERE username LIKE ?1 ESCAPE '\\'
               AND id <> ?2
             ORDER BY username ASC
             LIMIT ?3;"
        ))?;
        let mut rows = stmt.query(params![pattern, exclude.to_string(), i64::from(limit)])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let is_admin = flag_from_int(row.get("is_admin")?, "profiles.is_admin")?;

    Ok(Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        username: row.get("username")?,
        full_name: row.get("full_name")?,
        is_admin,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
