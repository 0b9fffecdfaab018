//! Principals and stored profiles.
//!
//! # Responsibility
//! - Represent the authenticated caller handed in by the identity provider.
//! - Define the stored profile row and its username rules.
//!
//! # Invariants
//! - `Principal::id` equals the identity provider's user id.
//! - Usernames are lowercase `[a-z0-9_]`, 3..=32 chars, unique in storage.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an authenticated actor.
pub type PrincipalId = Uuid;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]{3,32}$").expect("valid username regex"));

/// Authenticated caller as supplied by the identity provider.
///
/// The engine never manages credentials; it trusts this shape as the
/// session's verdict on who is calling and whether they hold the
/// administrator flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub is_admin: bool,
}

impl Principal {
    pub fn new(id: PrincipalId) -> Self {
        Self {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: PrincipalId) -> Self {
        Self { id, is_admin: true }
    }
}

/// Stored profile row keyed by the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: PrincipalId,
    /// Unique handle used for share lookups.
    pub username: String,
    pub full_name: Option<String>,
    /// Grants the moderation override; never consulted by ordinary access
    /// resolution.
    pub is_admin: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Profile {
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        validate_username(&self.username)
    }
}

/// Checks one username against the profile contract.
pub fn validate_username(username: &str) -> Result<(), ProfileValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ProfileValidationError::InvalidUsername(
            username.to_string(),
        ))
    }
}

/// Profile validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    InvalidUsername(String),
}

impl Display for ProfileValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(value) => write!(
                f,
                "invalid username `{value}`: expected 3-32 chars of [a-z0-9_]"
            ),
        }
    }
}

impl Error for ProfileValidationError {}
