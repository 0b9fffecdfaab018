//! Profile use-case service.
//!
//! # Invariants
//! - Profile ids come from the identity provider; the engine never mints
//!   them.
//! - Usernames are normalized to lowercase before validation and storage.

use crate::model::principal::{validate_username, PrincipalId, Profile};
use crate::repo::profile_repo::ProfileRepository;
use crate::service::error::{EngineError, EngineResult};

const USERNAME_SEARCH_MIN_CHARS: usize = 3;
const USERNAME_SEARCH_LIMIT: u32 = 5;

/// Profile service facade over the profile repository.
pub struct ProfileService<P: ProfileRepository> {
    profiles: P,
}

impl<P: ProfileRepository> ProfileService<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    /// Registers a profile row for an identity-provider user.
    pub fn create_profile(
        &self,
        id: PrincipalId,
        username: &str,
        full_name: Option<&str>,
        is_admin: bool,
    ) -> EngineResult<Profile> {
        let username = username.trim().to_lowercase();
        validate_username(&username)?;

        self.profiles
            .insert_profile(id, &username, full_name, is_admin)?;
        self.profiles
            .fetch_profile(id)?
            .ok_or(EngineError::InconsistentState(
                "created profile not found in read-back",
            ))
    }

    pub fn get_profile(&self, id: PrincipalId) -> EngineResult<Profile> {
        self.profiles.fetch_profile(id)?.ok_or(EngineError::NotFound)
    }

    /// Username substring search for the share dialog.
    ///
    /// Terms shorter than 3 characters return an empty list rather than an
    /// error, matching the interactive lookup contract.
    pub fn search_profiles(
        &self,
        caller: PrincipalId,
        term: &str,
    ) -> EngineResult<Vec<Profile>> {
        let term = term.trim();
        if term.chars().count() < USERNAME_SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        Ok(self
            .profiles
            .search_by_username(term, caller, USERNAME_SEARCH_LIMIT)?)
    }
}
