//! Engine use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the engine's public operations.
//! - Apply access resolution and the shared error taxonomy in front of
//!   persistence, never inside it.
//!
//! # Invariants
//! - Read paths report inaccessible and missing identically (`NotFound`).
//! - Write paths on a visible entity report insufficient capability as
//!   `PermissionDenied`.
//! - No failed authorization or companion mutation is silently swallowed.

pub mod comment_service;
pub mod error;
pub mod moderation_service;
pub mod note_service;
pub mod profile_service;
pub mod share_service;
