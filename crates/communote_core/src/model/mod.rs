//! Domain model for shared notes, comments and moderation records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules next to the shapes they protect.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Deletion is represented by soft-delete tombstones, not hard delete.
//! - A note's owner is set at creation and never changes.

pub mod comment;
pub mod grant;
pub mod note;
pub mod principal;
pub mod report;
