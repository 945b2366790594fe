//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts, where the table takes caller-supplied fields

pub mod comment;
pub mod identity;
pub mod moderation_log;
pub mod rate_window;
pub mod report;
pub mod session;
pub mod user;
pub mod vote;
