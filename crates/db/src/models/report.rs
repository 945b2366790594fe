//! Report entity model and DTOs.

use banter_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A report row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub comment_id: DbId,
    pub reporter_id: DbId,
    pub reason: String,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for filing a new report.
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub comment_id: DbId,
    pub reporter_id: DbId,
    pub reason: String,
    pub notes: Option<String>,
}
