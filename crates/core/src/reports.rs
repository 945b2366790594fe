//! Report status constants, transition rules, and validation.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Newly filed, waiting for a moderator.
pub const STATUS_PENDING: &str = "pending";
/// Bumped to admin attention; still open.
pub const STATUS_ESCALATED: &str = "escalated";
/// A moderator acted on the report.
pub const STATUS_RESOLVED: &str = "resolved";
/// A moderator declined to act.
pub const STATUS_DISMISSED: &str = "dismissed";

/// All valid report statuses.
pub const VALID_STATUSES: &[&str] =
    &[STATUS_PENDING, STATUS_ESCALATED, STATUS_RESOLVED, STATUS_DISMISSED];

/// Statuses counting as open for the one-open-report-per-reporter rule.
/// Must stay in sync with the partial unique index on `reports`.
pub const OPEN_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_ESCALATED];

// ---------------------------------------------------------------------------
// Validation constants
// ---------------------------------------------------------------------------

/// Maximum length for the reporter-provided reason (characters).
pub const MAX_REASON_LENGTH: usize = 500;
/// Maximum length for free-form notes (characters).
pub const MAX_NOTES_LENGTH: usize = 2_000;

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Returns the set of statuses that `from_status` may transition to.
///
/// Transition rules:
/// - `pending`   -> `escalated`, `resolved`, `dismissed`
/// - `escalated` -> `resolved`, `dismissed`
/// - `resolved`, `dismissed` are terminal
pub fn valid_transitions(from_status: &str) -> &'static [&'static str] {
    match from_status {
        STATUS_PENDING => &[STATUS_ESCALATED, STATUS_RESOLVED, STATUS_DISMISSED],
        STATUS_ESCALATED => &[STATUS_RESOLVED, STATUS_DISMISSED],
        _ => &[],
    }
}

/// Validate that a status transition from `current` to `next` is allowed.
pub fn validate_transition(current: &str, next: &str) -> Result<(), CoreError> {
    let allowed = valid_transitions(current);
    if allowed.contains(&next) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot move report from '{current}' to '{next}'. Allowed transitions: {allowed:?}"
        )))
    }
}

/// Validate that a status string is one of the known statuses.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid report status '{status}'. Must be one of: {VALID_STATUSES:?}"
        )))
    }
}

/// Validate reporter-supplied text fields.
pub fn validate_report_input(reason: &str, notes: Option<&str>) -> Result<(), CoreError> {
    if reason.trim().is_empty() {
        return Err(CoreError::Validation("Report reason must not be empty".into()));
    }
    if reason.len() > MAX_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Report reason exceeds maximum length of {MAX_REASON_LENGTH} characters (got {})",
            reason.len()
        )));
    }
    if let Some(notes) = notes {
        if notes.len() > MAX_NOTES_LENGTH {
            return Err(CoreError::Validation(format!(
                "Report notes exceed maximum length of {MAX_NOTES_LENGTH} characters (got {})",
                notes.len()
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
