use crate::types::DbId;

/// Domain error taxonomy shared by every layer of the system.
///
/// The first six variants are the user-visible outcome kinds; `Internal`
/// covers unexpected storage or infrastructure failures and is the only
/// variant whose message is not safe to show to a caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, unknown, or expired session token. Terminal for the request.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid session but the actor is banned, muted, or lacks the role.
    /// The message is the machine-readable denial reason.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Budget exhausted for this action class in the current window.
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    /// The external identity provider timed out or refused the connection.
    /// Transient; the caller may retry the whole identity-resolution flow.
    #[error("Identity provider unreachable: {0}")]
    ProviderUnreachable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
