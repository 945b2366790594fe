use banter_core::error::CoreError;

/// Error type for the guard services.
///
/// Wraps [`CoreError`] for domain outcomes and adds the storage failure
/// class. Call [`GuardError::into_core`] at the embedding boundary to
/// collapse both into the shared domain taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A domain-level error from `banter_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for guard service return values.
pub type GuardResult<T> = Result<T, GuardError>;

impl GuardError {
    /// Collapse into a [`CoreError`] suitable for an embedding surface.
    pub fn into_core(self) -> CoreError {
        match self {
            GuardError::Core(core) => core,
            GuardError::Database(err) => classify_sqlx_error(err),
        }
    }
}

/// Classify a sqlx error into a [`CoreError`].
///
/// - Unique constraint violations (constraint name starting with `uq_`)
///   map to `Conflict`.
/// - Everything else is logged and collapsed to a sanitized `Internal`.
///   Repositories signal row absence with `Option`, so `RowNotFound`
///   lands here too.
fn classify_sqlx_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") {
                return CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("A storage error occurred".to_string())
}
