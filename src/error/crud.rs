use thiserror::Error as ThisError;

/// Why a CRUD call produced no result.
///
/// Every variant except `Database` is raised before a statement reaches the
/// database.
#[derive(Debug, ThisError)]
pub enum CrudError {
    #[error("no fields given for {table}")]
    EmptyData { table: String },

    #[error("refusing unconditional {operation} on {table}")]
    MissingConditions {
        operation: &'static str,
        table: String,
    },

    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CrudError {
    /// True when the statement was refused without touching the database.
    pub fn is_rejected(&self) -> bool {
        !matches!(self, CrudError::Database(_))
    }
}
