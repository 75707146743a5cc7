/// Errors reported by the table and auth halves of the backend.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("unknown column {column} on {table}")]
    UnknownColumn { table: String, column: String },
    #[error("unsupported value for {0}")]
    UnsupportedValue(String),
    #[error("expected exactly one row from {0}")]
    NotSingle(String),
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("User already registered")]
    UserExists,
    #[error("Password should be at least {0} characters")]
    WeakPassword(usize),
    #[error("no active session")]
    NoSession,
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
    #[error("row decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// True when the failure came from a constraint the schema declares (unique,
    /// foreign key, not null).
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            BackendError::Sql(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
