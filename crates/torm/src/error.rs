//! Error types for torm

use thiserror::Error;

/// Result type alias for torm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement assembly and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The record type's table was never registered
    #[error("Table `{0}` is not registered")]
    UnregisteredTable(String),

    /// Named parameter substitution failed
    #[error("Bind error: {0}")]
    Bind(String),

    /// Unique constraint violation
    #[error("Unique constraint violation on `{constraint}`: {source}")]
    UniqueViolation {
        constraint: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Foreign key constraint violation
    #[error("Foreign key violation on `{constraint}`: {source}")]
    ForeignKeyViolation {
        constraint: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Check constraint violation
    #[error("Check constraint violation on `{constraint}`: {source}")]
    CheckViolation {
        constraint: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Statement timeout error
    #[error("Statement timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// The unit of work failed and the rollback failed as well
    #[error("{cause}; failed to rollback transaction: {rollback}")]
    RollbackFailed {
        cause: Box<OrmError>,
        rollback: Box<OrmError>,
    },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a bind error
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind(message.into())
    }

    /// Merge a unit-of-work failure with the rollback failure that followed it.
    pub fn rollback_failed(cause: OrmError, rollback: OrmError) -> Self {
        Self::RollbackFailed {
            cause: Box::new(cause),
            rollback: Box::new(rollback),
        }
    }

    /// Errors detected before any I/O: unknown tables, bad field names and
    /// failed parameter substitution.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredTable(_) | Self::Bind(_) | Self::Validation(_)
        )
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The driver error this was built from, if any.
    pub fn source_db_error(&self) -> Option<&tokio_postgres::Error> {
        match self {
            Self::Query(source)
            | Self::UniqueViolation { source, .. }
            | Self::ForeignKeyViolation { source, .. }
            | Self::CheckViolation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// SQLSTATE reported by the server, if any.
    pub fn sqlstate(&self) -> Option<&tokio_postgres::error::SqlState> {
        self.source_db_error().and_then(tokio_postgres::Error::code)
    }

    /// Classify a tokio_postgres error; the driver error is kept as the source.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db_err) = err.as_db_error() else {
            return Self::Query(err);
        };
        let constraint = db_err.constraint().unwrap_or("unknown").to_string();

        match db_err.code().code() {
            "23505" => Self::UniqueViolation {
                constraint,
                source: err,
            },
            "23503" => Self::ForeignKeyViolation {
                constraint,
                source: err,
            },
            "23514" => Self::CheckViolation {
                constraint,
                source: err,
            },
            _ => Self::Query(err),
        }
    }
}
