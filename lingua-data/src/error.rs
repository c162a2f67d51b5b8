use crate::query::QueryError;

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// A translation (or entity) required by the caller does not exist.
    NotFound(String),
    /// Failure reported by the storage backend, propagated unchanged.
    Database(Box<dyn std::error::Error + Send + Sync>),
    /// A query could not be built (e.g. an invalid identifier).
    Query(QueryError),
    /// A record column is missing or has an unexpected type.
    Decode { column: String, expected: &'static str },
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `lingua-data-sqlx`) to wrap
    /// driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn decode(column: impl Into<String>, expected: &'static str) -> Self {
        DataError::Decode {
            column: column.into(),
            expected,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Query(err) => write!(f, "Query error: {err}"),
            DataError::Decode { column, expected } => {
                write!(f, "Decode error: column '{column}' is not a valid {expected}")
            }
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            DataError::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        DataError::Query(err)
    }
}

impl From<DataError> for lingua_core::HttpError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => lingua_core::HttpError::NotFound(msg),
            DataError::Query(e) => lingua_core::HttpError::BadRequest(e.to_string()),
            DataError::Database(e) => lingua_core::HttpError::Internal(e.to_string()),
            other => lingua_core::HttpError::Internal(other.to_string()),
        }
    }
}
