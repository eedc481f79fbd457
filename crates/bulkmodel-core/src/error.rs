//! Error types for BulkModel operations.

use std::fmt;

/// The primary error type for all BulkModel operations.
#[derive(Debug)]
pub enum Error {
    /// Column catalog / entity mapping errors (configuration problems)
    Mapping(MappingError),
    /// Type conversion errors (property access, column coercion)
    Type(TypeError),
    /// Entity tracking errors raised by the persistence context
    Tracking(TrackingError),
    /// Transaction errors
    Transaction(TransactionError),
    /// Connection-related errors reported by the driver
    Connection(ConnectionError),
    /// Errors reported by a bulk-copy transport
    BulkCopy(BulkCopyError),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct MappingError {
    pub kind: MappingErrorKind,
    /// Table the mapping was resolved for.
    pub table: String,
    /// Column involved, if any.
    pub column: Option<String>,
    /// Entity property involved, if any.
    pub property: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingErrorKind {
    /// The catalog returned no columns for the entity type
    NoColumns,
    /// Primary-key columns were requested but none are mapped
    NoPrimaryKey,
    /// A catalog column names a property the entity does not expose
    MissingProperty,
    /// Two catalog columns share a column name
    DuplicateColumn,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: String,
    pub actual: String,
    pub column: Option<String>,
    pub rust_type: Option<&'static str>,
}

#[derive(Debug)]
pub struct TrackingError {
    pub kind: TrackingErrorKind,
    /// Entity type name (`std::any::type_name`).
    pub entity: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingErrorKind {
    /// The entity's primary key contains NULL and cannot identify it
    MissingKey,
    /// The entity is not tracked by the context
    NotTracked,
    /// The requested state transition is not allowed
    InvalidState,
}

#[derive(Debug)]
pub struct TransactionError {
    pub kind: TransactionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionErrorKind {
    /// Already committed
    AlreadyCommitted,
    /// Already rolled back
    AlreadyRolledBack,
    /// The driver refused to begin a transaction
    BeginFailed,
    /// Commit failed
    CommitFailed,
    /// Rollback failed
    RollbackFailed,
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Connection lost during operation
    Disconnected,
    /// Connection is closed
    Closed,
    /// Operation timed out at the driver
    Timeout,
}

#[derive(Debug)]
pub struct BulkCopyError {
    /// Destination table.
    pub table: String,
    /// Rows the transport reports as written before the failure.
    pub rows_copied: u64,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Is this a mapping/configuration error (never fixed by retrying)?
    pub fn is_mapping_error(&self) -> bool {
        matches!(self, Error::Mapping(_))
    }

    /// Get the mapping error kind, if this is a mapping error.
    pub fn mapping_kind(&self) -> Option<MappingErrorKind> {
        match self {
            Error::Mapping(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Get the tracking error kind, if this is a tracking error.
    pub fn tracking_kind(&self) -> Option<TrackingErrorKind> {
        match self {
            Error::Tracking(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mapping(e) => write!(f, "Mapping error: {}", e),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Tracking(e) => write!(f, "Tracking error: {}", e),
            Error::Transaction(e) => write!(f, "Transaction error: {}", e.message),
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::BulkCopy(e) => write!(f, "Bulk copy error: {}", e),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::BulkCopy(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (table '{}')", self.message, self.table)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.entity)
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for BulkCopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (table '{}', {} rows copied)",
            self.message, self.table, self.rows_copied
        )
    }
}

impl From<MappingError> for Error {
    fn from(err: MappingError) -> Self {
        Error::Mapping(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<TrackingError> for Error {
    fn from(err: TrackingError) -> Self {
        Error::Tracking(err)
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<BulkCopyError> for Error {
    fn from(err: BulkCopyError) -> Self {
        Error::BulkCopy(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for BulkModel operations.
pub type Result<T> = std::result::Result<T, Error>;
