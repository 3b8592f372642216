use sqlx::Error as SqlxError;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Application config {path} is unusable: {reason}")]
    AppConfig { path: PathBuf, reason: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),

    #[error("Giving up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<BootstrapError>,
    },
}

impl From<figment::Error> for BootstrapError {
    fn from(e: figment::Error) -> Self {
        BootstrapError::Config(Box::new(e))
    }
}

/// Whether an error may go away by trying again later.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

// Primary SQLite result codes that mean "not ready yet" rather than "wrong".
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_IOERR: i32 = 10;
const SQLITE_CANTOPEN: i32 = 14;

impl IsRetryable for SqlxError {
    fn is_retryable(&self) -> bool {
        match self {
            SqlxError::Io(_)
            | SqlxError::Tls(_)
            | SqlxError::Protocol(_)
            | SqlxError::PoolTimedOut
            | SqlxError::PoolClosed
            | SqlxError::WorkerCrashed => true,
            SqlxError::Database(db_err) => db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                // extended codes carry the primary code in the low byte
                .map(|code| {
                    matches!(
                        code & 0xff,
                        SQLITE_BUSY | SQLITE_LOCKED | SQLITE_IOERR | SQLITE_CANTOPEN
                    )
                })
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl IsRetryable for BootstrapError {
    fn is_retryable(&self) -> bool {
        match self {
            BootstrapError::DatabaseError(e) => e.is_retryable(),
            BootstrapError::Config(_)
            | BootstrapError::InvalidConfig(_)
            | BootstrapError::AppConfig { .. }
            | BootstrapError::Hash(_)
            | BootstrapError::Blocking(_)
            | BootstrapError::RetriesExhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_errors_are_transient() {
        let err = BootstrapError::from(SqlxError::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        )));
        assert!(err.is_retryable());
        assert!(BootstrapError::from(SqlxError::PoolTimedOut).is_retryable());
    }

    #[test]
    fn row_and_config_errors_are_permanent() {
        assert!(!BootstrapError::from(SqlxError::RowNotFound).is_retryable());
        assert!(!BootstrapError::InvalidConfig("max_attempts must be >= 1".into()).is_retryable());
        let exhausted = BootstrapError::RetriesExhausted {
            attempts: 3,
            source: Box::new(SqlxError::PoolTimedOut.into()),
        };
        assert!(!exhausted.is_retryable());
    }

    #[test]
    fn exhausted_error_keeps_its_cause() {
        use std::error::Error;

        let exhausted = BootstrapError::RetriesExhausted {
            attempts: 30,
            source: Box::new(SqlxError::PoolTimedOut.into()),
        };
        assert_eq!(exhausted.to_string(), "Giving up after 30 attempts");
        let cause = exhausted.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(cause.starts_with("Database error"));
    }
}
