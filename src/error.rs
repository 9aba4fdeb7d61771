//! Error types for the rowcache invalidator.
//!

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigurationError;

#[derive(Debug, Error)]
pub enum InvalidatorError {
    #[error("Rowcache invalidator aborting: {0}")]
    Fatal(String),
    #[error("Bad input: {0}")]
    BadInput(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("{message}: uncaught panic:\n{backtrace}")]
    Unexpected { message: String, backtrace: String },
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Coarse failure classes that drive propagation decisions.
///
/// - `Fatal`: startup preconditions unmet, `open` aborts
/// - `BadInput`: malformed or unresolvable event content
/// - `Transient`: stream-level I/O failure, retried forever
/// - `Unexpected`: anything caught generically (panics)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Fatal,
    BadInput,
    Transient,
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Fatal => "fatal",
            ErrorKind::BadInput => "bad_input",
            ErrorKind::Transient => "transient",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

impl InvalidatorError {
    pub fn fatal(message: impl Into<String>) -> Self {
        InvalidatorError::Fatal(message.into())
    }

    pub fn bad_input(message: impl Into<String>) -> Self {
        InvalidatorError::BadInput(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        InvalidatorError::Connection(message.into())
    }

    pub fn stream(message: impl Into<String>) -> Self {
        InvalidatorError::Stream(message.into())
    }

    /// Build an `Unexpected` error from a `catch_unwind` payload.
    ///
    /// The backtrace is captured at the call site, which is the boundary that
    /// caught the panic.
    pub fn unexpected_from_panic(payload: Box<dyn Any + Send>) -> Self {
        InvalidatorError::Unexpected {
            message: panic_message(payload.as_ref()),
            backtrace: Backtrace::force_capture().to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InvalidatorError::Fatal(_) | InvalidatorError::Configuration(_) => ErrorKind::Fatal,
            InvalidatorError::BadInput(_) => ErrorKind::BadInput,
            InvalidatorError::Connection(_)
            | InvalidatorError::Stream(_)
            | InvalidatorError::Cache(_) => ErrorKind::Transient,
            InvalidatorError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// True for failures that suggest the replication source itself is
    /// unreachable and warrant an out-of-band health check.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            InvalidatorError::Connection(_)
                | InvalidatorError::Cache(CacheError::ConnectionError(_))
        )
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

pub type InvalidatorResult<T> = Result<T, InvalidatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(InvalidatorError::fatal("x").kind(), ErrorKind::Fatal);
        assert_eq!(InvalidatorError::bad_input("x").kind(), ErrorKind::BadInput);
        assert_eq!(InvalidatorError::connection("x").kind(), ErrorKind::Transient);
        assert_eq!(InvalidatorError::stream("x").kind(), ErrorKind::Transient);
        assert_eq!(
            InvalidatorError::Cache(CacheError::BackendError("boom".into())).kind(),
            ErrorKind::Transient
        );
    }

    #[test]
    fn test_connection_classification() {
        assert!(InvalidatorError::connection("reset by peer").is_connection_error());
        assert!(
            InvalidatorError::Cache(CacheError::ConnectionError("refused".into()))
                .is_connection_error()
        );
        assert!(!InvalidatorError::stream("bad packet").is_connection_error());
        assert!(!InvalidatorError::bad_input("no table").is_connection_error());
    }

    #[test]
    fn test_unexpected_from_panic_payloads() {
        let err = InvalidatorError::unexpected_from_panic(Box::new("static str"));
        match &err {
            InvalidatorError::Unexpected { message, .. } => assert_eq!(message, "static str"),
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Unexpected);

        let err = InvalidatorError::unexpected_from_panic(Box::new(String::from("owned")));
        assert!(err.to_string().starts_with("owned: uncaught panic:"));

        let err = InvalidatorError::unexpected_from_panic(Box::new(42_u32));
        assert!(err.to_string().starts_with("Unknown panic"));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            InvalidatorError::fatal("binlog path not specified").to_string(),
            "Rowcache invalidator aborting: binlog path not specified"
        );
        assert_eq!(
            InvalidatorError::bad_input("Table t1 not found").to_string(),
            "Bad input: Table t1 not found"
        );
    }
}
