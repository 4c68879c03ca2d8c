//! Error types for markweave

use thiserror::Error;

/// Main error type for markweave operations.
///
/// Parsing itself never fails: malformed markdown degrades to literal
/// text. Errors only come from configuration and I/O.
#[derive(Error, Debug)]
pub enum Error {
    /// The document engine was built with a nesting limit of zero
    #[error("max nesting must be greater than zero")]
    InvalidNesting,

    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown extension name in a configuration or command line
    #[error("unknown extension: {0}")]
    UnknownExtension(String),
}

/// Result type alias for markweave operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::InvalidNesting.to_string(),
            "max nesting must be greater than zero"
        );
        assert_eq!(
            Error::Config("bad".into()).to_string(),
            "Configuration error: bad"
        );
        assert_eq!(
            Error::UnknownExtension("tabels".into()).to_string(),
            "unknown extension: tabels"
        );
    }

    #[test]
    fn test_io_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
