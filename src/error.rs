use thiserror::Error;

/// Main error type for indexing operations.
///
/// Every variant is fatal to the run: the merge invariants require a fully
/// consistent set of temporary blocks, so a failure mid-run leaves an invalid
/// index that must be rebuilt from scratch.
#[derive(Error, Debug)]
pub enum SpimiError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed source row in {path} at line {line}: {reason}")]
    SourceFormat {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("Malformed index row in {path} at line {line}: {reason}")]
    IndexFormat {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for indexing operations
pub type Result<T> = std::result::Result<T, SpimiError>;
