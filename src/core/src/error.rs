use thiserror::Error;

/// Conduct error types
#[derive(Error, Debug)]
pub enum ConductError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input value (exposed port key, manifest shape)
    #[error("Format error: {0}")]
    Format(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// OCI image error
    #[error("OCI image error: {0}")]
    OciImage(String),

    /// Control API returned a non-success status
    #[error("Control API error: {url} -> {status_code}: {message}")]
    ControlApi {
        url: String,
        status_code: u16,
        message: String,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ConductError {
    fn from(err: serde_json::Error) -> Self {
        ConductError::Serialization(err.to_string())
    }
}

/// Result type alias for conduct operations
pub type Result<T> = std::result::Result<T, ConductError>;
