//! Error types for the anchor engine.

/// Result type alias
pub type Result<T> = std::result::Result<T, AnchorError>;

/// Anchor engine error types
#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    /// I/O error from the blob store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<postcard::Error> for AnchorError {
    fn from(e: postcard::Error) -> Self {
        AnchorError::Serialize(e.to_string())
    }
}

impl From<basic_toml::Error> for AnchorError {
    fn from(e: basic_toml::Error) -> Self {
        AnchorError::Config(e.to_string())
    }
}
