//! Error types for the Kestrel engine.
//!
//! The assignment and learning operations never fail: unknown ids and
//! mismatched capabilities are reported through explicit outcome types
//! instead. This error type covers the ambient surfaces only (configuration,
//! IO, serialization of snapshots).

/// Result type alias for Kestrel operations.
pub type Result<T> = std::result::Result<T, KestrelError>;

/// Main error type for the Kestrel engine.
#[derive(Debug, thiserror::Error)]
pub enum KestrelError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KestrelError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = KestrelError::config("bad learning rate");
        assert_eq!(err.to_string(), "Configuration error: bad learning rate");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: KestrelError = io.into();
        assert!(matches!(err, KestrelError::Io(_)));
    }
}
