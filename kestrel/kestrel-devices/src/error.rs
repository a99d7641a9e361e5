//! Error types for the simulated device registry

use kestrel_core::devices::DeviceId;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, DeviceError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),

    #[error("Invalid device type tag: '{0}'")]
    InvalidTag(String),
}
