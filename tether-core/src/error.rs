//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum TetherError {
    /// The remote agent rejected or never acknowledged the environment
    /// descriptors; the episode cannot start.
    #[error("remote agent rejected the environment descriptors")]
    EnvironmentRejected,

    /// A configuration value the bridge cannot work with.
    #[error("invalid bridge configuration: {0}")]
    InvalidConfig(String),
}
