//! Common error types for IFV

use thiserror::Error;

/// Common result type for IFV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the IFV crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
