//! Error types for cr35-core

/// Result type alias for core protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Buffer is too short for the requested read
    #[error("Buffer too short: expected at least {expected} bytes, got {actual} bytes")]
    ShortBuffer { expected: usize, actual: usize },
}
