//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] cr35_transport::Error),

    #[error("Already connected")]
    AlreadyConnected,
}
