use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("missing mail configuration: {0}")]
    MissingConfig(String),

    #[error("mail transport failed: {message}")]
    Transport { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
