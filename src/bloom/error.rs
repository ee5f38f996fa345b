use thiserror::Error;

pub type BloomResult<T> = std::result::Result<T, BloomError>;

#[derive(Error, Debug)]
pub enum BloomError {
    #[error("Capacity must be greater than 0")]
    ZeroCapacity,

    #[error("False positive rate must be between 0 and 1, got {rate}")]
    InvalidFalsePositiveRate { rate: f64 },

    #[error(
        "Filter is not initialized: {bits} bits, {hashes} hash functions"
    )]
    NotInitialized { bits: usize, hashes: usize },

    #[error("No elements found in input")]
    EmptyInput,

    #[error("Header field `{field}` does not fit into 32 bits: {value}")]
    HeaderOverflow { field: &'static str, value: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::error::EncodeError> for BloomError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BloomError::SerializationError(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BloomError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BloomError::SerializationError(err.to_string())
    }
}
