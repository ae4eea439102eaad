//! Error types for the query engine
use thiserror::Error;

/// Failures surfaced by query operations
///
/// Every public engine operation returns one of these instead of letting a
/// backend failure escape. The response layer maps them to the external
/// error envelope.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("model not loaded - call load_model() first")]
    ModelNotLoaded,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index {id} out of range for dictionary of size {len}")]
    IndexOutOfRange { id: i32, len: usize },

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
