//! Error types for docfilter operations.

use crate::condition::Operator;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid operand for {op}: {message}")]
    InvalidOperand { op: Operator, message: String },

    #[error("Parse error at offset {pos}: {message}")]
    Parse { pos: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
