use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowboardError>;

#[derive(Debug, Error)]
pub enum FlowboardError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Card already on board: {0}")]
    DuplicateCard(String),

    #[error("Index {index} out of range for column {column} (length {len})")]
    IndexOutOfRange {
        column: String,
        index: usize,
        len: usize,
    },

    #[error("Invalid gate decision: {0}")]
    InvalidGateDecision(String),

    #[error("No gate is awaiting resolution")]
    NoPendingGate,

    #[error("Invalid card ID format: {0}")]
    InvalidCardId(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
