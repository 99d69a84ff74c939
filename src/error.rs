//! Error types for Vitalsynth

use thiserror::Error;

use crate::store::Category;

/// Errors that can occur while generating, transforming, or exchanging
/// biometric datasets
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("Degenerate source interval: start and end are identical")]
    DegenerateInterval,

    #[error("Empty date range: end must be after start")]
    EmptyDateRange,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Write rejected for read-only category: {0}")]
    WriteRejected(Category),

    #[error("Unsupported option: {0}")]
    Unsupported(String),
}
