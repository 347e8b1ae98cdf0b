use thiserror::Error;

use crate::generation::validation::ValidationError;
use crate::history::StorageError;
use crate::llm_client::LlmError;

/// Application-level error type. Every variant ends the run with exit code 1.
#[derive(Debug, Error)]
pub enum TriviaError {
    #[error("Required environment variable '{0}' is not set")]
    MissingCredential(&'static str),

    #[error("Day number {0} cannot be incremented")]
    DayNumberOverflow(u32),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Invalid model response: {source}\nRaw response:\n{raw}")]
    InvalidResponse {
        #[source]
        source: ValidationError,
        raw: String,
    },
}
