//! Error types for promptbatch.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use crate::generate::GenerationError;
use crate::resolve::ResolveError;
use thiserror::Error;

/// Main error type for promptbatch operations.
///
/// Each variant maps to a specific process exit code.
#[derive(Error, Debug)]
pub enum PromptBatchError {
    /// User provided invalid arguments or the project is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// A placeholder could not be expanded.
    #[error("Variable resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// The generation API call failed.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// A project, output, or log file could not be read or written.
    #[error("{0}")]
    Persistence(String),
}

impl PromptBatchError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PromptBatchError::UserError(_) => exit_codes::USER_ERROR,
            PromptBatchError::Resolve(_) => exit_codes::RESOLVE_FAILURE,
            PromptBatchError::Generation(_) => exit_codes::GENERATION_FAILURE,
            PromptBatchError::Persistence(_) => exit_codes::PERSISTENCE_FAILURE,
        }
    }
}

/// Result type alias for promptbatch operations.
pub type Result<T> = std::result::Result<T, PromptBatchError>;
