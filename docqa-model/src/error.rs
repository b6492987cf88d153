//! Error types for the `docqa-model` crate.

use docqa_rag::RagError;
use thiserror::Error;

/// Errors raised by text generators.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The backend could not be reached or refused the credentials.
    #[error("Model unavailable ({model}): {message}")]
    ModelUnavailable {
        /// The model that was being called.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The backend answered, but not with a usable completion.
    #[error("Inference failed ({model}): {message}")]
    Inference {
        /// The model that was being called.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The model was configured with invalid settings.
    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),
}

impl From<ModelError> for RagError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ModelUnavailable { model, message } => {
                RagError::ModelUnavailable { model, message }
            }
            ModelError::Inference { .. } => RagError::ReaderError(err.to_string()),
            ModelError::InvalidConfig(message) => RagError::ConfigError(message),
        }
    }
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_keeps_run_fatality() {
        let unavailable: RagError =
            ModelError::ModelUnavailable { model: "m".into(), message: "down".into() }.into();
        assert!(unavailable.is_fatal_for_run());

        let inference: RagError =
            ModelError::Inference { model: "m".into(), message: "empty".into() }.into();
        assert!(matches!(inference, RagError::ReaderError(_)));
        assert!(!inference.is_fatal_for_run());
    }
}
