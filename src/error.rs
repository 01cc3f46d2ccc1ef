use thiserror::Error;

/// Result type alias for review-topics operations.
pub type Result<T> = std::result::Result<T, TopicsError>;

/// Errors surfaced by the topic-discovery pipeline.
///
/// All variants are recoverable by the caller; the candidate sweep additionally
/// collects per-candidate failures as data instead of aborting (see
/// [`crate::selection::SweepOutcome`]).
#[derive(Debug, Error)]
pub enum TopicsError {
    /// Malformed corpus, document, or tabular input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A hyperparameter is outside its valid range.
    #[error("invalid parameter `{param}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        param: &'static str,
        /// Constraint that was violated.
        reason: String,
    },

    /// The corpus contains no non-empty documents.
    #[error("corpus contains no non-empty documents")]
    EmptyCorpus,

    /// A trained-model accessor was called before `fit`.
    #[error("model not trained; call fit() first")]
    ModelNotTrained,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TopicsError {
    pub(crate) fn invalid_param(param: &'static str, reason: impl Into<String>) -> Self {
        TopicsError::InvalidParameter {
            param,
            reason: reason.into(),
        }
    }
}
