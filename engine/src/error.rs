use rings_types::TypesError;
use thiserror::Error;

/// Every failure is fatal to the epoch computation it occurs in.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid epoch, cycle, token or sampling parameters.
    #[error("config error: {0}")]
    Config(String),

    /// A fetched snapshot is missing an expected field, or the collaborator
    /// that should have produced it failed.
    #[error("data error: {0}")]
    Data(String),

    /// Share or balance totals do not reconcile within tolerance.
    #[error("conservation error in {context}: expected {expected} but got {actual}")]
    Conservation {
        context: String,
        expected: String,
        actual: String,
    },

    /// Normalized weights do not sum to exactly one unit.
    #[error("normalization error: weights sum to {actual}, expected {expected}")]
    Normalization { expected: String, actual: String },
}

impl EngineError {
    pub fn conservation(
        context: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::Conservation {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<TypesError> for EngineError {
    fn from(e: TypesError) -> Self {
        Self::Data(e.to_string())
    }
}
