use rings_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubgraphError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The endpoint answered but reported query errors.
    #[error("query rejected: {0}")]
    GraphQl(String),
}

impl From<reqwest::Error> for SubgraphError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::Unreachable(format!("connection failed: {e}"))
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}

/// Upstream failures abort the epoch as data errors.
impl From<SubgraphError> for EngineError {
    fn from(e: SubgraphError) -> Self {
        EngineError::Data(e.to_string())
    }
}
