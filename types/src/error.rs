//! Parse and arithmetic errors for the shared types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid pool id: {0}")]
    InvalidPoolId(String),

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("scale mismatch: {left} vs {right}")]
    ScaleMismatch { left: u8, right: u8 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("fixed-point overflow in {0}")]
    Overflow(&'static str),
}
