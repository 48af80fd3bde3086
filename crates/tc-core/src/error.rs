use thiserror::Error;

pub type TcResult<T> = Result<T, TcError>;

/// Workspace-wide error, the common denominator that crate-specific errors
/// convert into at API boundaries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TcError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Out of range: {what}")]
    OutOfRange { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}
