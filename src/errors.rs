use thiserror::Error;

/// Failures reported synchronously to the caller of an engine.
///
/// None of these are fatal to the host: a failed invocation produces no
/// `Run`, and the caller decides how to surface the message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VizError {
    /// Malformed or out-of-range input, rejected before any step is recorded.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Well-formed input that describes an impossible computation.
    #[error("infeasible: {0}")]
    Infeasible(String),

    /// The run was cancelled at a checkpoint; its partial work is discarded.
    #[error("run cancelled")]
    Cancelled,

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
}

impl VizError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        VizError::InvalidConfig(msg.into())
    }

    pub fn infeasible(msg: impl Into<String>) -> Self {
        VizError::Infeasible(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, VizError>;
