//! Error taxonomy shared by every crate in the workspace.
//!
//! Collaborator failures (`GenerationError`) are recoverable: the orchestrators
//! retry them and then substitute templated fallbacks. `SimulationError` adds the
//! fatal cases that indicate a construction-time invariant breach.

use thiserror::Error;

/// Failure of the external text/decision collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    /// Network failure, timeout, rate limit or 5xx. Retryable.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response arrived but did not match the requested shape. Retryable.
    #[error("response did not match shape `{shape}`: {detail}")]
    Parse { shape: String, detail: String },

    /// The collaborator refused the request (bad credentials, malformed request).
    /// Retrying cannot help.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Retry budget spent; carries the last underlying failure.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    pub fn parse(shape: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            shape: shape.into(),
            detail: detail.into(),
        }
    }

    /// Whether another attempt (at a lower temperature) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Parse { .. })
    }

    /// True for shape/validation failures, including an exhausted run whose
    /// last failure was one.
    pub fn is_parse_failure(&self) -> bool {
        match self {
            Self::Parse { .. } => true,
            Self::Exhausted { last, .. } => last.is_parse_failure(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    /// A session was requested for an organization without a contact persona.
    #[error("organization `{organization}` has no contact persona configured")]
    MissingContact { organization: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
