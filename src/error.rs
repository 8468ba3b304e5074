use crate::types::RunResponse;
use thiserror::Error;

/// Unrecoverable run-level failures.
///
/// Tool-level failures (unknown tool, bad arguments, handler faults) never
/// surface here — the dispatcher folds them into failed
/// [`FunctionResult`](crate::tools::FunctionResult)s so the model can react.
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("run cancelled")]
    Cancelled,

    /// A handoff named an agent that was never registered. This is a
    /// configuration error, not something the model can recover from.
    #[error("unknown agent '{0}': handoff target is not in the registry")]
    UnknownAgent(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// A run that stopped before reaching a natural end. Partial results are
/// never discarded: the transcript and tool records accumulated so far ride
/// along with the error.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunAborted {
    pub error:   SwarmError,
    pub partial: RunResponse,
}

impl RunAborted {
    pub fn new(error: SwarmError, partial: RunResponse) -> Self {
        Self { error, partial }
    }
}
