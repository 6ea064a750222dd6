/// Convenience result type used across the runtime.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by runtime APIs.
///
/// Every variant except [`ReelError::Other`] is fatal for the frame that produced it: the
/// executor aborts the frame and the host decides whether to hold the previous frame.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// The compiled program broke a contract the compiler promised to uphold
    /// (missing slot meta, storage-class mismatch, invalid constant id, malformed output).
    #[error("contract violation: {0}")]
    Contract(String),

    /// A slot was written twice within one frame.
    #[error("double write: slot {slot} was already written in frame {frame_id}")]
    DoubleWrite {
        /// Offending slot index.
        slot: u32,
        /// Frame in which the second write happened.
        frame_id: u64,
    },

    /// A materializer received malformed inputs (bad domain, oversized mesh, format mismatch).
    #[error("materialize error: {0}")]
    Materialize(String),

    /// Errors while evaluating a step that are not attributable to the program contract.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Contract`] value.
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Build a [`ReelError::Materialize`] value.
    pub fn materialize(msg: impl Into<String>) -> Self {
        Self::Materialize(msg.into())
    }

    /// Build a [`ReelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
