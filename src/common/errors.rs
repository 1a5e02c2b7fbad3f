//! Client error taxonomy shared by the remote layer and the engine.

use thiserror::Error;

/// Failure classes for remote drive operations.
///
/// Transport and parse failures surface verbatim to the caller; remote
/// messages pass through unmodified. Per-item failures inside a batch are
/// absorbed by the orchestrator and summarised once in its report, so only
/// the everything-failed case appears here.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credential rejected before any session existed.
    #[error("connection rejected: {0}")]
    Connection(String),

    /// No usable response received from the service.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A response arrived but could not be interpreted as the expected shape.
    #[error("unexpected response: {0}")]
    ResponseParse(String),

    /// Well-formed response with `success: false`; message passed through.
    #[error("{0}")]
    Remote(String),

    /// Every item in a batch failed.
    #[error("all {0} transfers failed")]
    BatchFailed(usize),
}

impl ClientError {
    /// True when the failure means the response body itself was unusable,
    /// as opposed to the service reporting a failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, ClientError::ResponseParse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_message_passes_through_unmodified() {
        let err = ClientError::Remote("quota exceeded".to_string());
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn parse_errors_are_distinguishable_from_transport() {
        assert!(ClientError::ResponseParse("bad json".into()).is_parse());
        assert!(!ClientError::Transport("reset".into()).is_parse());
    }
}
