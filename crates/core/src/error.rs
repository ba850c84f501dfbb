//! Error types for chess-tutor-core

use std::time::Duration;

use thiserror::Error;

use crate::engine::EngineError;
use crate::rules::PositionError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),

    #[error("analysis engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("analysis engine timed out after {0:?}")]
    EngineTimeout(Duration),

    #[error("analysis engine protocol error: {0}")]
    EngineProtocolError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Who is to blame for a failure, as seen by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself was bad
    Client,
    /// The engine is down or misbehaving; retrying later may help
    ServiceUnavailable,
    Internal,
}

impl AnalysisError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AnalysisError::InvalidPosition(_) => ErrorClass::Client,
            AnalysisError::EngineUnavailable(_)
            | AnalysisError::EngineTimeout(_)
            | AnalysisError::EngineProtocolError(_) => ErrorClass::ServiceUnavailable,
            AnalysisError::Internal(_) => ErrorClass::Internal,
        }
    }
}

impl From<EngineError> for AnalysisError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Unavailable(reason) => AnalysisError::EngineUnavailable(reason),
            EngineError::Timeout(after) => AnalysisError::EngineTimeout(after),
            EngineError::Protocol(reason) => AnalysisError::EngineProtocolError(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        let invalid = AnalysisError::from(PositionError::Syntax("x".into()));
        assert_eq!(invalid.class(), ErrorClass::Client);

        for engine_error in [
            EngineError::Unavailable("gone".into()),
            EngineError::Timeout(Duration::from_secs(1)),
            EngineError::Protocol("junk".into()),
        ] {
            assert_eq!(AnalysisError::from(engine_error).class(), ErrorClass::ServiceUnavailable);
        }

        assert_eq!(AnalysisError::Internal("panic".into()).class(), ErrorClass::Internal);
    }

    #[test]
    fn test_engine_error_mapping() {
        let mapped = AnalysisError::from(EngineError::Timeout(Duration::from_millis(50)));
        assert_eq!(mapped, AnalysisError::EngineTimeout(Duration::from_millis(50)));
        assert_eq!(mapped.to_string(), "analysis engine timed out after 50ms");
    }
}
