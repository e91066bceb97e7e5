//! Error types for the vision engine.
//!
//! The taxonomy follows the subsystem's failure semantics: worker
//! unavailability is sticky and fails fast, timeouts are recoverable and
//! left to the caller to retry or fall back, worker-reported computation
//! errors are non-fatal to the manager.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VisionError {
    /// The worker could not be (or was never) initialized. Sticky until
    /// `restart()`; callers should fall back to synchronous calculation.
    #[error("Vision worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// No response within the request's timeout window. The pending entry
    /// is removed; a late worker response is discarded.
    #[error("Vision request {request_id} timed out after {elapsed_ms}ms")]
    Timeout { request_id: u64, elapsed_ms: u64 },

    /// The manager was terminated or restarted while the request was in
    /// flight.
    #[error("Vision request cancelled by worker shutdown")]
    Cancelled,

    /// The worker reported a computation failure for this request only.
    #[error("Vision worker error: {0}")]
    Worker(String),

    /// The fog persistence collaborator failed.
    #[error("Fog store error: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Scene not found")]
    SceneNotFound,
}

impl From<StoreError> for VisionError {
    fn from(err: StoreError) -> Self {
        VisionError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = VisionError::Timeout {
            request_id: 7,
            elapsed_ms: 5000,
        };
        assert_eq!(err.to_string(), "Vision request 7 timed out after 5000ms");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: VisionError = StoreError::Backend("connection refused".into()).into();
        assert!(matches!(err, VisionError::Store(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
