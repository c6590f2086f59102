//! Errors - ジョブ API のエラー分類
//!
//! どのエラーもそのジョブにとっては終端扱い（ポーラーはリトライしない）。

use thiserror::Error;

use super::ids::JobHandle;

/// Message used when the backend rejects a job without a `detail`.
pub const START_FAILED: &str = "Failed to start job";

/// Message surfaced when a handle is unknown to the backend.
pub const NOT_FOUND: &str = "Job not found - API may have restarted";

#[derive(Debug, Error)]
pub enum JobError {
    /// Job creation was rejected or the request never reached the backend.
    #[error("{0}")]
    Start(String),

    /// The backend does not know this handle, most likely because it
    /// restarted and lost its in-memory jobs. Do not retry the same handle.
    #[error("Job not found - API may have restarted")]
    NotFound(JobHandle),

    #[error("Failed to get job status: {0}")]
    Status(String),

    #[error("Failed to list jobs: {0}")]
    List(String),

    #[error("Failed to clean up jobs: {0}")]
    Cleanup(String),

    /// A 2xx response whose body does not have the expected shape.
    #[error("malformed response from {context}: {reason}")]
    MalformedResponse { context: String, reason: String },
}

impl JobError {
    pub fn malformed(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        JobError::MalformedResponse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, JobError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_error_shows_backend_detail_verbatim() {
        let err = JobError::Start("theme required".to_string());
        assert_eq!(err.to_string(), "theme required");
    }

    #[test]
    fn not_found_message_is_fixed() {
        let err = JobError::NotFound(JobHandle::new("abc"));
        assert_eq!(err.to_string(), NOT_FOUND);
        assert!(err.is_not_found());
    }

    #[test]
    fn malformed_names_its_context() {
        let err = JobError::malformed("GET /jobs/abc", "missing field `status`");
        assert_eq!(
            err.to_string(),
            "malformed response from GET /jobs/abc: missing field `status`"
        );
        assert!(!err.is_not_found());
    }
}
