//! JobObserver port - ポーリングのコールバック

use crate::domain::{JobStatusRecord, PollEvent};

/// Receives the lifecycle of one polled job.
///
/// Every method has an empty default so an observer only implements the
/// callbacks it cares about. Calls happen on the polling task, never inside
/// `poll_job` itself.
pub trait JobObserver: Send + Sync {
    /// Called after every successful status check, terminal ones included.
    fn on_update(&self, _record: &JobStatusRecord) {}

    /// Called once when the job reports `completed`.
    fn on_complete(&self, _result: Option<serde_json::Value>) {}

    /// Called once when the job reports `failed` or a status check fails.
    fn on_error(&self, _message: &str) {}

    /// Dispatch a [`PollEvent`] to the matching callback.
    fn observe(&self, event: PollEvent) {
        match event {
            PollEvent::Update(record) => self.on_update(&record),
            PollEvent::Completed(result) => self.on_complete(result),
            PollEvent::Failed(message) => self.on_error(&message),
        }
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl JobObserver for NoopObserver {}
