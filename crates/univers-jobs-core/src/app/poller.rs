//! JobPoller - 長時間ジョブの開始と完了までの監視
//!
//! # フロー
//! 1. `start_job` でジョブを登録（`async: true` を付与、すぐに job_id が返る）
//! 2. `poll_job` で handle ごとにポーリングタスクを 1 つ起動
//! 3. 各チェックで `on_update`、終端状態で `on_complete` / `on_error`
//! 4. 終端・エラー・キャンセルのいずれでも registry から自分のエントリを外す
//!
//! # キャンセル
//! registry の各エントリは root token の子 `CancellationToken` を持つ。
//! キャンセルされると実行中のリクエストも破棄され、コールバックは呼ばれない。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::{PollEntry, PollRegistry};
use crate::config::PollConfig;
use crate::domain::{
    JobError, JobHandle, JobList, JobListQuery, JobStatus, JobStatusRecord, PollId,
};
use crate::ports::{JobApi, JobObserver, JobParams};

/// Message reported when a job fails without an error text.
pub const JOB_FAILED: &str = "Job failed";

/// Starts server-side jobs and watches them until they finish.
///
/// Owns the poll registry; create one per embedding component and call
/// [`JobPoller::dispose`] on teardown. Must be used inside a tokio runtime.
pub struct JobPoller {
    api: Arc<dyn JobApi>,
    interval: Duration,
    registry: Arc<PollRegistry>,
    root: CancellationToken,
}

impl JobPoller {
    pub fn create(api: Arc<dyn JobApi>, config: PollConfig) -> Self {
        Self {
            api,
            // tokio::time::interval panics on a zero period
            interval: config.interval.max(Duration::from_millis(1)),
            registry: Arc::new(PollRegistry::new()),
            root: CancellationToken::new(),
        }
    }

    /// Ask the backend to start a job and return as soon as it is accepted.
    ///
    /// `async: true` is always set so the backend does not block until the
    /// job finishes.
    pub async fn start_job(
        &self,
        endpoint: &str,
        mut params: JobParams,
    ) -> Result<JobHandle, JobError> {
        params.insert("async".to_string(), serde_json::Value::Bool(true));

        match self.api.start_job(endpoint, &params).await {
            Ok(handle) => {
                info!(%handle, endpoint, "job accepted");
                Ok(handle)
            }
            Err(err) => {
                warn!(endpoint, error = %err, "job rejected");
                Err(err)
            }
        }
    }

    pub async fn job_status(&self, handle: &JobHandle) -> Result<JobStatusRecord, JobError> {
        self.api.job_status(handle).await
    }

    /// Pure read; the registry is not touched.
    pub async fn list_jobs(&self, query: &JobListQuery) -> Result<JobList, JobError> {
        self.api.list_jobs(query).await
    }

    pub async fn cleanup_jobs(&self, max_age_hours: u32) -> Result<String, JobError> {
        self.api.cleanup_jobs(max_age_hours).await
    }

    /// Watch `handle` until it reaches a terminal state.
    ///
    /// The first status check runs right away, then one every interval.
    /// A previous poll of the same handle is cancelled first. Returns the
    /// handle immediately; callbacks run on the spawned polling task.
    pub fn poll_job(&self, handle: JobHandle, observer: Arc<dyn JobObserver>) -> JobHandle {
        let entry = PollEntry::new(self.root.child_token());
        let task = PollTask {
            api: Arc::clone(&self.api),
            registry: Arc::clone(&self.registry),
            handle: handle.clone(),
            poll_id: entry.id,
            token: entry.token.clone(),
            interval: self.interval,
            observer,
        };

        if let Some(previous) = self.registry.install(handle.clone(), entry) {
            debug!(%handle, previous = %previous.id, "replacing active poll");
            previous.token.cancel();
        }
        if self.root.is_cancelled() {
            warn!(%handle, "poller already disposed; poll will not run");
        }

        debug!(%handle, poll = %task.poll_id, "polling started");
        tokio::spawn(task.run());
        handle
    }

    /// Cancel the poll of `handle`. Returns false when it was not polled.
    pub fn stop_polling(&self, handle: &JobHandle) -> bool {
        match self.registry.remove(handle) {
            Some(entry) => {
                entry.token.cancel();
                debug!(%handle, poll = %entry.id, "polling stopped");
                true
            }
            None => false,
        }
    }

    /// Cancel every active poll. Returns how many were active.
    pub fn stop_all_polling(&self) -> usize {
        let drained = self.registry.drain();
        for (_, entry) in &drained {
            entry.token.cancel();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "all polling stopped");
        }
        drained.len()
    }

    /// Teardown: stop everything and refuse to run future polls.
    pub fn dispose(&self) {
        let stopped = self.stop_all_polling();
        self.root.cancel();
        info!(stopped, "job poller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.root.is_cancelled()
    }

    pub fn is_polling(&self, handle: &JobHandle) -> bool {
        self.registry.contains(handle)
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    pub fn active_handles(&self) -> Vec<JobHandle> {
        self.registry.handles()
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// State owned by one spawned polling task.
struct PollTask {
    api: Arc<dyn JobApi>,
    registry: Arc<PollRegistry>,
    handle: JobHandle,
    poll_id: PollId,
    token: CancellationToken,
    interval: Duration,
    observer: Arc<dyn JobObserver>,
}

impl PollTask {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        // checks never overlap: a slow response pushes the next tick back
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let checked = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                checked = self.api.job_status(&self.handle) => checked,
            };
            if self.token.is_cancelled() {
                break;
            }

            if self.dispatch(checked) {
                return;
            }
        }

        self.registry.release(&self.handle, self.poll_id);
        debug!(handle = %self.handle, poll = %self.poll_id, "poll cancelled");
    }

    /// Deliver one check to the observer. Returns true once the poll is over.
    fn dispatch(&self, checked: Result<JobStatusRecord, JobError>) -> bool {
        let record = match checked {
            Ok(record) => record,
            Err(err) => {
                self.finish();
                warn!(handle = %self.handle, error = %err, "status check failed; polling stopped");
                if self.live() {
                    self.observer.on_error(&err.to_string());
                }
                return true;
            }
        };

        debug!(
            handle = %self.handle,
            status = %record.status,
            progress = record.progress.as_deref().unwrap_or(""),
            "status checked"
        );
        if self.live() {
            self.observer.on_update(&record);
        }

        match record.status {
            JobStatus::Pending | JobStatus::Running => false,
            JobStatus::Completed => {
                self.finish();
                info!(handle = %self.handle, "job completed");
                if self.live() {
                    self.observer.on_complete(record.result);
                }
                true
            }
            JobStatus::Failed => {
                self.finish();
                let message = record
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| JOB_FAILED.to_string());
                info!(handle = %self.handle, error = %message, "job failed");
                if self.live() {
                    self.observer.on_error(&message);
                }
                true
            }
        }
    }

    /// Callbacks may stop the poll they run in; later callbacks are then skipped.
    fn live(&self) -> bool {
        !self.token.is_cancelled()
    }

    fn finish(&self) {
        self.registry.release(&self.handle, self.poll_id);
    }
}
