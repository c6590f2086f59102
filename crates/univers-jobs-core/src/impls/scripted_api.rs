//! ScriptedJobApi - 開発・テスト用の in-memory バックエンド
//!
//! # 学習ポイント
//! - 台本（VecDeque）で応答を順番に返す。最後の 1 件は繰り返し返す
//! - handle ごとの status 呼び出し回数を記録し、ポーリング回数を検証できる
//! - std::sync::Mutex は await を跨いで保持しない

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{JobError, JobHandle, JobList, JobListQuery, JobStatusRecord};
use crate::ports::{JobApi, JobParams};

/// One scripted answer to `GET /jobs/{handle}`.
#[derive(Debug, Clone)]
pub enum ScriptedStatus {
    Record(JobStatusRecord),
    NotFound,
    Error(String),
}

impl From<JobStatusRecord> for ScriptedStatus {
    fn from(record: JobStatusRecord) -> Self {
        ScriptedStatus::Record(record)
    }
}

#[derive(Default)]
struct ScriptState {
    starts: VecDeque<Result<JobHandle, String>>,
    start_requests: Vec<(String, JobParams)>,
    next_handle: u64,
    statuses: HashMap<JobHandle, VecDeque<ScriptedStatus>>,
    status_calls: HashMap<JobHandle, usize>,
    status_delay: Option<Duration>,
}

impl ScriptState {
    /// Current answer for a handle; the last scripted answer is sticky.
    fn next_status(&mut self, handle: &JobHandle) -> ScriptedStatus {
        match self.statuses.get_mut(handle) {
            Some(script) if script.len() > 1 => script
                .pop_front()
                .unwrap_or(ScriptedStatus::NotFound),
            Some(script) => script.front().cloned().unwrap_or(ScriptedStatus::NotFound),
            None => ScriptedStatus::NotFound,
        }
    }

    fn current_records(&self) -> Vec<JobStatusRecord> {
        let mut handles: Vec<&JobHandle> = self.statuses.keys().collect();
        handles.sort();
        handles
            .into_iter()
            .filter_map(|handle| match self.statuses.get(handle)?.front()? {
                ScriptedStatus::Record(record) => {
                    let mut record = record.clone();
                    if record.id.is_none() {
                        record.id = Some(handle.clone());
                    }
                    Some(record)
                }
                _ => None,
            })
            .collect()
    }
}

/// In-memory [`JobApi`] that answers from a script.
///
/// # 使用例
/// ```ignore
/// let api = ScriptedJobApi::new();
/// api.push_start(Ok("abc".into()));
/// api.script("abc".into(), [
///     JobStatusRecord::with_status(JobStatus::Running).progress("3/10").into(),
///     JobStatusRecord::with_status(JobStatus::Completed).into(),
/// ]);
/// ```
#[derive(Default)]
pub struct ScriptedJobApi {
    state: Mutex<ScriptState>,
}

impl ScriptedJobApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue the outcome of the next `start_job`; `Err` carries the backend detail.
    ///
    /// Without a queued outcome, `start_job` accepts and hands out `job-1`, `job-2`, ...
    pub fn push_start(&self, outcome: Result<JobHandle, String>) {
        self.state().starts.push_back(outcome);
    }

    /// Replace the status script of a handle.
    pub fn script(&self, handle: JobHandle, answers: impl IntoIterator<Item = ScriptedStatus>) {
        self.state()
            .statuses
            .insert(handle, answers.into_iter().collect());
    }

    /// Delay every status answer, so a check can be caught in flight.
    pub fn set_status_delay(&self, delay: Duration) {
        self.state().status_delay = Some(delay);
    }

    pub fn status_calls(&self, handle: &JobHandle) -> usize {
        self.state().status_calls.get(handle).copied().unwrap_or(0)
    }

    pub fn total_status_calls(&self) -> usize {
        self.state().status_calls.values().sum()
    }

    /// Every `(endpoint, params)` received by `start_job`, oldest first.
    pub fn start_requests(&self) -> Vec<(String, JobParams)> {
        self.state().start_requests.clone()
    }
}

#[async_trait]
impl JobApi for ScriptedJobApi {
    async fn start_job(&self, endpoint: &str, params: &JobParams) -> Result<JobHandle, JobError> {
        let mut state = self.state();
        state
            .start_requests
            .push((endpoint.to_string(), params.clone()));

        match state.starts.pop_front() {
            Some(Ok(handle)) => Ok(handle),
            Some(Err(detail)) => Err(JobError::Start(detail)),
            None => {
                state.next_handle += 1;
                Ok(JobHandle::new(format!("job-{}", state.next_handle)))
            }
        }
    }

    async fn job_status(&self, handle: &JobHandle) -> Result<JobStatusRecord, JobError> {
        let (answer, delay) = {
            let mut state = self.state();
            *state.status_calls.entry(handle.clone()).or_default() += 1;
            (state.next_status(handle), state.status_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match answer {
            ScriptedStatus::Record(record) => Ok(record),
            ScriptedStatus::NotFound => Err(JobError::NotFound(handle.clone())),
            ScriptedStatus::Error(message) => Err(JobError::Status(message)),
        }
    }

    async fn list_jobs(&self, query: &JobListQuery) -> Result<JobList, JobError> {
        let records = self.state().current_records();
        let active = records.iter().filter(|r| !r.is_terminal()).count();

        let mut jobs: Vec<JobStatusRecord> = records
            .into_iter()
            .filter(|r| match &query.universe {
                Some(universe) => r.universe.as_ref() == Some(universe),
                None => true,
            })
            .collect();
        if let Some(limit) = query.limit {
            jobs.truncate(limit as usize);
        }

        Ok(JobList {
            total: Some(jobs.len()),
            jobs,
            active,
        })
    }

    async fn cleanup_jobs(&self, max_age_hours: u32) -> Result<String, JobError> {
        let mut state = self.state();
        state.statuses.retain(|_, script| {
            !matches!(script.front(), Some(ScriptedStatus::Record(r)) if r.is_terminal())
        });
        Ok(format!("Cleaned up jobs older than {max_age_hours} hours"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;

    fn running(progress: &str) -> ScriptedStatus {
        JobStatusRecord::with_status(JobStatus::Running)
            .progress(progress)
            .into()
    }

    #[tokio::test]
    async fn script_is_consumed_in_order_and_last_answer_sticks() {
        let api = ScriptedJobApi::new();
        let handle = JobHandle::new("abc");
        api.script(
            handle.clone(),
            [
                running("1/2"),
                JobStatusRecord::with_status(JobStatus::Completed).into(),
            ],
        );

        assert_eq!(api.job_status(&handle).await.unwrap().label(), "1/2");
        assert_eq!(api.job_status(&handle).await.unwrap().status, JobStatus::Completed);
        assert_eq!(api.job_status(&handle).await.unwrap().status, JobStatus::Completed);
        assert_eq!(api.status_calls(&handle), 3);
    }

    #[tokio::test]
    async fn unknown_handle_is_not_found() {
        let api = ScriptedJobApi::new();
        let err = api.job_status(&JobHandle::new("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn start_hands_out_handles_unless_scripted() {
        let api = ScriptedJobApi::new();
        api.push_start(Err("theme required".to_string()));

        let err = api.start_job("/generate/x/images", &JobParams::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "theme required");

        let handle = api.start_job("/generate/x/images", &JobParams::new()).await.unwrap();
        assert_eq!(handle.as_str(), "job-1");
        assert_eq!(api.start_requests().len(), 2);
    }

    #[tokio::test]
    async fn list_and_cleanup_follow_current_answers() {
        let api = ScriptedJobApi::new();
        let mut ocean = JobStatusRecord::with_status(JobStatus::Running);
        ocean.universe = Some("ocean".to_string());
        let mut forest = JobStatusRecord::with_status(JobStatus::Failed).error("boom");
        forest.universe = Some("forest".to_string());
        api.script(JobHandle::new("a"), [ocean.into()]);
        api.script(JobHandle::new("b"), [forest.into()]);

        let all = api.list_jobs(&JobListQuery::all()).await.unwrap();
        assert_eq!(all.total(), 2);
        assert_eq!(all.active, 1);

        let only_ocean = api.list_jobs(&JobListQuery::universe("ocean")).await.unwrap();
        assert_eq!(only_ocean.jobs.len(), 1);
        assert_eq!(only_ocean.jobs[0].id, Some(JobHandle::new("a")));

        api.cleanup_jobs(24).await.unwrap();
        let after = api.list_jobs(&JobListQuery::all()).await.unwrap();
        assert_eq!(after.total(), 1);
    }
}
