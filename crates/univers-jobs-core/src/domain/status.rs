//! Job status records as reported by the backend.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ids::JobHandle;

/// Lifecycle state of a server-side job.
///
/// State transitions:
/// - Pending -> Running -> Completed
/// - Pending -> Running -> Failed
///
/// Pending and Running are not distinguished by the poller; both simply
/// produce another update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one job.
///
/// Only `status` is required; everything else is optional on the wire.
/// `result` is an opaque payload whose shape belongs to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobHandle>,

    /// Job type, e.g. `generate_music` or `translate_lyrics`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
}

impl JobStatusRecord {
    /// Minimal record carrying only a status.
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            id: None,
            job_type: None,
            universe: None,
            description: None,
            status,
            progress: None,
            result: None,
            error: None,
            created_at: None,
            completed_at: None,
        }
    }

    pub fn progress(mut self, progress: impl Into<String>) -> Self {
        self.progress = Some(progress.into());
        self
    }

    pub fn result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Text for progress displays: the progress message, else the raw status.
    pub fn label(&self) -> &str {
        match self.progress.as_deref() {
            Some(progress) if !progress.is_empty() => progress,
            _ => self.status.as_str(),
        }
    }
}

/// Response of `GET /jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<JobStatusRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,

    /// Number of pending or running jobs on the backend (all universes).
    pub active: usize,
}

impl JobList {
    pub fn total(&self) -> usize {
        self.total.unwrap_or(self.jobs.len())
    }
}

/// Filter for `GET /jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobListQuery {
    pub universe: Option<String>,
    pub limit: Option<u32>,
}

impl JobListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn universe(universe: impl Into<String>) -> Self {
        Self {
            universe: Some(universe.into()),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(universe) = &self.universe {
            pairs.push(("universe", universe.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::pending(JobStatus::Pending, false)]
    #[case::running(JobStatus::Running, false)]
    #[case::completed(JobStatus::Completed, true)]
    #[case::failed(JobStatus::Failed, true)]
    fn terminal_states(#[case] status: JobStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn full_backend_record_deserializes() {
        let record: JobStatusRecord = serde_json::from_value(json!({
            "id": "3f2a91c0",
            "type": "generate_music",
            "universe": "ocean",
            "description": "Music for 12 concepts",
            "status": "completed",
            "progress": "12/12",
            "result": {"count": 12},
            "error": null,
            "created_at": "2024-05-01T10:20:30.123456",
            "completed_at": "2024-05-01T10:25:02.000001"
        }))
        .unwrap();

        assert_eq!(record.id, Some(JobHandle::new("3f2a91c0")));
        assert_eq!(record.job_type.as_deref(), Some("generate_music"));
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.result, Some(json!({"count": 12})));
        assert_eq!(record.error, None);
        assert!(record.created_at.is_some());
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn minimal_record_deserializes() {
        let record: JobStatusRecord =
            serde_json::from_value(json!({"status": "running", "progress": "3/10"})).unwrap();

        assert_eq!(record, JobStatusRecord::with_status(JobStatus::Running).progress("3/10"));
    }

    #[test]
    fn missing_status_is_rejected() {
        let err = serde_json::from_value::<JobStatusRecord>(json!({"progress": "3/10"}));
        assert!(err.is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = serde_json::from_value::<JobStatusRecord>(json!({"status": "exploded"}));
        assert!(err.is_err());
    }

    #[rstest]
    #[case::progress_wins(Some("3/10"), JobStatus::Running, "3/10")]
    #[case::empty_progress_falls_back(Some(""), JobStatus::Running, "running")]
    #[case::no_progress(None, JobStatus::Pending, "pending")]
    fn label_prefers_progress(
        #[case] progress: Option<&str>,
        #[case] status: JobStatus,
        #[case] expected: &str,
    ) {
        let mut record = JobStatusRecord::with_status(status);
        record.progress = progress.map(str::to_string);
        assert_eq!(record.label(), expected);
    }

    #[test]
    fn job_list_total_defaults_to_len() {
        let list: JobList = serde_json::from_value(json!({
            "jobs": [{"status": "running"}, {"status": "failed", "error": "boom"}],
            "active": 1
        }))
        .unwrap();

        assert_eq!(list.total(), 2);
        assert_eq!(list.active, 1);
    }

    #[test]
    fn list_query_pairs() {
        assert!(JobListQuery::all().pairs().is_empty());
        assert_eq!(
            JobListQuery::universe("ocean").limit(10).pairs(),
            vec![("universe", "ocean".to_string()), ("limit", "10".to_string())]
        );
    }
}
