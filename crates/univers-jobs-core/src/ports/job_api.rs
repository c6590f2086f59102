//! JobApi port - ジョブを管理するバックエンドとの境界
//!
//! # 実装
//! - **HttpJobApi**: REST バックエンド（本番用）
//! - **ScriptedJobApi**: 台本どおりに応答する in-memory 実装（開発・テスト用）

use async_trait::async_trait;

use crate::domain::{JobError, JobHandle, JobList, JobListQuery, JobStatusRecord};

/// Task-specific parameters sent when a job is created.
pub type JobParams = serde_json::Map<String, serde_json::Value>;

/// JobApi はバックエンドのジョブ API を抽象化
///
/// Implementations only translate calls to the transport. Request shaping
/// that holds for every transport (such as the `async` flag) is done by the
/// caller, see [`crate::app::JobPoller::start_job`].
#[async_trait]
pub trait JobApi: Send + Sync {
    /// `POST {endpoint}`; returns the accepted job's handle.
    async fn start_job(&self, endpoint: &str, params: &JobParams) -> Result<JobHandle, JobError>;

    /// `GET /jobs/{handle}`.
    async fn job_status(&self, handle: &JobHandle) -> Result<JobStatusRecord, JobError>;

    /// `GET /jobs`, optionally filtered by universe.
    async fn list_jobs(&self, query: &JobListQuery) -> Result<JobList, JobError>;

    /// `DELETE /jobs/cleanup`; returns the backend's message.
    async fn cleanup_jobs(&self, max_age_hours: u32) -> Result<String, JobError>;
}
