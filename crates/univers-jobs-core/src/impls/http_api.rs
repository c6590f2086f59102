//! HttpJobApi - REST バックエンドへの reqwest 実装
//!
//! | 操作 | リクエスト |
//! |---|---|
//! | start_job | `POST {endpoint}` body `{...params}` → `{job_id}` |
//! | job_status | `GET /jobs/{job_id}` (404 = unknown job) |
//! | list_jobs | `GET /jobs[?universe=..&limit=..]` → `{jobs, total, active}` |
//! | cleanup_jobs | `DELETE /jobs/cleanup?max_age_hours=N` → `{message}` |

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{ApiConfig, ConfigError};
use crate::domain::errors::START_FAILED;
use crate::domain::{JobError, JobHandle, JobList, JobListQuery, JobStatusRecord};
use crate::ports::{JobApi, JobParams};

#[derive(Debug, Deserialize)]
struct StartResponse {
    job_id: JobHandle,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// String details are shown as-is; structured ones (validation errors) as JSON.
    fn into_message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::Null => None,
            serde_json::Value::String(detail) if detail.is_empty() => None,
            serde_json::Value::String(detail) => Some(detail),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CleanupResponse {
    message: String,
}

pub struct HttpJobApi {
    client: Client,
    base: Url,
}

impl HttpJobApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ConfigError::Client)?;
        Self::with_client(client, &config.base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Caller-provided endpoint paths are appended verbatim to the base.
    fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url(), endpoint)
        } else {
            format!("{}/{}", self.base_url(), endpoint)
        }
    }

    fn jobs_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in with_client
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("jobs").extend(segments);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    context: &str,
    transport: fn(String) -> JobError,
) -> Result<T, JobError> {
    let body = response
        .text()
        .await
        .map_err(|e| transport(format!("reading response body: {e}")))?;
    serde_json::from_str(&body).map_err(|e| JobError::malformed(context, e))
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn start_job(&self, endpoint: &str, params: &JobParams) -> Result<JobHandle, JobError> {
        let url = self.endpoint_url(endpoint);
        debug!(%url, "starting job");

        let response = self
            .client
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| JobError::Start(format!("{START_FAILED}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::into_message);
            debug!(%url, %status, ?detail, "job rejected");
            return Err(JobError::Start(
                detail.unwrap_or_else(|| START_FAILED.to_string()),
            ));
        }

        let started: StartResponse =
            decode(response, &format!("POST {endpoint}"), JobError::Start).await?;
        Ok(started.job_id)
    }

    async fn job_status(&self, handle: &JobHandle) -> Result<JobStatusRecord, JobError> {
        let url = self.jobs_url(&[handle.as_str()]);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| JobError::Status(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(JobError::NotFound(handle.clone())),
            status if !status.is_success() => Err(JobError::Status(format!("HTTP {status}"))),
            _ => decode(response, &format!("GET /jobs/{handle}"), JobError::Status).await,
        }
    }

    async fn list_jobs(&self, query: &JobListQuery) -> Result<JobList, JobError> {
        let response = self
            .client
            .get(self.jobs_url(&[]))
            .query(&query.pairs())
            .send()
            .await
            .map_err(|e| JobError::List(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JobError::List(format!("HTTP {}", response.status())));
        }
        decode(response, "GET /jobs", JobError::List).await
    }

    async fn cleanup_jobs(&self, max_age_hours: u32) -> Result<String, JobError> {
        let response = self
            .client
            .delete(self.jobs_url(&["cleanup"]))
            .query(&[("max_age_hours", max_age_hours)])
            .send()
            .await
            .map_err(|e| JobError::Cleanup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JobError::Cleanup(format!("HTTP {}", response.status())));
        }
        let body: CleanupResponse =
            decode(response, "DELETE /jobs/cleanup", JobError::Cleanup).await?;
        Ok(body.message)
    }
}
