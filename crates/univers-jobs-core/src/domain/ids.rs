//! Domain identifiers.
//!
//! - `JobHandle`: バックエンドが発行する不透明な job_id（構造は解釈しない）
//! - `PollId`: ポーリング登録ごとの ULID（同じ handle の登録世代を区別する）

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque identifier the backend returns when it accepts a job.
///
/// Only equality and lookup are meaningful; the content is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of one polling registration.
///
/// `poll_job` can be called again for a handle that is already polled; each
/// call gets a fresh `PollId` so the registry can tell the generations apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PollId(Ulid);

impl PollId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "poll-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_handle_is_transparent_on_the_wire() {
        let handle = JobHandle::new("abc");
        assert_eq!(serde_json::to_string(&handle).unwrap(), "\"abc\"");

        let parsed: JobHandle = serde_json::from_str("\"3f2a91c0\"").unwrap();
        assert_eq!(parsed.as_str(), "3f2a91c0");
        assert_eq!(parsed.to_string(), "3f2a91c0");
    }

    #[test]
    fn poll_ids_are_unique_per_registration() {
        let a = PollId::generate();
        let b = PollId::generate();

        assert_ne!(a, b);
        assert!(a.to_string().starts_with("poll-"));
    }
}
