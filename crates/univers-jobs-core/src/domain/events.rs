//! Poll events - 一回のポーリングで観測されたもの

use super::status::JobStatusRecord;

/// What a polling task reports about one job.
///
/// Mirrors the three callbacks of [`crate::ports::JobObserver`]: any number
/// of `Update`s followed by at most one `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Update(JobStatusRecord),
    Completed(Option<serde_json::Value>),
    Failed(String),
}

impl PollEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollEvent::Update(_))
    }
}
