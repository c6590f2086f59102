//! ChannelObserver - ポーリングイベントを mpsc チャネルに流す

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{JobStatusRecord, PollEvent};
use crate::ports::JobObserver;

/// Forwards every callback as a [`PollEvent`].
///
/// Send errors are ignored: a dropped receiver just means nobody listens.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<PollEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<PollEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self::new(tx)), rx)
    }
}

impl JobObserver for ChannelObserver {
    fn on_update(&self, record: &JobStatusRecord) {
        let _ = self.tx.send(PollEvent::Update(record.clone()));
    }

    fn on_complete(&self, result: Option<serde_json::Value>) {
        let _ = self.tx.send(PollEvent::Completed(result));
    }

    fn on_error(&self, message: &str) {
        let _ = self.tx.send(PollEvent::Failed(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;

    #[test]
    fn callbacks_become_events() {
        let (observer, mut rx) = ChannelObserver::channel();

        observer.observe(PollEvent::Update(JobStatusRecord::with_status(JobStatus::Running)));
        observer.on_complete(Some(serde_json::json!({"count": 10})));
        observer.on_error("boom");

        assert!(matches!(rx.try_recv(), Ok(PollEvent::Update(r)) if r.status == JobStatus::Running));
        assert_eq!(
            rx.try_recv().unwrap(),
            PollEvent::Completed(Some(serde_json::json!({"count": 10})))
        );
        let last = rx.try_recv().unwrap();
        assert!(last.is_terminal());
        assert_eq!(last, PollEvent::Failed("boom".to_string()));
    }
}
