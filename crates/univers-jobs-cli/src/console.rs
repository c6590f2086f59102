//! Console presentation - presentation ports の端末実装
//!
//! トリガーはラベルだけを保持し、ステータスは変化した行だけを stderr に出す。
//! 通知は stderr に出したうえで `run` に終了種別を渡す。

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;
use univers_jobs_core::ports::{NoticeKind, Notifier, StatusDisplay, StatusTone, TriggerControl};

/// Stand-in for a button: there is nothing to click in a terminal.
pub struct ConsoleTrigger {
    label: Mutex<String>,
}

impl ConsoleTrigger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Mutex::new(label.into()),
        }
    }
}

impl TriggerControl for ConsoleTrigger {
    fn set_enabled(&self, enabled: bool) {
        debug!(enabled, "trigger");
    }

    fn label(&self) -> String {
        self.label.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn set_label(&self, label: &str) {
        *self.label.lock().unwrap_or_else(|p| p.into_inner()) = label.to_string();
    }
}

/// Prints the status line whenever its text changes.
#[derive(Default)]
pub struct ConsoleStatus {
    last: Mutex<String>,
}

impl StatusDisplay for ConsoleStatus {
    fn set_text(&self, text: &str) {
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        if *last != text {
            eprintln!("{text}");
            *last = text.to_string();
        }
    }

    // the emoji prefix already shows the tone on screen
    fn set_tone(&self, tone: StatusTone) {
        debug!(?tone, "status tone");
    }
}

pub struct ConsoleNotifier {
    tx: mpsc::UnboundedSender<NoticeKind>,
}

impl ConsoleNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NoticeKind>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        match kind {
            NoticeKind::Success => eprintln!("[ok] {message}"),
            NoticeKind::Error => eprintln!("[error] {message}"),
            NoticeKind::Info => eprintln!("[info] {message}"),
        }
        let _ = self.tx.send(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_keeps_label() {
        let trigger = ConsoleTrigger::new("run");
        assert_eq!(trigger.label(), "run");
        trigger.set_enabled(false);
        trigger.set_label("⏳ Starting...");
        assert_eq!(trigger.label(), "⏳ Starting...");
    }

    #[test]
    fn notifier_forwards_kind() {
        let (notifier, mut rx) = ConsoleNotifier::channel();
        notifier.notify("done", NoticeKind::Success);
        notifier.notify("boom", NoticeKind::Error);
        assert_eq!(rx.try_recv().unwrap(), NoticeKind::Success);
        assert_eq!(rx.try_recv().unwrap(), NoticeKind::Error);
    }
}
