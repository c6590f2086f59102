//! Presentation ports - UI 側の境界
//!
//! `run_job_with_ui` はこの 3 つの trait だけを通して UI を操作します。

/// A control that triggers a job (a button in the admin console).
pub trait TriggerControl: Send + Sync {
    fn set_enabled(&self, enabled: bool);
    fn label(&self) -> String;
    fn set_label(&self, label: &str);
}

/// Visual state of a status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Inline text showing where a job stands.
pub trait StatusDisplay: Send + Sync {
    fn set_text(&self, text: &str);
    fn set_tone(&self, tone: StatusTone);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// Global toast notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NoticeKind);
}
