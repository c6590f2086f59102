//! run_job_with_ui - ジョブの開始・監視を UI に結び付けるヘルパー
//!
//! # UI の契約
//! - 開始前: トリガーを無効化し「開始中」を表示
//! - 開始失敗: トリガーを元に戻し、失敗表示 + トースト、エラーを呼び出し元へ返す
//! - 進捗: トリガーと表示に progress（なければ status）を出す
//! - 完了 / 失敗: トリガーを元のラベルで有効化し、結果表示 + トースト
//!
//! どの失敗経路でもトリガーは必ず有効に戻る（UI が「実行中」で固まらない）。

use std::sync::{Arc, Mutex};

use super::poller::JobPoller;
use crate::domain::{JobError, JobHandle, JobStatusRecord};
use crate::ports::{
    JobObserver, JobParams, NoticeKind, Notifier, StatusDisplay, StatusTone, TriggerControl,
};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Completed!";

const STARTING: &str = "⏳ Starting...";
const STATUS_STARTING: &str = "⏳ Starting job...";

/// Caller callback receiving the job's result payload.
pub type CompletionCallback = Box<dyn FnOnce(Option<serde_json::Value>) + Send>;

/// A job to run with UI feedback.
///
/// # 使用例
/// ```ignore
/// let job = UiJob::new("/generate/ocean/images")
///     .param("theme", "ocean")
///     .trigger(button)
///     .status_display(status)
///     .success_message("Images generated")
///     .on_complete(|result| println!("{result:?}"));
/// let handle = run_job_with_ui(&poller, notifier, job).await?;
/// ```
pub struct UiJob {
    endpoint: String,
    params: JobParams,
    trigger: Option<Arc<dyn TriggerControl>>,
    status: Option<Arc<dyn StatusDisplay>>,
    success_message: String,
    on_complete: Option<CompletionCallback>,
}

impl UiJob {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: JobParams::new(),
            trigger: None,
            status: None,
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            on_complete: None,
        }
    }

    pub fn params(mut self, params: JobParams) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn trigger(mut self, trigger: Arc<dyn TriggerControl>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn status_display(mut self, status: Arc<dyn StatusDisplay>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    pub fn on_complete(
        mut self,
        callback: impl FnOnce(Option<serde_json::Value>) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

/// The presentation references of one job, plus the trigger's original label.
struct UiBindings {
    trigger: Option<Arc<dyn TriggerControl>>,
    original_label: Option<String>,
    status: Option<Arc<dyn StatusDisplay>>,
    notifier: Arc<dyn Notifier>,
}

impl UiBindings {
    fn show(&self, text: &str, tone: StatusTone) {
        if let Some(status) = &self.status {
            status.set_text(text);
            status.set_tone(tone);
        }
    }

    fn starting(&self) {
        if let Some(trigger) = &self.trigger {
            trigger.set_enabled(false);
            trigger.set_label(STARTING);
        }
        self.show(STATUS_STARTING, StatusTone::Pending);
    }

    fn progress(&self, record: &JobStatusRecord) {
        let text = format!("⏳ {}...", record.label());
        if let Some(trigger) = &self.trigger {
            trigger.set_label(&text);
        }
        self.show(&text, StatusTone::Running);
    }

    fn restore_trigger(&self) {
        if let Some(trigger) = &self.trigger {
            trigger.set_enabled(true);
            if let Some(label) = &self.original_label {
                trigger.set_label(label);
            }
        }
    }

    fn start_failed(&self, error: &JobError) {
        self.restore_trigger();
        self.show(&format!("❌ {error}"), StatusTone::Failed);
        self.notifier
            .notify(&format!("Failed to start: {error}"), NoticeKind::Error);
    }
}

struct UiObserver {
    bindings: UiBindings,
    success_message: String,
    on_complete: Mutex<Option<CompletionCallback>>,
}

impl JobObserver for UiObserver {
    fn on_update(&self, record: &JobStatusRecord) {
        self.bindings.progress(record);
    }

    fn on_complete(&self, result: Option<serde_json::Value>) {
        self.bindings.restore_trigger();
        self.bindings
            .show(&format!("✅ {}", self.success_message), StatusTone::Completed);
        self.bindings
            .notifier
            .notify(&self.success_message, NoticeKind::Success);

        let callback = self
            .on_complete
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(callback) = callback {
            callback(result);
        }
    }

    fn on_error(&self, message: &str) {
        self.bindings.restore_trigger();
        self.bindings.show(&format!("❌ {message}"), StatusTone::Failed);
        self.bindings
            .notifier
            .notify(&format!("Error: {message}"), NoticeKind::Error);
    }
}

/// Start `job` and keep its trigger, status display and toasts in sync
/// until it finishes.
///
/// Returns once the job is accepted; a start failure is surfaced in the UI
/// and returned.
pub async fn run_job_with_ui(
    poller: &JobPoller,
    notifier: Arc<dyn Notifier>,
    job: UiJob,
) -> Result<JobHandle, JobError> {
    let UiJob {
        endpoint,
        params,
        trigger,
        status,
        success_message,
        on_complete,
    } = job;

    let bindings = UiBindings {
        original_label: trigger.as_ref().map(|t| t.label()),
        trigger,
        status,
        notifier,
    };
    bindings.starting();

    let handle = match poller.start_job(&endpoint, params).await {
        Ok(handle) => handle,
        Err(err) => {
            bindings.start_failed(&err);
            return Err(err);
        }
    };

    let observer = UiObserver {
        bindings,
        success_message,
        on_complete: Mutex::new(on_complete),
    };
    Ok(poller.poll_job(handle, Arc::new(observer)))
}
