//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてジョブ監視のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **JobPoller**: ジョブの開始とハンドルごとのポーリングタスク
//! - **PollRegistry**: アクティブなポーリングの台帳
//! - **run_job_with_ui**: トリガー・ステータス表示・トーストへの結び付け

pub mod poller;
pub mod registry;
pub mod ui;

// 主要な型を再エクスポート
pub use self::poller::{JOB_FAILED, JobPoller};
pub use self::registry::{PollEntry, PollRegistry};
pub use self::ui::{DEFAULT_SUCCESS_MESSAGE, UiJob, run_job_with_ui};
