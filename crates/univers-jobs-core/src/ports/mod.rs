//! Ports - 抽象化レイヤー
//!
//! 外部（REST バックエンド、UI）へのインターフェースを trait として定義し、
//! 実装の詳細を隠蔽します。

pub mod job_api;
pub mod observer;
pub mod presentation;

pub use self::job_api::{JobApi, JobParams};
pub use self::observer::{JobObserver, NoopObserver};
pub use self::presentation::{NoticeKind, Notifier, StatusDisplay, StatusTone, TriggerControl};
