//! univers-jobs-core
//!
//! Client-side building blocks for long-running backend jobs.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, events, errors）
//! - **ports**: 抽象化レイヤー（JobApi, JobObserver, presentation）
//! - **app**: アプリケーションロジック（poller, registry, ui）
//! - **impls**: 実装（HttpJobApi、開発用の ScriptedJobApi など）
//! - **config**: 環境変数からの設定
//! - **observability**: tracing の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use self::app::{JobPoller, UiJob, run_job_with_ui};
pub use self::config::{ApiConfig, Config, ConfigError, PollConfig};
pub use self::domain::{JobError, JobHandle, JobStatus, JobStatusRecord, PollEvent};
pub use self::observability::{LoggerConfig, LoggerFormat, logger_init};
