//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpJobApi**: REST バックエンド（reqwest）
//! - **ScriptedJobApi**: 台本どおりに応答する開発用バックエンド
//! - **ChannelObserver**: コールバックを mpsc チャネルに変換

pub mod channel_observer;
pub mod http_api;
pub mod scripted_api;

pub use self::channel_observer::ChannelObserver;
pub use self::http_api::HttpJobApi;
pub use self::scripted_api::{ScriptedJobApi, ScriptedStatus};
