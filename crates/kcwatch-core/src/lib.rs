//! kcwatch-core
//!
//! Kafka Connect 互換の管理 REST API を定期的にポーリングし、
//! RUNNING な connector の FAILED task を restart する watchdog のコア。
//!
//! # モジュール構成
//! - **domain**: ConnectorName, ConnectorStatus, TaskRef, 検出ルール
//! - **ports**: ConnectApi（管理 API の抽象）
//! - **impls**: HttpConnectApi（reqwest）, InMemoryConnectApi（テスト用）
//! - **app**: PollLoop, Spawner
//! - **config**: WatchdogConfig, host の正規化
//! - **error**: ApiError, WatchdogError

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use self::app::{CycleOutcome, CycleReport, PollLoop};
pub use self::config::{ConcurrencyPolicy, RequestPolicy, WatchdogConfig, normalize_host};
pub use self::error::{ApiError, WatchdogError};
