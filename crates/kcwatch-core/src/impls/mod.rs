//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpConnectApi**: 管理 REST API への HTTP クライアント（本番用）
//! - **InMemoryConnectApi**: スクリプト可能な開発・テスト用実装

pub mod http_api;
pub mod inmem_api;

pub use self::http_api::HttpConnectApi;
pub use self::inmem_api::{InMemoryConnectApi, ScriptedFailure};
