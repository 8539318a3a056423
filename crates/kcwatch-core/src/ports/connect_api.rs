//! ConnectApi port - 管理 REST API の抽象化
//!
//! # 実装
//! - `HttpConnectApi`: reqwest による本番実装
//! - `InMemoryConnectApi`: テスト・開発用（応答をスクリプトし、restart を記録）

use async_trait::async_trait;

use crate::domain::{ConnectorName, ConnectorStatus, TaskRef};
use crate::error::ApiError;

/// ConnectApi は connector 一覧・状態取得と task の restart を提供
///
/// # 設計原則
/// - 呼び出しごとに独立（キャッシュしない、前回との差分を取らない）
/// - エラーは返すだけ。ログと回復は呼び出し側（PollLoop）の責務
#[async_trait]
pub trait ConnectApi: Send + Sync {
    /// `GET {base}/connectors`
    async fn list_connectors(&self) -> Result<Vec<ConnectorName>, ApiError>;

    /// `GET {base}/connectors/{name}/status`
    async fn connector_status(&self, connector: &ConnectorName)
    -> Result<ConnectorStatus, ApiError>;

    /// `POST {base}/connectors/{name}/tasks/{id}/restart` with an empty body.
    async fn restart_task(&self, task: &TaskRef) -> Result<(), ApiError>;
}
