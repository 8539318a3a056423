//! InMemoryConnectApi - 開発・テスト用の ConnectApi
//!
//! # 学習ポイント
//! - 応答をスクリプトできる（成功 / 失敗）
//! - restart 呼び出しと status 取得を記録する
//! - latency を入れると同時実行数（最大値）を観測できる
//!
//! ロックは await を跨がない（std::sync::Mutex で十分）

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ConnectorName, ConnectorStatus, TaskRef};
use crate::error::ApiError;
use crate::ports::ConnectApi;

/// A scripted failure. Network errors need a live transport, so the closest
/// in-memory equivalents are offered instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    Status(u16),
    Read(String),
    Timeout,
}

impl ScriptedFailure {
    fn to_error(&self, url: String) -> ApiError {
        match self {
            ScriptedFailure::Status(status) => ApiError::Status {
                url,
                status: *status,
            },
            ScriptedFailure::Read(message) => ApiError::Read {
                url,
                message: message.clone(),
            },
            ScriptedFailure::Timeout => ApiError::Timeout { url, timeout_ms: 0 },
        }
    }
}

#[derive(Default)]
struct State {
    connectors: Vec<ConnectorName>,
    list_failure: Option<ScriptedFailure>,
    statuses: HashMap<ConnectorName, Result<ConnectorStatus, ScriptedFailure>>,
    restart_failures: HashSet<TaskRef>,

    list_calls: usize,
    status_requests: Vec<ConnectorName>,
    restarts: Vec<TaskRef>,

    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Default)]
pub struct InMemoryConnectApi {
    state: Mutex<State>,
    latency: Duration,
}

impl InMemoryConnectApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_connectors<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.lock();
        state.connectors = names.into_iter().map(ConnectorName::new).collect();
        state.list_failure = None;
    }

    pub fn fail_list(&self, failure: ScriptedFailure) {
        self.lock().list_failure = Some(failure);
    }

    pub fn set_status(&self, connector: &str, status: ConnectorStatus) {
        self.lock()
            .statuses
            .insert(ConnectorName::new(connector), Ok(status));
    }

    pub fn fail_status(&self, connector: &str, failure: ScriptedFailure) {
        self.lock()
            .statuses
            .insert(ConnectorName::new(connector), Err(failure));
    }

    pub fn fail_restart(&self, task: TaskRef) {
        self.lock().restart_failures.insert(task);
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Connectors whose status was requested, in request order.
    pub fn status_requests(&self) -> Vec<ConnectorName> {
        self.lock().status_requests.clone()
    }

    /// Restart attempts, in dispatch order, failed ones included.
    pub fn restarts(&self) -> Vec<TaskRef> {
        self.lock().restarts.clone()
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.lock().max_in_flight
    }

    async fn enter(&self) {
        {
            let mut state = self.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn leave(&self, state: &mut State) {
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

#[async_trait]
impl ConnectApi for InMemoryConnectApi {
    async fn list_connectors(&self) -> Result<Vec<ConnectorName>, ApiError> {
        self.enter().await;
        let mut state = self.lock();
        self.leave(&mut state);
        state.list_calls += 1;
        match &state.list_failure {
            Some(failure) => Err(failure.to_error("memory:///connectors".to_string())),
            None => Ok(state.connectors.clone()),
        }
    }

    async fn connector_status(
        &self,
        connector: &ConnectorName,
    ) -> Result<ConnectorStatus, ApiError> {
        self.enter().await;
        let mut state = self.lock();
        self.leave(&mut state);
        state.status_requests.push(connector.clone());
        let url = format!("memory:///connectors/{connector}/status");
        match state.statuses.get(connector) {
            Some(Ok(status)) => Ok(status.clone()),
            Some(Err(failure)) => Err(failure.to_error(url)),
            None => Err(ApiError::Status { url, status: 404 }),
        }
    }

    async fn restart_task(&self, task: &TaskRef) -> Result<(), ApiError> {
        self.enter().await;
        let mut state = self.lock();
        self.leave(&mut state);
        state.restarts.push(task.clone());
        if state.restart_failures.contains(task) {
            return Err(ApiError::Status {
                url: format!(
                    "memory:///connectors/{}/tasks/{}/restart",
                    task.connector(),
                    task.task_id()
                ),
                status: 500,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;

    #[tokio::test]
    async fn answers_with_scripted_connectors_and_statuses() {
        let api = InMemoryConnectApi::new();
        api.set_connectors(["c1", "c2"]);
        api.set_status("c1", ConnectorStatus::new("RUNNING", vec![TaskStatus::new(0, "FAILED")]));

        let names = api.list_connectors().await.unwrap();
        assert_eq!(names, vec![ConnectorName::new("c1"), ConnectorName::new("c2")]);

        let status = api.connector_status(&ConnectorName::new("c1")).await.unwrap();
        assert!(status.is_running());

        let missing = api.connector_status(&ConnectorName::new("c2")).await.unwrap_err();
        assert!(matches!(missing, ApiError::Status { status: 404, .. }));

        assert_eq!(api.list_calls(), 1);
        assert_eq!(
            api.status_requests(),
            vec![ConnectorName::new("c1"), ConnectorName::new("c2")]
        );
    }

    #[tokio::test]
    async fn scripted_failures_surface_as_api_errors() {
        let api = InMemoryConnectApi::new();
        api.fail_list(ScriptedFailure::Read("connection reset".to_string()));
        api.fail_status("c1", ScriptedFailure::Timeout);
        let task = TaskRef::new(ConnectorName::new("c1"), 2);
        api.fail_restart(task.clone());

        assert!(matches!(
            api.list_connectors().await,
            Err(ApiError::Read { .. })
        ));
        assert!(matches!(
            api.connector_status(&ConnectorName::new("c1")).await,
            Err(ApiError::Timeout { .. })
        ));
        assert!(api.restart_task(&task).await.is_err());
        assert_eq!(api.restarts(), vec![task]);
    }
}
