//! Status - `GET /connectors/{name}/status` のレスポンス
//!
//! 状態文字列は open-ended（RUNNING, PAUSED, FAILED, UNASSIGNED, ...）なので
//! enum にはせず String のまま保持します。意味を持つのは
//! connector の `RUNNING` と task の `FAILED` だけです。
//!
//! 欠けているフィールドは空（state = "", tasks = []）として decode します。

use serde::{Deserialize, Serialize};

/// Connector state that makes its failed tasks worth restarting.
pub const RUNNING: &str = "RUNNING";

/// Task state that marks a task as a restart candidate.
pub const FAILED: &str = "FAILED";

/// Snapshot of a connector and its tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStatus {
    #[serde(default)]
    pub connector: ConnectorState,
    #[serde(default)]
    pub tasks: Vec<TaskStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorState {
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub state: String,
}

impl ConnectorStatus {
    pub fn new(connector_state: impl Into<String>, tasks: Vec<TaskStatus>) -> Self {
        Self {
            connector: ConnectorState {
                state: connector_state.into(),
            },
            tasks,
        }
    }

    pub fn is_running(&self) -> bool {
        self.connector.state == RUNNING
    }
}

impl TaskStatus {
    pub fn new(id: i32, state: impl Into<String>) -> Self {
        Self {
            id,
            state: state.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == FAILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_status_document() {
        let body = r#"{
            "name": "c1",
            "connector": {"state": "RUNNING", "worker_id": "10.0.0.1:8083"},
            "tasks": [
                {"id": 0, "state": "RUNNING", "worker_id": "10.0.0.1:8083"},
                {"id": 1, "state": "FAILED", "trace": "boom"}
            ],
            "type": "sink"
        }"#;
        let status: ConnectorStatus = serde_json::from_str(body).unwrap();

        assert!(status.is_running());
        assert_eq!(
            status.tasks,
            vec![TaskStatus::new(0, "RUNNING"), TaskStatus::new(1, "FAILED")]
        );
    }

    #[test]
    fn missing_fields_decode_to_empty_defaults() {
        let status: ConnectorStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status, ConnectorStatus::default());
        assert!(!status.is_running());
        assert!(status.tasks.is_empty());
    }

    #[test]
    fn state_comparison_is_exact() {
        assert!(!ConnectorStatus::new("running", vec![]).is_running());
        assert!(!TaskStatus::new(0, "failed").is_failed());
    }
}
