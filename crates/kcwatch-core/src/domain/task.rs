use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConnectorName;

/// A task inside a connector: `(connector, task index)`.
///
/// Built by the failure detector and consumed by the restart dispatcher
/// within the same cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    connector: ConnectorName,
    task_id: i32,
}

impl TaskRef {
    pub fn new(connector: ConnectorName, task_id: i32) -> Self {
        Self { connector, task_id }
    }

    pub fn connector(&self) -> &ConnectorName {
        &self.connector
    }

    pub fn task_id(&self) -> i32 {
        self.task_id
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.connector, self.task_id)
    }
}
