//! Failure detection: which tasks of a connector need a restart.
//!
//! This module defines the pure selection rule and the `FailureDetector` trait
//! that lets the poll loop swap it out.

use super::{ConnectorName, ConnectorStatus, TaskRef};

/// Trait for choosing restart candidates from a status snapshot.
///
/// Detectors are pure functions: given the same snapshot they return the same
/// candidates, with no I/O and no memory of earlier cycles.
pub trait FailureDetector: Send + Sync {
    fn detect(&self, connector: &ConnectorName, status: &ConnectorStatus) -> Vec<TaskRef>;
}

/// Restarts `FAILED` tasks of `RUNNING` connectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFailureDetector;

impl FailureDetector for DefaultFailureDetector {
    fn detect(&self, connector: &ConnectorName, status: &ConnectorStatus) -> Vec<TaskRef> {
        select_restart_candidates(connector, status)
    }
}

/// Every `FAILED` task, in input order, provided the connector is `RUNNING`.
///
/// A failed task under a connector that is not running is never selected.
pub fn select_restart_candidates(
    connector: &ConnectorName,
    status: &ConnectorStatus,
) -> Vec<TaskRef> {
    if !status.is_running() {
        return Vec::new();
    }
    status
        .tasks
        .iter()
        .filter(|task| task.is_failed())
        .map(|task| TaskRef::new(connector.clone(), task.id))
        .collect()
}

/// Same as [`FailureDetector::detect`], but a missing snapshot yields nothing.
pub fn candidates_or_empty(
    detector: &dyn FailureDetector,
    connector: &ConnectorName,
    status: Option<&ConnectorStatus>,
) -> Vec<TaskRef> {
    match status {
        Some(status) => detector.detect(connector, status),
        None => Vec::new(),
    }
}
