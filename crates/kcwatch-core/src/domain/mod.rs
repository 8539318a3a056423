//! Domain model: connector names, status snapshots, task references, and the
//! failure detection rule.

pub mod detector;
pub mod ids;
pub mod status;
pub mod task;

pub use self::detector::{
    DefaultFailureDetector, FailureDetector, candidates_or_empty, select_restart_candidates,
};
pub use self::ids::{ConnectorName, CycleId};
pub use self::status::{ConnectorState, ConnectorStatus, FAILED, RUNNING, TaskStatus};
pub use self::task::TaskRef;
