//! CycleReport - 1 サイクルの起動結果
//!
//! fan-out したワークの完了は待たないので、ここに載るのは
//! 「何件の connector を起動したか」までです。

use chrono::{DateTime, Utc};

use crate::domain::CycleId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// One unit of work was launched per listed connector.
    Launched { connectors: usize },
    /// Listing failed; nothing was launched this cycle.
    ListFailed,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    pub started_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub(crate) fn new(cycle_id: CycleId, started_at: DateTime<Utc>, outcome: CycleOutcome) -> Self {
        Self {
            cycle_id,
            started_at,
            outcome,
        }
    }

    /// Number of connectors launched, 0 when listing failed.
    pub fn connectors(&self) -> usize {
        match self.outcome {
            CycleOutcome::Launched { connectors } => connectors,
            CycleOutcome::ListFailed => 0,
        }
    }
}
