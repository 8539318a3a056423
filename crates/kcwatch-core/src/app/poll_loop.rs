//! PollLoop - list → detect → restart を一定間隔で繰り返す
//!
//! # フロー（1 サイクル）
//! 1. ConnectApi::list_connectors() で connector 一覧を取得
//!    （失敗したらログを出してこのサイクルはスキップ）
//! 2. connector ごとに独立したワークを起動: status 取得 → 検出 → task ごとに restart を起動
//! 3. 起動したワークの完了は待たない
//! 4. interval だけ sleep して 1 に戻る
//!
//! # 重複 restart について
//! サイクル N の restart がまだ in-flight のうちにサイクル N+1 が同じ
//! FAILED task を検出すると、restart がもう一度発行されます。
//! 履歴を持たないのでこれは抑止しません。

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{Instrument, debug, debug_span, error, info, info_span, warn};

use super::report::{CycleOutcome, CycleReport};
use super::spawner::Spawner;
use crate::config::WatchdogConfig;
use crate::domain::{
    ConnectorName, CycleId, DefaultFailureDetector, FailureDetector, TaskRef, candidates_or_empty,
};
use crate::error::{ApiError, WatchdogError};
use crate::ports::ConnectApi;

pub struct PollLoop {
    api: Arc<dyn ConnectApi>,
    detector: Arc<dyn FailureDetector>,
    config: WatchdogConfig,
    spawner: Spawner,
}

impl PollLoop {
    pub fn new(api: Arc<dyn ConnectApi>, config: WatchdogConfig) -> Self {
        let spawner = Spawner::new(config.concurrency);
        Self {
            api,
            detector: Arc::new(DefaultFailureDetector),
            config,
            spawner,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn FailureDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Run cycles until `shutdown` turns true (or its sender is dropped),
    /// then drain tracked work.
    ///
    /// The only error is `WatchdogError::Fatal`, returned right away without
    /// draining.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), WatchdogError> {
        info!(
            base_url = %self.config.base_url,
            interval_secs = self.config.interval.as_secs(),
            policy = ?self.config.concurrency,
            "watchdog started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle().await?;

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(in_flight = self.spawner.in_flight(), "shutting down, draining tracked work");
        self.drain().await;
        Ok(())
    }

    /// One cycle: list connectors and launch one unit of work per connector.
    /// Returns as soon as everything is launched.
    pub async fn run_cycle(&self) -> Result<CycleReport, WatchdogError> {
        let cycle_id = CycleId::generate();
        let started_at = Utc::now();
        let span = info_span!("poll_cycle", cycle_id = %cycle_id);

        let outcome = async {
            let connectors = match self.api.list_connectors().await {
                Ok(connectors) => connectors,
                Err(e @ ApiError::Read { .. }) if self.config.fail_fast_on_list_read => {
                    error!(error = %e, "reading connector list failed");
                    return Err(WatchdogError::Fatal(e));
                }
                Err(e) => {
                    warn!(error = %e, "listing connectors failed, skipping cycle");
                    return Ok(CycleOutcome::ListFailed);
                }
            };

            for connector in &connectors {
                self.launch_connector(connector.clone());
            }
            info!(connectors = connectors.len(), "connector checks launched");
            Ok(CycleOutcome::Launched {
                connectors: connectors.len(),
            })
        }
        .instrument(span)
        .await?;

        Ok(CycleReport::new(cycle_id, started_at, outcome))
    }

    /// Wait for tracked work. No-op under `FireAndForget`.
    pub async fn drain(&self) {
        self.spawner.drain().await;
    }

    fn launch_connector(&self, connector: ConnectorName) {
        let api = Arc::clone(&self.api);
        let detector = Arc::clone(&self.detector);
        let spawner = self.spawner.clone();
        let span = debug_span!("connector", connector = %connector);

        self.spawner.spawn(
            async move {
                let candidates = check_connector(api.as_ref(), detector.as_ref(), &connector).await;
                for task in candidates {
                    launch_restart(&spawner, Arc::clone(&api), task);
                }
            }
            .instrument(span),
        );
    }
}

/// Fetch one connector's status and select its restart candidates.
///
/// A failed fetch is logged and yields no candidates.
pub async fn check_connector(
    api: &dyn ConnectApi,
    detector: &dyn FailureDetector,
    connector: &ConnectorName,
) -> Vec<TaskRef> {
    debug!(%connector, "checking connector");
    let status = match api.connector_status(connector).await {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(%connector, error = %e, "fetching connector status failed");
            None
        }
    };
    candidates_or_empty(detector, connector, status.as_ref())
}

fn launch_restart(spawner: &Spawner, api: Arc<dyn ConnectApi>, task: TaskRef) {
    let span = debug_span!("restart", task = %task);
    spawner.spawn(
        async move {
            restart(api.as_ref(), &task).await;
        }
        .instrument(span),
    );
}

/// Issue one restart. Failures are logged and go no further.
pub async fn restart(api: &dyn ConnectApi, task: &TaskRef) {
    info!(connector = %task.connector(), task_id = task.task_id(), "restarting failed task");
    if let Err(e) = api.restart_task(task).await {
        warn!(
            connector = %task.connector(),
            task_id = task.task_id(),
            error = %e,
            "restart request failed"
        );
    }
}
