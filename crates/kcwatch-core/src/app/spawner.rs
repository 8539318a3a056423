//! Spawner - fan-out されたワークの起動方針
//!
//! - `FireAndForget`: tokio::spawn して追跡しない（サイクルは重なり得る）
//! - `Tracked`: JoinSet で追跡し、shutdown 時に drain できる。
//!   `max_in_flight` があれば Semaphore で API への同時アクセス数を制限する
//!
//! どちらの方針でも `spawn()` 自体は待たない（poll loop の周期を崩さない）。

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::config::ConcurrencyPolicy;

/// Cloneable handle; clones share the same tracking set and limit.
#[derive(Clone)]
pub struct Spawner {
    inner: Arc<Inner>,
}

struct Inner {
    policy: ConcurrencyPolicy,
    limit: Option<Arc<Semaphore>>,
    tracked: Mutex<JoinSet<()>>,
}

impl Spawner {
    pub fn new(policy: ConcurrencyPolicy) -> Self {
        let limit = match policy {
            ConcurrencyPolicy::Tracked {
                max_in_flight: Some(n),
            } => Some(Arc::new(Semaphore::new(n.max(1)))),
            _ => None,
        };
        Self {
            inner: Arc::new(Inner {
                policy,
                limit,
                tracked: Mutex::new(JoinSet::new()),
            }),
        }
    }

    pub fn policy(&self) -> ConcurrencyPolicy {
        self.inner.policy
    }

    fn tracked(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.inner
            .tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Launch `unit` without waiting for it.
    pub fn spawn<F>(&self, unit: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.inner.policy {
            ConcurrencyPolicy::FireAndForget => {
                drop(tokio::spawn(unit));
            }
            ConcurrencyPolicy::Tracked { .. } => {
                let limit = self.inner.limit.clone();
                let unit = async move {
                    // permit は unit が終わるまで保持する
                    let _permit = match limit {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    unit.await;
                };

                let mut tracked = self.tracked();
                // 完了済みの結果を回収して JoinSet が肥大化しないようにする
                while tracked.try_join_next().is_some() {}
                tracked.spawn(unit);
            }
        }
    }

    /// Tracked units not yet reaped. Always 0 for `FireAndForget`.
    pub fn in_flight(&self) -> usize {
        let mut tracked = self.tracked();
        while tracked.try_join_next().is_some() {}
        tracked.len()
    }

    /// Wait for every tracked unit, including units spawned while draining.
    /// No-op for `FireAndForget`.
    pub async fn drain(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.tracked());
            if pending.is_empty() {
                break;
            }
            while let Some(joined) = pending.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "tracked unit did not finish cleanly");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn tracked_drain_waits_for_nested_units() {
        let spawner = Spawner::new(ConcurrencyPolicy::Tracked {
            max_in_flight: None,
        });
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let nested = spawner.clone();
            let done = Arc::clone(&done);
            spawner.spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                let done_inner = Arc::clone(&done);
                nested.spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    done_inner.fetch_add(1, Ordering::SeqCst);
                });
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        spawner.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 6);
        assert_eq!(spawner.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_policy_limits_concurrent_units() {
        let spawner = Spawner::new(ConcurrencyPolicy::Tracked {
            max_in_flight: Some(2),
        });
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            spawner.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            });
        }
        assert_eq!(spawner.in_flight(), 8);

        spawner.drain().await;
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fire_and_forget_is_not_tracked() {
        let spawner = Spawner::new(ConcurrencyPolicy::FireAndForget);
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        spawner.spawn(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(spawner.in_flight(), 0);
        spawner.drain().await;

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
