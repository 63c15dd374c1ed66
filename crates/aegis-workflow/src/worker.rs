//! Background worker for continuous workflow operation

use crate::{WorkflowEngine, WorkflowError, WorkflowMetrics};
use aegis_domain::traits::ClaimStore;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Background worker that runs workflow cycles on a schedule
///
/// A cycle that overruns the interval delays the next one rather than
/// stacking cycles up.
///
/// # Examples
///
/// ```no_run
/// use aegis_workflow::{Providers, WorkflowConfig, WorkflowEngine, WorkflowWorker};
/// use aegis_policy::PolicyConfig;
/// use aegis_store::SqliteStore;
/// use std::sync::Arc;
///
/// # async fn example(providers: Providers) -> Result<(), Box<dyn std::error::Error>> {
/// let engine = WorkflowEngine::new(
///     SqliteStore::new("aegis.db")?,
///     providers,
///     WorkflowConfig::default(),
///     PolicyConfig::default(),
/// )?;
/// let worker = WorkflowWorker::new(Arc::new(engine));
///
/// // Run indefinitely (until Ctrl+C)
/// worker.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct WorkflowWorker<S> {
    engine: Arc<WorkflowEngine<S>>,
    interval: Duration,
}

impl<S> WorkflowWorker<S>
where
    S: ClaimStore + Send,
    S::Error: std::fmt::Display,
{
    /// Create a worker using the engine's configured cycle interval
    pub fn new(engine: Arc<WorkflowEngine<S>>) -> Self {
        let interval = engine.config().cycle_interval();
        Self { engine, interval }
    }

    /// The engine this worker drives
    pub fn engine(&self) -> &Arc<WorkflowEngine<S>> {
        &self.engine
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    ///
    /// Cycle failures are logged and the worker keeps going.
    pub async fn run(&self) -> Result<(), WorkflowError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run the worker until `shutdown` completes
    ///
    /// A cycle already in progress finishes before the worker stops.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), WorkflowError>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            "Workflow worker {} started (interval: {:?})",
            self.engine.owner(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting workflow cycle");
                    if let Err(e) = self.engine.run_cycle().await {
                        tracing::error!("Cycle failed: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping workflow worker");
                    break;
                }
            }
        }

        tracing::info!("Workflow worker stopped. Final metrics:\n{}", self.metrics().summary());
        Ok(())
    }

    /// Run for a specific number of cycles
    ///
    /// Stops at the first cycle that fails.
    pub async fn run_cycles(&self, cycles: usize) -> Result<(), WorkflowError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Workflow worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting workflow cycle {}/{}", cycle + 1, cycles);

            match self.engine.run_cycle().await {
                Ok(report) => {
                    tracing::info!(
                        "Cycle {}/{} completed: {} transitions, {} records{}",
                        cycle + 1,
                        cycles,
                        report.total_transitions(),
                        report.records(),
                        if report.timed_out { " (timed out)" } else { "" }
                    );
                }
                Err(e) => {
                    tracing::error!("Cycle {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Workflow worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.metrics().summary()
        );
        Ok(())
    }

    /// Snapshot of the engine's metrics
    pub fn metrics(&self) -> WorkflowMetrics {
        self.engine.metrics()
    }

    /// Reset the engine's metrics counters
    pub fn reset_metrics(&self) {
        self.engine.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NullNotifier, Providers, WorkflowConfig};
    use aegis_domain::{ClaimStatus, Verdict};
    use aegis_policy::PolicyConfig;
    use aegis_providers::{MockEvidence, MockExpert, MockScorer};
    use aegis_store::SqliteStore;
    use serde_json::json;

    fn worker() -> WorkflowWorker<SqliteStore> {
        let providers = Providers {
            suspicion: Arc::new(MockScorer::new(0.1)),
            credibility: Arc::new(MockScorer::new(0.9)),
            evidence: Arc::new(MockEvidence::default()),
            expert: Arc::new(MockExpert::new(Verdict::True, "fine")),
            notifier: Arc::new(NullNotifier),
        };
        let config = WorkflowConfig {
            cycle_interval_secs: 1,
            ..Default::default()
        };
        let engine = WorkflowEngine::new(
            SqliteStore::new(":memory:").unwrap(),
            providers,
            config,
            PolicyConfig::default(),
        )
        .unwrap();
        WorkflowWorker::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_run_cycles() {
        let worker = worker();
        let id = worker.engine().submit("benign post", json!({"handle": "@a"})).unwrap();

        worker.run_cycles(2).await.unwrap();

        assert_eq!(worker.metrics().cycle_count, 2);
        let claim = worker.engine().claim(id).unwrap().unwrap();
        assert_eq!(claim.status, ClaimStatus::Archived);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let worker = worker();
        worker.engine().submit("benign post", json!({})).unwrap();

        worker
            .run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        assert_eq!(worker.metrics().cycle_count, 1);
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let worker = worker();
        worker.run_cycles(1).await.unwrap();
        assert_eq!(worker.metrics().cycle_count, 1);

        worker.reset_metrics();
        assert_eq!(worker.metrics().cycle_count, 0);
    }
}
