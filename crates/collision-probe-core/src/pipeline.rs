//! Pipeline assembly.
//!
//! Wires the stages together: one seed source, a pool of feature workers
//! fanning in to the bounded feature queue, and the collision detector as
//! sole consumer. The error channel runs alongside the feature queue as a
//! secondary fan-in path.
//!
//! There is no cancellation: a run either drains its full iteration count or
//! ends early on a collision or a starved pipeline. Producers still in
//! flight are dropped with the runtime when the process exits.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::info;

use crate::config::ExperimentConfig;
use crate::detector::{CollisionDetector, ReportCadence, RunOutcome};
use crate::error::ProbeResult;
use crate::seed::{EntropySource, OsEntropy, SeedSource};
use crate::worker::FeatureWorker;

/// The assembled experiment pipeline.
pub struct Pipeline {
    config: ExperimentConfig,
}

impl Pipeline {
    /// Validate the configuration and build a pipeline.
    pub fn new(config: ExperimentConfig) -> ProbeResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run the experiment for `times` iterations with platform entropy.
    pub async fn run(&self, times: u64) -> RunOutcome {
        self.run_with_entropy(times, OsEntropy).await
    }

    /// Run with an injected entropy source.
    ///
    /// The seam tests use to starve the pipeline at the seed stage.
    pub async fn run_with_entropy<E>(&self, times: u64, entropy: E) -> RunOutcome
    where
        E: EntropySource + 'static,
    {
        let (seed_tx, seed_rx) = mpsc::channel(self.config.seed_queue_capacity());
        let (feature_tx, feature_rx) = mpsc::channel(self.config.feature_queue_capacity);
        // One slot per producer so a dying stage never blocks on its own
        // error report.
        let (error_tx, error_rx) = mpsc::channel(self.config.workers + 1);

        info!(
            times,
            workers = self.config.workers,
            generators_per_worker = self.config.generators_per_worker,
            "starting collision experiment"
        );

        tokio::spawn(SeedSource::new(entropy).run(seed_tx, error_tx.clone()));

        let seed_rx = Arc::new(Mutex::new(seed_rx));
        for id in 1..=self.config.workers {
            let worker = FeatureWorker::new(
                id,
                self.config.clone(),
                Arc::clone(&seed_rx),
                feature_tx.clone(),
                error_tx.clone(),
            );
            tokio::spawn(worker.run());
        }
        // The detector must observe closure once every producer is gone.
        drop(feature_tx);
        drop(error_tx);

        let cadence = ReportCadence::new(times, &self.config);
        CollisionDetector::new(feature_rx, error_rx, cadence, self.config.retain_payload)
            .run(times)
            .await
    }
}
