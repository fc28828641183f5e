//! Feature worker pool.
//!
//! Each worker owns a private set of `ChaCha8Rng` generators, seeded from the
//! shared seed queue, and loops: synthesize a feature vector, reduce it to a
//! fingerprint, deliver the unit on the feature queue. The bounded feature
//! queue is the pipeline's backpressure point.
//!
//! Lifecycle per worker: uninitialized (draw K seeds) -> running -> reseeding
//! (counter hits the refresh interval, the full set is re-drawn) -> running.
//! Any synthesis or reduction error is fatal to the worker: it forwards the
//! error and exits, no retry. Workers share no mutable state with each other;
//! the seed receiver is the only shared handle, taken under a lock only while
//! drawing a generator set.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

use crate::config::ExperimentConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::feature::{self, Feature};
use crate::fingerprint;
use crate::seed::Seed;

/// Seed-queue receiver shared across the worker pool.
pub type SharedSeedReceiver = Arc<Mutex<mpsc::Receiver<Seed>>>;

/// One member of the feature/hash producer pool.
pub struct FeatureWorker {
    id: usize,
    config: ExperimentConfig,
    seed_rx: SharedSeedReceiver,
    feature_tx: mpsc::Sender<Feature>,
    error_tx: mpsc::Sender<ProbeError>,
}

impl FeatureWorker {
    pub fn new(
        id: usize,
        config: ExperimentConfig,
        seed_rx: SharedSeedReceiver,
        feature_tx: mpsc::Sender<Feature>,
        error_tx: mpsc::Sender<ProbeError>,
    ) -> Self {
        Self {
            id,
            config,
            seed_rx,
            feature_tx,
            error_tx,
        }
    }

    /// Run the worker until the consumer goes away or a failure is hit.
    pub async fn run(self) {
        info!(worker = self.id, "feature worker started");

        let mut generators: Vec<ChaCha8Rng> = Vec::new();
        let mut used: u64 = 0;

        loop {
            if generators.is_empty() {
                match self.draw_generator_set().await {
                    Ok(set) => generators = set,
                    Err(e) => {
                        self.fail(e).await;
                        return;
                    }
                }
            }

            let unit = match self.generate(&mut generators) {
                Ok(unit) => unit,
                Err(e) => {
                    self.fail(e).await;
                    return;
                }
            };

            if self.feature_tx.send(unit).await.is_err() {
                // Consumer has finished; the run is over.
                break;
            }

            used += 1;
            if used >= self.config.refresh_interval {
                // Force a reseed on the next iteration.
                used = 0;
                generators.clear();
            }
        }

        info!(worker = self.id, "feature worker exiting");
    }

    /// Block on the shared seed queue until a full generator set is built.
    async fn draw_generator_set(&self) -> ProbeResult<Vec<ChaCha8Rng>> {
        let mut set = Vec::with_capacity(self.config.generators_per_worker);
        let mut seed_rx = self.seed_rx.lock().await;
        for _ in 0..self.config.generators_per_worker {
            let seed = seed_rx.recv().await.ok_or(ProbeError::SeedsExhausted)?;
            set.push(ChaCha8Rng::seed_from_u64(seed as u64));
        }
        Ok(set)
    }

    /// One generation cycle: synthesize, reduce, wrap for delivery.
    fn generate(&self, generators: &mut [ChaCha8Rng]) -> ProbeResult<Feature> {
        let bytes = feature::synthesize(
            generators,
            self.config.floats_per_feature,
            self.config.generator_switch_interval,
        )?;
        let fp = fingerprint::reduce(&bytes, self.config.fingerprint_len)?;
        Ok(Feature::new(fp, &bytes, self.config.retain_payload))
    }

    /// Terminal failure path: forward the error and exit permanently.
    async fn fail(&self, err: ProbeError) {
        error!(worker = self.id, error = %err, "feature worker failed");
        let _ = self.error_tx.send(err).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            workers: 1,
            generators_per_worker: 2,
            floats_per_feature: 32,
            refresh_interval: 4,
            feature_queue_capacity: 8,
            ..Default::default()
        }
    }

    fn shared_seed_channel(capacity: usize) -> (mpsc::Sender<Seed>, SharedSeedReceiver) {
        let (seed_tx, seed_rx) = mpsc::channel(capacity);
        (seed_tx, Arc::new(Mutex::new(seed_rx)))
    }

    #[tokio::test]
    async fn test_worker_delivers_fingerprinted_features() {
        let config = small_config();
        let (seed_tx, seed_rx) = shared_seed_channel(16);
        let (feature_tx, mut feature_rx) = mpsc::channel(8);
        let (error_tx, _error_rx) = mpsc::channel(8);

        for seed in 0..8i64 {
            seed_tx.send(seed).await.unwrap();
        }

        let worker = FeatureWorker::new(1, config, seed_rx, feature_tx, error_tx);
        let handle = tokio::spawn(worker.run());

        for _ in 0..3 {
            let fea = feature_rx.recv().await.unwrap();
            assert_eq!(fea.fingerprint.len(), 18);
            assert!(fea.content.is_none());
        }

        // Dropping the consumer ends the worker loop.
        drop(feature_rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_reseeds_after_refresh_interval() {
        // refresh_interval = 4, K = 2: producing 5 features needs two
        // generator sets, so exactly 4 seeds must be consumed.
        let config = small_config();
        let (seed_tx, seed_rx) = shared_seed_channel(16);
        let (feature_tx, mut feature_rx) = mpsc::channel(2);
        let (error_tx, mut error_rx) = mpsc::channel(8);

        for seed in 0..4i64 {
            seed_tx.send(seed).await.unwrap();
        }
        drop(seed_tx);

        let worker = FeatureWorker::new(1, config, seed_rx, feature_tx, error_tx);
        let handle = tokio::spawn(worker.run());

        for _ in 0..5 {
            assert!(feature_rx.recv().await.is_some());
        }

        // A third set cannot be drawn: the seed queue is closed, so the
        // worker reports starvation and exits.
        for _ in 0..3 {
            assert!(feature_rx.recv().await.is_some());
        }
        assert!(feature_rx.recv().await.is_none());
        assert!(matches!(
            error_rx.recv().await,
            Some(ProbeError::SeedsExhausted)
        ));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_retains_payload_when_enabled() {
        let config = ExperimentConfig {
            retain_payload: true,
            ..small_config()
        };
        let floats = config.floats_per_feature;
        let (seed_tx, seed_rx) = shared_seed_channel(16);
        let (feature_tx, mut feature_rx) = mpsc::channel(8);
        let (error_tx, _error_rx) = mpsc::channel(8);

        for seed in 0..8i64 {
            seed_tx.send(seed).await.unwrap();
        }

        let worker = FeatureWorker::new(1, config, seed_rx, feature_tx, error_tx);
        let handle = tokio::spawn(worker.run());

        let fea = feature_rx.recv().await.unwrap();
        let payload = fea.content.expect("payload retention enabled");
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine;
        assert_eq!(BASE64.decode(payload).unwrap().len(), floats * 4);

        drop(feature_rx);
        handle.await.unwrap();
    }
}
