//! Experiment configuration.
//!
//! All pipeline constants live here: pool sizes, queue capacities, reseeding
//! and reporting cadences. Defaults reproduce the reference experiment
//! (32 workers, 8 generators each, 2M iterations).

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, ProbeResult};

/// Seed-queue depth reserved per generator instance.
///
/// The seed queue holds `workers * generators_per_worker` seeds many times
/// over so that mass reseeding never stalls the pool on the seed stage.
const SEED_QUEUE_DEPTH_PER_GENERATOR: usize = 256;

/// Configuration for the collision experiment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of feature workers in the pool.
    pub workers: usize,

    /// Pseudo-random generators owned by each worker.
    pub generators_per_worker: usize,

    /// Number of `f32` values drawn per feature vector.
    pub floats_per_feature: usize,

    /// Draws between pseudo-random switches of the active generator.
    pub generator_switch_interval: usize,

    /// Characters kept from the rendered digest. Must not exceed the
    /// 32-character MD5 hex render.
    pub fingerprint_len: usize,

    /// Generations after which a worker re-draws its full generator set.
    pub refresh_interval: u64,

    /// Bounded capacity of the feature delivery queue. This is the system's
    /// backpressure point: producers block here when the detector lags.
    pub feature_queue_capacity: usize,

    /// Smallest throughput-report batch. The effective batch is tuned up to
    /// `times / 1000` for long runs.
    pub min_report_batch: u64,

    /// Iterations between registry compaction passes.
    pub compaction_batch: u64,

    /// Iteration count used when the CLI omits one.
    pub default_times: u64,

    /// Retain the base64-encoded feature bytes alongside each fingerprint.
    /// Costs memory proportional to the registry; off by default.
    pub retain_payload: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            workers: 32,
            generators_per_worker: 8,
            floats_per_feature: 256,
            generator_switch_interval: 16,
            fingerprint_len: 18,
            refresh_interval: 10_000,
            feature_queue_capacity: 100_000,
            min_report_batch: 200_000,
            compaction_batch: 1_000_000,
            default_times: 2_000_000,
            retain_payload: false,
        }
    }
}

impl ExperimentConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.workers == 0 {
            return Err(ProbeError::Config("workers must be >= 1".to_string()));
        }
        if self.generators_per_worker == 0 {
            return Err(ProbeError::Config(
                "generators_per_worker must be >= 1".to_string(),
            ));
        }
        if self.floats_per_feature == 0 {
            return Err(ProbeError::Config(
                "floats_per_feature must be >= 1".to_string(),
            ));
        }
        if self.generator_switch_interval == 0 {
            return Err(ProbeError::Config(
                "generator_switch_interval must be >= 1".to_string(),
            ));
        }
        if self.fingerprint_len == 0 || self.fingerprint_len > 32 {
            return Err(ProbeError::Config(format!(
                "fingerprint_len must be in 1..=32, got {}",
                self.fingerprint_len
            )));
        }
        if self.refresh_interval == 0 {
            return Err(ProbeError::Config(
                "refresh_interval must be >= 1".to_string(),
            ));
        }
        if self.feature_queue_capacity == 0 {
            return Err(ProbeError::Config(
                "feature_queue_capacity must be >= 1".to_string(),
            ));
        }
        if self.min_report_batch == 0 || self.compaction_batch == 0 {
            return Err(ProbeError::Config(
                "report batches must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Bounded capacity of the seed queue.
    pub fn seed_queue_capacity(&self) -> usize {
        self.workers * self.generators_per_worker * SEED_QUEUE_DEPTH_PER_GENERATOR
    }

    /// Effective throughput-report batch for a run of `times` iterations.
    ///
    /// Scales with run length so long runs report roughly 1000 times, but
    /// never drops below [`min_report_batch`](Self::min_report_batch).
    pub fn report_batch(&self, times: u64) -> u64 {
        (times / 1000).max(self.min_report_batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ Defaults ============

    #[test]
    fn test_default_values() {
        let config = ExperimentConfig::default();
        assert_eq!(config.workers, 32);
        assert_eq!(config.generators_per_worker, 8);
        assert_eq!(config.floats_per_feature, 256);
        assert_eq!(config.fingerprint_len, 18);
        assert_eq!(config.default_times, 2_000_000);
        assert!(!config.retain_payload);
    }

    #[test]
    fn test_default_validates() {
        assert!(ExperimentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_seed_queue_capacity() {
        let config = ExperimentConfig::default();
        assert_eq!(config.seed_queue_capacity(), 32 * 8 * 256);
    }

    // ============ Validation ============

    #[test]
    fn test_rejects_zero_workers() {
        let config = ExperimentConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProbeError::Config(_))));
    }

    #[test]
    fn test_rejects_oversized_fingerprint() {
        let config = ExperimentConfig {
            fingerprint_len: 33,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    // ============ Report batch tuning ============

    #[test]
    fn test_report_batch_floors_at_minimum() {
        let config = ExperimentConfig::default();
        assert_eq!(config.report_batch(2_000_000), 200_000);
        assert_eq!(config.report_batch(0), 200_000);
    }

    #[test]
    fn test_report_batch_scales_with_long_runs() {
        let config = ExperimentConfig::default();
        assert_eq!(config.report_batch(1_000_000_000), 1_000_000);
    }
}
