//! Collision detection.
//!
//! The single sequential consumer. Drains the feature queue and the error
//! channel exactly `times` times, owns the fingerprint registry outright
//! (no locking anywhere), and raises the run's verdict as a typed
//! [`RunOutcome`] instead of exiting the process from library code.
//!
//! The select between the two channels is deliberately unprioritized: when a
//! delivery and an error are both ready, either may win. Worker errors are
//! logged and skipped; a duplicate fingerprint ends the run immediately with
//! full diagnostic context, since a collision is the experiment's positive
//! finding and no further iterations are meaningful.

use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::ExperimentConfig;
use crate::error::ProbeError;
use crate::feature::Feature;
use crate::registry::{FingerprintRegistry, InsertOutcome};

/// Diagnostic context for a detected collision.
#[derive(Debug, Clone, Serialize)]
pub struct CollisionReport {
    /// 1-based iteration index at which the duplicate arrived.
    pub index: u64,
    /// The colliding fingerprint.
    pub fingerprint: String,
    /// Whether full feature payloads were retained this run.
    pub payload_retained: bool,
    /// Whether the stored payload matched the new one exactly.
    pub exact_match: bool,
    /// Payload of the first occurrence, when retained.
    pub first: Option<String>,
    /// Payload of the colliding occurrence, when retained.
    pub second: Option<String>,
}

/// Terminal verdict of a run, mapped to an exit code by the CLI.
#[derive(Debug)]
pub enum RunOutcome {
    /// All iterations drained without a duplicate fingerprint.
    Completed { iterations: u64 },
    /// Two distinct generation cycles produced the same fingerprint.
    CollisionFound(CollisionReport),
    /// Every producer terminated before `times` deliveries arrived.
    /// Replaces the indefinite stall a starved consumer would otherwise
    /// exhibit with an observable, typed outcome.
    ChannelsClosed { delivered: u64 },
}

/// Which periodic report fires at a given iteration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Registry compaction plus footprint statistics.
    Compaction,
    /// Throughput line: percent done, index, last fingerprint, rate.
    Throughput,
}

/// Pure cadence schedule for the detector's periodic reporting.
///
/// Compaction boundaries take precedence where the two cadences coincide.
#[derive(Debug, Clone, Copy)]
pub struct ReportCadence {
    report_batch: u64,
    compaction_batch: u64,
}

impl ReportCadence {
    pub fn new(times: u64, config: &ExperimentConfig) -> Self {
        Self {
            report_batch: config.report_batch(times),
            compaction_batch: config.compaction_batch,
        }
    }

    /// Report batch in effect for this run.
    pub fn report_batch(&self) -> u64 {
        self.report_batch
    }

    /// The report due at 1-based index `idx`, if any.
    pub fn kind(&self, idx: u64) -> Option<BatchKind> {
        if idx == 0 {
            None
        } else if idx % self.compaction_batch == 0 {
            Some(BatchKind::Compaction)
        } else if idx % self.report_batch == 0 {
            Some(BatchKind::Throughput)
        } else {
            None
        }
    }
}

/// A unit drained from one of the two fan-in channels.
enum Delivery {
    Feature(Feature),
    Error(ProbeError),
}

/// The sole consumer and sole owner of the fingerprint registry.
pub struct CollisionDetector {
    registry: FingerprintRegistry,
    feature_rx: mpsc::Receiver<Feature>,
    error_rx: mpsc::Receiver<ProbeError>,
    cadence: ReportCadence,
    retain_payload: bool,
    feature_open: bool,
    error_open: bool,
}

impl CollisionDetector {
    pub fn new(
        feature_rx: mpsc::Receiver<Feature>,
        error_rx: mpsc::Receiver<ProbeError>,
        cadence: ReportCadence,
        retain_payload: bool,
    ) -> Self {
        Self {
            registry: FingerprintRegistry::new(),
            feature_rx,
            error_rx,
            cadence,
            retain_payload,
            feature_open: true,
            error_open: true,
        }
    }

    /// Drain exactly `times` deliveries, returning the run's verdict.
    pub async fn run(mut self, times: u64) -> RunOutcome {
        let mut last_fingerprint = String::new();
        let mut window_start = Instant::now();

        for idx in 1..=times {
            let delivery = match self.next_delivery().await {
                Some(delivery) => delivery,
                None => {
                    warn!(
                        delivered = idx - 1,
                        times, "all pipeline channels closed before completion"
                    );
                    return RunOutcome::ChannelsClosed { delivered: idx - 1 };
                }
            };

            let fea = match delivery {
                Delivery::Feature(fea) => fea,
                Delivery::Error(e) => {
                    warn!(index = idx, error = %e, "worker error, skipping iteration");
                    continue;
                }
            };

            last_fingerprint.clone_from(&fea.fingerprint);
            if let InsertOutcome::Collision { existing, exact } =
                self.registry.insert(fea.fingerprint, fea.content.clone())
            {
                let report = CollisionReport {
                    index: idx,
                    fingerprint: last_fingerprint,
                    payload_retained: self.retain_payload,
                    exact_match: exact,
                    first: existing,
                    second: fea.content,
                };
                error!(
                    index = report.index,
                    fingerprint = %report.fingerprint,
                    exact_match = report.exact_match,
                    payload_retained = report.payload_retained,
                    "fingerprint collision detected"
                );
                return RunOutcome::CollisionFound(report);
            }

            match self.cadence.kind(idx) {
                Some(BatchKind::Compaction) => {
                    let stats = self.registry.compact();
                    info!(
                        done_pct = percent(idx, times),
                        index = idx,
                        entries = stats.entries,
                        capacity_before = stats.capacity_before,
                        capacity_after = stats.capacity_after,
                        approx_mib_before = mib(stats.approx_bytes_before),
                        approx_mib_after = mib(stats.approx_bytes_after),
                        "registry compaction"
                    );
                }
                Some(BatchKind::Throughput) => {
                    let elapsed = window_start.elapsed().as_secs_f64();
                    let rate = self.cadence.report_batch() as f64 / elapsed.max(f64::EPSILON);
                    info!(
                        done_pct = percent(idx, times),
                        index = idx,
                        fingerprint = %last_fingerprint,
                        per_sec = rate,
                        "progress"
                    );
                    window_start = Instant::now();
                }
                None => {}
            }
        }

        info!(
            times,
            fingerprints = self.registry.len(),
            "experiment completed without collision"
        );
        RunOutcome::Completed { iterations: times }
    }

    /// First-ready unit from either channel, with no priority between them.
    ///
    /// Returns `None` only once both channels are closed and drained.
    async fn next_delivery(&mut self) -> Option<Delivery> {
        loop {
            match (self.feature_open, self.error_open) {
                (true, true) => {
                    tokio::select! {
                        fea = self.feature_rx.recv() => match fea {
                            Some(fea) => return Some(Delivery::Feature(fea)),
                            None => self.feature_open = false,
                        },
                        err = self.error_rx.recv() => match err {
                            Some(err) => return Some(Delivery::Error(err)),
                            None => self.error_open = false,
                        },
                    }
                }
                (true, false) => match self.feature_rx.recv().await {
                    Some(fea) => return Some(Delivery::Feature(fea)),
                    None => self.feature_open = false,
                },
                (false, true) => match self.error_rx.recv().await {
                    Some(err) => return Some(Delivery::Error(err)),
                    None => self.error_open = false,
                },
                (false, false) => return None,
            }
        }
    }
}

fn percent(idx: u64, times: u64) -> f64 {
    if times == 0 {
        100.0
    } else {
        idx as f64 / times as f64 * 100.0
    }
}

fn mib(bytes: usize) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
