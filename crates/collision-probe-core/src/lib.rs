//! collision-probe-core: concurrent birthday-bound collision experiment.
//!
//! Generates pseudo-random feature vectors at high throughput, reduces each
//! to a truncated MD5 fingerprint, and detects whether any two distinct
//! vectors collide on their fingerprint.
//!
//! # Pipeline
//!
//! ```text
//! SeedSource -> seed queue -> FeatureWorker pool -> feature queue -> CollisionDetector
//!                                               \-> error channel -/
//! ```
//!
//! One seed producer, N independent workers (each owning a private set of
//! `ChaCha8Rng` generators refreshed periodically from the seed queue), and
//! one sequential consumer owning the fingerprint registry. Both queues are
//! bounded; blocking on a full feature queue is the backpressure mechanism
//! that bounds memory growth.
//!
//! The library never exits the process: a run resolves to a typed
//! [`RunOutcome`] the caller maps to an exit status.

pub mod config;
pub mod detector;
pub mod error;
pub mod feature;
pub mod fingerprint;
pub mod pipeline;
pub mod registry;
pub mod seed;
pub mod worker;

pub use config::ExperimentConfig;
pub use detector::{BatchKind, CollisionDetector, CollisionReport, ReportCadence, RunOutcome};
pub use error::{ProbeError, ProbeResult};
pub use feature::Feature;
pub use pipeline::Pipeline;
pub use registry::{FingerprintRegistry, InsertOutcome};
pub use seed::{EntropySource, OsEntropy, Seed, SeedSource};
pub use worker::FeatureWorker;
