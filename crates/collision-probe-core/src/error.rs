//! Error types for collision-probe-core.
//!
//! Defines the central [`ProbeError`] type used throughout the pipeline, along
//! with the [`ProbeResult<T>`] alias. Every failure here is terminal to its
//! originating unit of work: the seed source and workers forward their own
//! errors on the error channel and exit, while the detector logs received
//! errors and keeps draining.

use thiserror::Error;

/// Top-level error type for pipeline operations.
///
/// There is no retry logic anywhere in the core; each variant marks the end of
/// the stage that produced it.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Experiment configuration failed validation.
    ///
    /// Raised before any pipeline stage starts. Zero worker counts, empty
    /// generator sets, or queue capacities of zero all land here.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feature synthesis was asked to draw from an empty generator set.
    #[error("got no random source")]
    EmptyGeneratorSet,

    /// The rendered digest was shorter than the fingerprint truncation length.
    ///
    /// A defensive check against a misconfigured digest function. An MD5
    /// render is always 32 hex characters, so seeing this indicates a logic
    /// defect, not a transient condition.
    #[error("incomplete hash: {digest:?}, length: {length}")]
    IncompleteHash {
        /// The digest string as rendered.
        digest: String,
        /// Its length, necessarily below the truncation length.
        length: usize,
    },

    /// The platform entropy source failed.
    ///
    /// Fatal to the seed stage: workers will eventually starve once the seed
    /// queue drains, so this ends the run.
    #[error("entropy source failure: {0}")]
    EntropyFailure(String),

    /// The seed queue closed while a worker was building its generator set.
    ///
    /// Means the seed source has already terminated. The worker forwards this
    /// and exits rather than blocking forever on a queue that can never be
    /// refilled.
    #[error("seed queue closed: seed source has terminated")]
    SeedsExhausted,

    /// A pipeline channel closed out from under a stage.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),
}

/// Result type alias for pipeline operations.
pub type ProbeResult<T> = Result<T, ProbeError>;
