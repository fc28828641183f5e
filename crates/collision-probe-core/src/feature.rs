//! Feature synthesis.
//!
//! Draws a fixed-length vector of uniform `f32` values from a worker's
//! generator set and serializes it little-endian, 4 bytes per value. The
//! serialization is deterministic so identical float sequences always hash
//! identically.
//!
//! Generator-selection policy: synthesis starts on generator 0; after every
//! 16th draw the active generator is switched to an index drawn from the
//! *current* generator, modulo the set size. This mixes entropy sources
//! without paying per-draw selection overhead.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::{Rng, RngCore};
use rand_chacha::ChaCha8Rng;

use crate::error::{ProbeError, ProbeResult};

/// Delivered unit: a fingerprint plus the optionally retained feature bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Truncated digest, the identity used for collision detection.
    pub fingerprint: String,
    /// Base64 encoding of the serialized feature vector, present only when
    /// payload retention is enabled.
    pub content: Option<String>,
}

impl Feature {
    /// Build a delivered unit, retaining the payload only when asked to.
    pub fn new(fingerprint: String, bytes: &[u8], retain_payload: bool) -> Self {
        Self {
            fingerprint,
            content: retain_payload.then(|| BASE64.encode(bytes)),
        }
    }
}

/// Serialize a float sequence to little-endian bytes, order preserved.
pub fn floats_to_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Synthesize one serialized feature vector from a generator set.
///
/// Draws `count` uniform values in [0, 1), switching the active generator
/// every `switch_interval` draws per the selection policy above. Fails with
/// [`ProbeError::EmptyGeneratorSet`] if `generators` is empty.
pub fn synthesize(
    generators: &mut [ChaCha8Rng],
    count: usize,
    switch_interval: usize,
) -> ProbeResult<Vec<u8>> {
    if generators.is_empty() {
        return Err(ProbeError::EmptyGeneratorSet);
    }

    let mut values = Vec::with_capacity(count);
    let mut active = 0usize;
    for idx in 0..count {
        values.push(generators[active].gen::<f32>());
        if idx % switch_interval == 0 {
            active = generators[active].next_u32() as usize % generators.len();
        }
    }

    Ok(floats_to_bytes(&values))
}
