//! Seed generation stage.
//!
//! A single producer drawing 64-bit seeds from the platform entropy source
//! and publishing them to the bounded seed queue. `i64::MIN` is excluded so
//! later arithmetic never sees the one value with no positive counterpart.
//!
//! Entropy failure is fatal to this stage: the error is forwarded on the
//! error channel and the loop exits permanently. Workers starve once the
//! queue drains, so this ends the run (see the worker's starvation path).

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::{ProbeError, ProbeResult};

/// A pseudo-random generator seed. Full signed range except `i64::MIN`.
pub type Seed = i64;

/// Fallible source of raw entropy bytes.
///
/// The production impl is [`OsEntropy`]; tests inject failing or scripted
/// sources to exercise the fatal path.
pub trait EntropySource: Send {
    /// Fill `dest` with entropy, or report why the platform could not.
    fn fill(&mut self, dest: &mut [u8]) -> ProbeResult<()>;
}

/// Platform entropy via the operating system RNG.
#[derive(Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> ProbeResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| ProbeError::EntropyFailure(e.to_string()))
    }
}

/// The seed-producing stage.
pub struct SeedSource<E> {
    entropy: E,
}

impl<E: EntropySource> SeedSource<E> {
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    /// Draw the next seed, redrawing on the excluded minimum value.
    pub fn next_seed(&mut self) -> ProbeResult<Seed> {
        loop {
            let mut buf = [0u8; 8];
            self.entropy.fill(&mut buf)?;
            let seed = i64::from_le_bytes(buf);
            if seed != i64::MIN {
                return Ok(seed);
            }
        }
    }

    /// Run the stage: publish seeds until the queue closes or entropy fails.
    pub async fn run(mut self, seed_tx: mpsc::Sender<Seed>, error_tx: mpsc::Sender<ProbeError>) {
        info!("seed source started");
        loop {
            match self.next_seed() {
                Ok(seed) => {
                    if seed_tx.send(seed).await.is_err() {
                        // All workers are gone; nothing left to seed.
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "seed source failed, terminating stage");
                    let _ = error_tx.send(e).await;
                    break;
                }
            }
        }
        info!("seed source stopped");
    }
}
