//! Exit-code mapping.
//!
//! External tooling distinguishes the three terminal states by process exit
//! status: 0 = clean completion, 1 = invalid argument or pipeline failure,
//! 2 = collision found. A collision is the experiment's positive finding,
//! not an error, so it gets its own code.

use collision_probe_core::RunOutcome;

/// Process exit codes for the experiment driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum CliExitCode {
    /// Completed the full iteration count without a collision.
    Success = 0,
    /// Bad CLI argument, invalid configuration, or a starved pipeline.
    Failure = 1,
    /// A duplicate fingerprint was detected.
    CollisionFound = 2,
}

/// Map a run's verdict to its exit code.
pub fn exit_code_for_outcome(outcome: &RunOutcome) -> CliExitCode {
    match outcome {
        RunOutcome::Completed { .. } => CliExitCode::Success,
        RunOutcome::CollisionFound(_) => CliExitCode::CollisionFound,
        RunOutcome::ChannelsClosed { .. } => CliExitCode::Failure,
    }
}
