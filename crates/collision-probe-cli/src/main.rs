//! collision-probe: truncated-MD5 birthday collision experiment driver.
//!
//! Runs the concurrent generation-and-detection pipeline for a fixed number
//! of iterations and maps the verdict to an exit status:
//!
//! - 0: completed without collision
//! - 1: invalid argument or pipeline failure
//! - 2: collision detected
//!
//! Progress, compaction statistics, and the collision diagnostic are emitted
//! through `tracing` on stderr; the banner, iteration echo, and final verdict
//! go to stdout.

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use collision_probe_core::{ExperimentConfig, Pipeline, RunOutcome};

mod exit;

use exit::{exit_code_for_outcome, CliExitCode};

/// Probe birthday-bound collision behavior of truncated MD5 fingerprints.
#[derive(Parser, Debug)]
#[command(name = "collision-probe")]
#[command(version = "0.1.0")]
#[command(about = "Concurrent birthday-bound collision probe over truncated MD5 fingerprints")]
struct Cli {
    /// Number of experiment iterations. Defaults to 2,000,000.
    times: Option<u64>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // try_parse so a non-integer TIMES maps to exit 1; clap's default exit
    // code of 2 is reserved for a found collision.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            std::process::exit(CliExitCode::Success as i32);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(CliExitCode::Failure as i32);
        }
    };

    init_tracing(cli.verbose);

    let config = ExperimentConfig::default();
    let times = cli.times.unwrap_or(config.default_times);

    println!("usage: collision-probe [times]");
    println!("experiment times: {times}");

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(CliExitCode::Failure as i32);
        }
    };

    let outcome = pipeline.run(times).await;
    let code = exit_code_for_outcome(&outcome);

    match &outcome {
        RunOutcome::Completed { iterations } => {
            println!("all done for {iterations}");
        }
        RunOutcome::CollisionFound(report) => {
            println!(
                "index #{} - got conflict: {}, saved feature: {}, exact same: {}",
                report.index, report.fingerprint, report.payload_retained, report.exact_match
            );
            if report.payload_retained && !report.exact_match {
                if let (Some(first), Some(second)) = (&report.first, &report.second) {
                    println!("1st: {first}");
                    println!("2nd: {second}");
                }
            }
            match serde_json::to_string(report) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("failed to serialize collision report: {err}"),
            }
        }
        RunOutcome::ChannelsClosed { delivered } => {
            eprintln!("pipeline stalled after {delivered} deliveries");
        }
    }

    std::process::exit(code as i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_iteration_count() {
        let cli = Cli::try_parse_from(["collision-probe", "5"]).unwrap();
        assert_eq!(cli.times, Some(5));
    }

    #[test]
    fn test_defaults_when_omitted() {
        let cli = Cli::try_parse_from(["collision-probe"]).unwrap();
        assert!(cli.times.is_none());
    }

    #[test]
    fn test_rejects_non_integer_times() {
        let err = Cli::try_parse_from(["collision-probe", "abc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
