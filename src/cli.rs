//! Command line interface for the `streamer` soak driver.
//!
//! Every pipeline option can come from a TOML file (`--config`) and be
//! overridden individually on the command line. The remaining options shape
//! the synthetic workload.

use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, ValueEnum};

/// Overflow behaviour selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OverflowArg {
    /// Producers wait for queue space.
    Block,
    /// Completed events are dropped when the queue is full.
    Drop,
}

/// Duplicate-fragment behaviour selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DuplicateArg {
    /// Duplicates are reported to the producer.
    Reject,
    /// Duplicates are silently skipped.
    Ignore,
}

/// Command line arguments for the `streamer` binary.
#[derive(Debug, Parser)]
#[command(
    name = "streamer",
    version,
    about = "Soak test for concurrent fragment-to-event assembly"
)]
pub struct Cli {
    /// TOML file holding pipeline settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of producer threads.
    #[arg(short, long, default_value_t = 4)]
    pub producers: usize,

    /// Events emitted by each producer.
    #[arg(short, long, default_value_t = 1_000)]
    pub events: u64,

    /// Fragments per event.
    #[arg(short, long, default_value_t = 8)]
    pub fragments: u32,

    /// Payload bytes per fragment.
    #[arg(long, default_value_t = 64)]
    pub payload_size: usize,

    /// Abandon every Nth event after its first fragment (0 disables).
    #[arg(long, default_value_t = 0)]
    pub abandon_every: u64,

    /// Override the queue capacity.
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Override the staleness window in milliseconds.
    #[arg(long)]
    pub staleness_ms: Option<u64>,

    /// Override the overflow policy.
    #[arg(long, value_enum)]
    pub overflow: Option<OverflowArg>,

    /// Override the duplicate-fragment policy.
    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicateArg>,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, OverflowArg};

    #[test]
    fn parses_workload_and_overrides() {
        let cli = Cli::parse_from([
            "streamer",
            "--producers",
            "2",
            "--fragments",
            "3",
            "--overflow",
            "drop",
            "--staleness-ms",
            "50",
        ]);
        assert_eq!(cli.producers, 2);
        assert_eq!(cli.fragments, 3);
        assert_eq!(cli.events, 1_000);
        assert_eq!(cli.overflow, Some(OverflowArg::Drop));
        assert_eq!(cli.staleness_ms, Some(50));
        assert!(cli.duplicates.is_none());
    }
}
