//! Soak driver for the `streamer` pipeline.
//!
//! Spawns producer threads that emit fragmented events in scrambled order,
//! reads the assembled events back through [`FragmentInput`], and logs a
//! summary of the pipeline counters on exit.

mod cli;

use std::{error::Error, thread};

use bytes::Bytes;
use clap::Parser;
use streamer::{
    DuplicatePolicy,
    EventAssembler,
    EventId,
    Fragment,
    FragmentIndex,
    OverflowPolicy,
    Streamer,
    StreamerConfig,
};
use tracing::{info, warn};

use crate::cli::{Cli, DuplicateArg, OverflowArg};

fn main() -> Result<(), Box<dyn Error>> {
    // Enable structured logging for the soak run.
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    install_metrics_exporter(&cli)?;

    let config = build_config(&cli)?;
    let streamer = Streamer::new(config)?;

    let workload = Workload::from(&cli);
    let consumer = thread::spawn({
        let mut input = streamer.input();
        let expected = workload.fragments as usize;
        move || {
            let mut short = 0_u64;
            for event in input.by_ref() {
                if event.fragment_count() != expected {
                    short += 1;
                }
            }
            (input.delivered(), short)
        }
    });

    let producers: Vec<_> = (0..u64::try_from(cli.producers)?)
        .map(|producer| {
            let assembler = streamer.assembler();
            thread::spawn(move || workload.run(producer, &assembler))
        })
        .collect();
    for handle in producers {
        if handle.join().is_err() {
            warn!("producer thread panicked");
        }
    }

    let discarded = streamer.shutdown();
    let (delivered, short) = consumer
        .join()
        .map_err(|_| "consumer thread panicked")?;
    let stats = streamer.stats();
    info!(
        delivered,
        short,
        discarded_at_shutdown = discarded.len(),
        fragments_accepted = stats.fragments_accepted,
        events_completed = stats.events_completed,
        events_extracted = stats.events_extracted,
        events_discarded = stats.events_discarded,
        events_dropped = stats.events_dropped,
        duplicate_fragments = stats.duplicate_fragments,
        malformed_fragments = stats.malformed_fragments,
        late_fragments = stats.late_fragments,
        "soak run finished"
    );
    Ok(())
}

fn build_config(cli: &Cli) -> Result<StreamerConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => StreamerConfig::load(path)?,
        None => StreamerConfig::default(),
    };
    if let Some(capacity) = cli.capacity {
        config.queue_capacity = capacity;
    }
    if let Some(staleness_ms) = cli.staleness_ms {
        config.staleness_window_ms = staleness_ms;
    }
    if let Some(overflow) = cli.overflow {
        config.overflow_policy = match overflow {
            OverflowArg::Block => OverflowPolicy::Block,
            OverflowArg::Drop => OverflowPolicy::Drop,
        };
    }
    if let Some(duplicates) = cli.duplicates {
        config.duplicate_policy = match duplicates {
            DuplicateArg::Reject => DuplicatePolicy::Reject,
            DuplicateArg::Ignore => DuplicatePolicy::Ignore,
        };
    }
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(addr) = cli.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "serving Prometheus metrics");
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics_exporter(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if cli.metrics_addr.is_some() {
        warn!("built without the `metrics` feature; --metrics-addr ignored");
    }
    Ok(())
}

/// Synthetic load emitted by one producer thread.
#[derive(Clone, Copy, Debug)]
struct Workload {
    events: u64,
    fragments: u32,
    payload_size: usize,
    abandon_every: u64,
}

impl From<&Cli> for Workload {
    fn from(cli: &Cli) -> Self {
        Self {
            events: cli.events,
            fragments: cli.fragments.max(1),
            payload_size: cli.payload_size,
            abandon_every: cli.abandon_every,
        }
    }
}

impl Workload {
    fn run(self, producer: u64, assembler: &EventAssembler) {
        for n in 0..self.events {
            let event_id = EventId::new(producer * self.events + n);
            let abandoned = self.abandon_every != 0 && (n + 1) % self.abandon_every == 0;
            for index in self.arrival_order(n) {
                let payload = Bytes::from(vec![index.to_le_bytes()[0]; self.payload_size]);
                let fragment =
                    Fragment::new(event_id, FragmentIndex::new(index), self.fragments, payload);
                if let Err(err) = assembler.insert_blocking(fragment) {
                    warn!(%event_id, error = %err, "fragment rejected");
                    return;
                }
                if abandoned {
                    break;
                }
            }
        }
    }

    /// Fragment indices rotated by the event number, reversed on odd events.
    fn arrival_order(&self, n: u64) -> Vec<u32> {
        let count = self.fragments;
        let offset = u32::try_from(n % u64::from(count)).unwrap_or_default();
        let mut order: Vec<u32> = (0..count).map(|i| (i + offset) % count).collect();
        if n % 2 == 1 {
            order.reverse();
        }
        order
    }
}
