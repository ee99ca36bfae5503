//! Races every draining strategy against the same kind of workload.
//!
//! Source `i` of `n` finishes after `(n - i)` steps, so the sources complete in
//! reverse submission order.
//!
//! ```text
//! FANIN_SOURCES=5000 FANIN_STEP_MICROS=50 RUST_LOG=info cargo run --release --example race
//! ```

use std::env;
use std::fmt;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use easy_parallel::Parallel;
use futures::StreamExt;
use smol::{channel, Executor, Timer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use easy_fanin::strategy::channel::fan_in;
use easy_fanin::strategy::{any_of_remaining, sequential};
use easy_fanin::{block_on, promise, Multiplexer, Promise};

const DEFAULT_SOURCES: usize = 2_000;
const MIN_SOURCES: usize = 1;
const MAX_SOURCES: usize = 1_000_000;
const ENV_SOURCES: &str = "FANIN_SOURCES";

const DEFAULT_STEP_MICROS: u64 = 100;
const MAX_STEP_MICROS: u64 = 1_000_000;
const ENV_STEP_MICROS: &str = "FANIN_STEP_MICROS";

#[derive(Debug, Clone, Copy)]
struct Config {
    sources: usize,
    step: Duration,
}

impl Config {
    fn from_env() -> Self {
        let sources = match env::var(ENV_SOURCES) {
            Ok(s) => s.parse().unwrap_or(DEFAULT_SOURCES),
            Err(_) => DEFAULT_SOURCES,
        };
        let step = match env::var(ENV_STEP_MICROS) {
            Ok(s) => s.parse().unwrap_or(DEFAULT_STEP_MICROS),
            Err(_) => DEFAULT_STEP_MICROS,
        };

        let config = Self {
            sources: sources.clamp(MIN_SOURCES, MAX_SOURCES),
            step: Duration::from_micros(step.min(MAX_STEP_MICROS)),
        };
        if config.sources != sources {
            warn!(requested = sources, used = config.sources, "source count out of range");
        }
        config
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Multiplexer,
    Channel,
    AnyOfRemaining,
    Sequential,
}

impl Strategy {
    const ALL: [Strategy; 4] = [
        Strategy::Multiplexer,
        Strategy::Channel,
        Strategy::AnyOfRemaining,
        Strategy::Sequential,
    ];

    /// Drains every source, returns how many values came out.
    fn drain(self, pending: Vec<Promise<usize>>) -> usize {
        match self {
            Strategy::Multiplexer => Multiplexer::from_pending(pending).blocking().count(),
            Strategy::Channel => block_on(fan_in(pending).count()),
            Strategy::AnyOfRemaining => block_on(any_of_remaining(pending).count()),
            Strategy::Sequential => block_on(sequential(pending).count()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Strategy::Multiplexer => "multiplexer",
            Strategy::Channel => "channel",
            Strategy::AnyOfRemaining => "any-of-remaining",
            Strategy::Sequential => "sequential",
        })
    }
}

/// Starts `config.sources` timers on `ex` and returns their pending results.
fn workload(ex: &Executor<'_>, config: Config) -> Vec<Promise<usize>> {
    let n = config.sources;
    (0..n)
        .map(|i| {
            let (resolver, pending) = promise();
            let delay = config.step * (n - i) as u32;
            ex.spawn(async move {
                Timer::after(delay).await;
                resolver.resolve(i);
            })
            .detach();
            pending
        })
        .collect()
}

fn race(ex: &Executor<'_>, config: Config) {
    let workloads: Vec<_> = Strategy::ALL
        .into_iter()
        .map(|strategy| (strategy, workload(ex, config)))
        .collect();
    let start = Instant::now();
    let (done, results) = mpsc::channel();

    thread::scope(|s| {
        for (strategy, pending) in workloads {
            let done = done.clone();
            s.spawn(move || {
                let drained = strategy.drain(pending);
                _ = done.send((strategy, drained, start.elapsed()));
            });
        }
        drop(done);

        for (strategy, drained, elapsed) in results {
            info!(%strategy, drained, ?elapsed, "strategy finished");
        }
    });
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let workers = num_cpus::get();
    info!(sources = config.sources, step = ?config.step, workers, "starting race");

    let ex = Executor::new();
    let (signal, shutdown) = channel::unbounded::<()>();

    Parallel::new()
        .each(0..workers, |_| smol::block_on(ex.run(shutdown.recv())))
        .finish(|| {
            race(&ex, config);
            drop(signal);
        });
}
