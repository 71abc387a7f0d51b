//! Throughput benchmark: push a fixed byte volume through the machine by
//! repeating whole-buffer cycles over one state.

use std::fmt;
use std::time::{Duration, Instant};

use crate::cycle::run_one;
use crate::error::{ConfigError, DriverError};
use crate::machine::{Input, Machine};
use crate::trace::Trace;

const MIB: f64 = 1024.0 * 1024.0;

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&mut self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now(&mut self) -> Duration {
        (**self).now()
    }
}

/// Measurements of a completed benchmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchReport {
    pub iterations: u64,
    pub total_bytes: u64,
    pub elapsed: Duration,
}

impl BenchReport {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.total_bytes as f64 / self.elapsed_secs()
    }

    pub fn ops_per_sec(&self) -> f64 {
        self.iterations as f64 / self.elapsed_secs()
    }
}

/// `<MiB> mb | <MiB/s> mb/s | <ops> ops/sec | <secs> s`
impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} mb | {:.2} mb/s | {:.2} ops/sec | {:.2} s",
            self.total_bytes as f64 / MIB,
            self.bytes_per_sec() / MIB,
            self.ops_per_sec(),
            self.elapsed_secs()
        )
    }
}

/// How a benchmark ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BenchOutcome {
    Completed(BenchReport),
    /// A cycle returned a parser error; nothing was reported.
    Aborted { code: i32, iteration: u64 },
}

impl BenchOutcome {
    /// 0, or the parser error code that aborted the run.
    pub fn code(&self) -> i32 {
        match self {
            Self::Completed(_) => 0,
            Self::Aborted { code, .. } => *code,
        }
    }
}

/// Run `target_bytes / buf.len()` cycles over `buf` and report throughput
/// on the primary stream.
pub fn run<M: Machine + ?Sized, C: Clock + ?Sized>(
    machine: &mut M,
    buf: &[u8],
    target_bytes: u64,
    clock: &mut C,
    trace: &mut Trace<'_>,
) -> Result<BenchOutcome, DriverError> {
    if buf.is_empty() {
        return Err(ConfigError::EmptyInput.into());
    }
    let len = buf.len() as u64;
    let iterations = target_bytes / len;
    log::debug!("bench: {} iterations of {} bytes", iterations, len);

    let input = Input::new(buf);
    let start = clock.now();
    for iteration in 0..iterations {
        let code = run_one(machine, input, trace)?;
        if code != 0 {
            return Ok(BenchOutcome::Aborted { code, iteration });
        }
    }
    let end = clock.now();

    machine.finish(trace);

    let report = BenchReport {
        iterations,
        total_bytes: iterations * len,
        elapsed: end.saturating_sub(start),
    };
    trace.report(format_args!("{}", report));
    Ok(BenchOutcome::Completed(report))
}
