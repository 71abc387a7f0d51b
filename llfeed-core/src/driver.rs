//! Mode selection and process exit status.
//!
//! ```text
//! llfeed <from>:<to> <input>   scan sweep, chunk sizes from..to
//! llfeed bench <input>         throughput benchmark
//! llfeed loop <input>          feed forever (soak)
//! llfeed -                     feed stdin line by line
//! ```

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::bench::{self, Clock, MonotonicClock};
use crate::config::RunConfig;
use crate::error::{ConfigError, DriverError, UsageError, FAILURE_STATUS};
use crate::feed::{self, FragmentationPlan};
use crate::machine::Machine;
use crate::trace::{Quiet, Trace};

/// What a mode specification asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Bench,
    Loop,
    /// Fixed-size chunk runs for every chunk size in `from..to`.
    Scan { from: u32, to: u32 },
}

impl FromStr for Mode {
    type Err = UsageError;

    fn from_str(spec: &str) -> Result<Self, UsageError> {
        match spec {
            "bench" => return Ok(Self::Bench),
            "loop" => return Ok(Self::Loop),
            _ => {}
        }
        let (from, to) = spec
            .split_once(':')
            .ok_or_else(|| UsageError::MissingColon(spec.to_string()))?;
        Ok(Self::Scan { from: scan_bound(spec, from)?, to: scan_bound(spec, to)? })
    }
}

/// Digits only; an empty bound counts as 0.
fn scan_bound(spec: &str, digits: &str) -> Result<u32, UsageError> {
    digits.bytes().try_fold(0u32, |acc, ch| {
        if !ch.is_ascii_digit() {
            return Err(UsageError::InvalidDigit(spec.to_string()));
        }
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u32::from(ch - b'0')))
            .filter(|&n| n <= i32::MAX as u32)
            .ok_or_else(|| UsageError::Overflow(spec.to_string()))
    })
}

/// Runs one mode against a machine factory and turns the result into an
/// exit status.
pub struct Driver<'w, C = MonotonicClock> {
    trace: Trace<'w>,
    config: RunConfig,
    clock: C,
}

impl<'w> Driver<'w> {
    pub fn new(out: &'w mut dyn Write, err: &'w mut dyn Write, config: RunConfig) -> Self {
        Self::with_clock(out, err, config, MonotonicClock::new())
    }
}

impl<'w, C: Clock> Driver<'w, C> {
    pub fn with_clock(
        out: &'w mut dyn Write,
        err: &'w mut dyn Write,
        config: RunConfig,
        clock: C,
    ) -> Self {
        Self { trace: Trace::new(out, err), config, clock }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run `spec` over `input`, creating machines with `init`.
    ///
    /// Returns 0, the parser's error code (`bench`, `loop`), or -1.
    pub fn run<M, F>(&mut self, exec: &str, spec: &str, input: &[u8], init: F) -> i32
    where
        M: Machine,
        F: FnMut() -> M,
    {
        let result = self.try_run(spec, input, init);
        self.trace.set_quiet(Quiet::Off);
        self.finish(exec, result)
    }

    /// Like [`run`](Self::run), with failures returned instead of reported.
    pub fn try_run<M, F>(&mut self, spec: &str, input: &[u8], mut init: F) -> Result<i32, DriverError>
    where
        M: Machine,
        F: FnMut() -> M,
    {
        let mode: Mode = spec.parse()?;
        log::debug!("mode {:?} over {} bytes", mode, input.len());

        match mode {
            Mode::Bench | Mode::Loop if input.is_empty() => Err(ConfigError::EmptyInput.into()),
            Mode::Bench => {
                self.trace.set_quiet(self.config.quiet);
                let mut machine = init();
                let outcome = bench::run(
                    &mut machine,
                    input,
                    self.config.bench_bytes,
                    &mut self.clock,
                    &mut self.trace,
                )?;
                Ok(outcome.code())
            }
            Mode::Loop => {
                self.trace.set_quiet(self.config.quiet);
                let mut machine = init();
                Ok(feed::repeat(&mut machine, input, self.config.loop_limit, &mut self.trace)?)
            }
            Mode::Scan { from, to } => self.sweep(from, to, input, init),
        }
    }

    /// Fixed-size chunk runs for each chunk size in `from..to`, each with a
    /// fresh machine.
    fn sweep<M, F>(&mut self, from: u32, to: u32, input: &[u8], mut init: F) -> Result<i32, DriverError>
    where
        M: Machine,
        F: FnMut() -> M,
    {
        let mut rejected = 0;
        for scan in from..to {
            self.trace.banner(scan);
            let plan = match FragmentationPlan::fixed(input.len(), scan as usize) {
                Ok(plan) => plan,
                Err(err) => {
                    self.trace.warn(format_args!("{}", err));
                    log::warn!("scan {} rejected: {}", scan, err);
                    rejected += 1;
                    continue;
                }
            };

            let mut machine = init();
            let code = feed::fragmented(&mut machine, input, &plan, &mut self.trace)?;
            log::debug!("scan {} finished with code {}", scan, code);
        }

        Ok(if rejected == 0 { 0 } else { FAILURE_STATUS })
    }

    /// Feed newline-terminated records from `reader` through one machine.
    ///
    /// Returns 0 once the reader is exhausted, -1 if a record failed.
    pub fn run_lines<M, R>(&mut self, reader: R, machine: &mut M) -> i32
    where
        M: Machine + ?Sized,
        R: BufRead,
    {
        let result = feed::lines(machine, reader, &mut self.trace)
            .map(|code| if code == 0 { 0 } else { FAILURE_STATUS })
            .map_err(DriverError::from);
        self.finish("-", result)
    }

    /// Usage text on the secondary stream.
    pub fn print_usage(&mut self, exec: &str) {
        self.trace.warn(format_args!("Usage:"));
        self.trace.warn(format_args!("  {} <from>:to [input]", exec));
        self.trace.warn(format_args!("  {} bench [input]", exec));
        self.trace.warn(format_args!("  {} -", exec));
    }

    fn finish(&mut self, exec: &str, result: Result<i32, DriverError>) -> i32 {
        let status = match result {
            Ok(status) => status,
            Err(err) => {
                self.report(exec, &err);
                err.exit_status()
            }
        };

        self.trace.flush();
        match self.trace.take_error() {
            Some(err) => {
                log::error!("{}", DriverError::from(err));
                FAILURE_STATUS
            }
            None => status,
        }
    }

    fn report(&mut self, exec: &str, err: &DriverError) {
        match err {
            DriverError::Usage(usage) => {
                log::debug!("usage error: {}", usage);
                self.print_usage(exec);
            }
            DriverError::Config(config) => self.trace.warn(format_args!("{}", config)),
            // Already on the trace streams.
            DriverError::Run(run) => log::debug!("run failed: {}", run),
            DriverError::Io(io) => log::error!("{}", io),
        }
    }
}

/// Process entry point: interpret `args` (program name first) and run.
///
/// `-` as the first argument feeds stdin line by line; otherwise a mode and
/// an input are required.
pub fn main_with<M, F>(args: &[String], mut init: F) -> i32
where
    M: Machine,
    F: FnMut() -> M,
{
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            return FAILURE_STATUS;
        }
    };

    let exec = args.first().map(String::as_str).unwrap_or("llfeed");
    let mut driver = Driver::new(&mut out, &mut err, config);

    match args {
        [_, dash, ..] if dash == "-" => {
            let stdin = io::stdin();
            let mut machine = init();
            driver.run_lines(stdin.lock(), &mut machine)
        }
        [_, spec, input, ..] => driver.run(exec, spec, input.as_bytes(), init),
        _ => driver.finish(exec, Err(UsageError::MissingArguments.into())),
    }
}
