//! Run configuration.
//!
//! A [`RunConfig`] is built once, from defaults and the environment, and
//! handed to the [`Driver`](crate::driver::Driver).

use crate::error::ConfigError;
use crate::trace::Quiet;

/// Byte volume a benchmark aims to push through the machine (8 GiB).
pub const DEFAULT_BENCH_BYTES: u64 = 8 << 30;

/// Overrides [`RunConfig::bench_bytes`].
pub const BENCH_BYTES_VAR: &str = "LLFEED_BENCH_BYTES";

/// Sets [`RunConfig::loop_limit`].
pub const LOOP_LIMIT_VAR: &str = "LLFEED_LOOP_LIMIT";

/// Parameters of a driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Target byte volume for `bench`.
    pub bench_bytes: u64,
    /// Iteration bound for `loop`. `None` runs until the machine fails.
    pub loop_limit: Option<u64>,
    /// What `bench` and `loop` suppress.
    pub quiet: Quiet,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { bench_bytes: DEFAULT_BENCH_BYTES, loop_limit: None, quiet: Quiet::Trace }
    }
}

impl RunConfig {
    /// Defaults, overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults, overridden through `lookup` (a stand-in for the
    /// environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(BENCH_BYTES_VAR) {
            config.bench_bytes = parse_positive(BENCH_BYTES_VAR, &value)?;
        }
        if let Some(value) = lookup(LOOP_LIMIT_VAR) {
            config.loop_limit = Some(parse_positive(LOOP_LIMIT_VAR, &value)?);
        }
        Ok(config)
    }

    pub fn with_bench_bytes(mut self, bytes: u64) -> Self {
        self.bench_bytes = bytes;
        self
    }

    pub fn with_loop_limit(mut self, limit: Option<u64>) -> Self {
        self.loop_limit = limit;
        self
    }

    pub fn with_quiet(mut self, quiet: Quiet) -> Self {
        self.quiet = quiet;
        self
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidEnv { var, value: value.to_string() }),
    }
}
