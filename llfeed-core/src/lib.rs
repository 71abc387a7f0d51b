//! llfeed Core
//!
//! Harness for resumable, pausable byte-stream parsers. Feeds a machine its
//! input whole, in fixed-size chunks, repeatedly or line by line, and drives
//! it through pauses until it finishes or fails.
//!
//! # Architecture
//!
//! - **machine.rs** - Parser contract: state, input ranges, result codes
//! - **cycle.rs** - One resumable execution cycle
//! - **feed.rs** - Fragmentation plans and feeding strategies
//! - **trace.rs** - Diagnostic trace lines on the output streams
//! - **span.rs** - Splitting span text at line terminators
//! - **bench.rs** - Throughput benchmark
//! - **driver.rs** - Mode selection and exit status
//! - **fixture.rs** - Checking output of scan sweeps
//! - **reference.rs** - Minimal pausable machine

pub mod bench;
pub mod config;
pub mod cycle;
pub mod driver;
pub mod error;
pub mod feed;
pub mod fixture;
pub mod machine;
pub mod reference;
pub mod span;
pub mod trace;

pub use bench::{BenchOutcome, BenchReport, Clock, MonotonicClock};
pub use config::RunConfig;
pub use cycle::run_one;
pub use driver::{main_with, Driver, Mode};
pub use error::{ConfigError, DriverError, RunError, UsageError, FAILURE_STATUS};
pub use feed::FragmentationPlan;
pub use machine::{Execution, Input, Machine, ParserState, ERROR_PAUSE};
pub use reference::Reference;
pub use trace::{Quiet, Trace};
