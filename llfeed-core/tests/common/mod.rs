//! Test infrastructure for the llfeed driver
//!
//! Provides fixture loading, stochastic fragmentation, and assertion helpers.

#![allow(dead_code)]

mod generators;
mod harness;
mod loader;

pub use generators::Gen;
pub use harness::{run_plan, run_whole, run_with_variations, Outcome, TestResult};
pub use loader::{load_fixtures_by_name, ExpectedLine, TestCase};
