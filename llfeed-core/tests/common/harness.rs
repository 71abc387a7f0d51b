//! Running the reference machine under different fragmentations

use llfeed_core::feed::{self, FragmentationPlan};
use llfeed_core::fixture::normalize_spans;
use llfeed_core::{DriverError, Reference, RunError, Trace};

use crate::common::{Gen, TestCase};

/// What one run printed and returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub code: Result<i32, RunError>,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    /// Primary output with span pieces merged
    pub fn normalized(&self) -> String {
        normalize_spans(&self.stdout)
    }
}

/// Feed `input` in chunks per `plan` through a fresh reference machine
pub fn run_plan(input: &[u8], plan: &FragmentationPlan) -> Outcome {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = {
        let mut trace = Trace::new(&mut out, &mut err);
        match feed::fragmented(&mut Reference::new(), input, plan, &mut trace) {
            Ok(code) => Ok(code),
            Err(DriverError::Run(e)) => Err(e),
            Err(e) => panic!("plan does not fit input: {}", e),
        }
    };
    Outcome {
        code,
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    }
}

/// Feed `input` in one piece
pub fn run_whole(input: &[u8]) -> Outcome {
    run_plan(input, &FragmentationPlan::whole(input.len()))
}

/// Result of running a test
#[derive(Debug)]
pub struct TestResult {
    pub passed: bool,
    pub input: Vec<u8>,
    pub plan: Vec<usize>,
    pub expected: String,
    pub actual: String,
    pub seed: u64,
}

/// Run a case with random text around it and a random fragmentation.
///
/// The output of the fragmented run must equal the whole-buffer run once
/// span pieces are merged.
pub fn run_with_variations(case: &TestCase, gen: &mut Gen) -> TestResult {
    let mut input = Vec::new();
    if gen.chance(0.4) {
        input.extend(gen.text());
    }
    input.extend(case.input.as_bytes());
    if gen.chance(0.4) {
        input.extend(gen.text());
    }

    let plan = gen.plan(input.len());
    let whole = run_whole(&input);
    let split = run_plan(&input, &FragmentationPlan::explicit(input.len(), plan.clone()).unwrap());

    TestResult {
        passed: whole.code == split.code && whole.normalized() == split.normalized(),
        expected: whole.normalized(),
        actual: split.normalized(),
        input,
        plan,
        seed: gen.seed,
    }
}

impl TestResult {
    /// Print detailed failure info
    pub fn print_failure(&self, case_id: &str) {
        eprintln!("\n=== FAILED: {} ===", case_id);
        eprintln!("Seed: {} (set LLFEED_TEST_SEED={} to reproduce)", self.seed, self.seed);
        eprintln!("\nInput: {:?}", String::from_utf8_lossy(&self.input));
        eprintln!("Chunks: {:?}", self.plan);
        eprintln!("\nWhole:\n{}", self.expected);
        eprintln!("Fragmented:\n{}", self.actual);
    }
}
