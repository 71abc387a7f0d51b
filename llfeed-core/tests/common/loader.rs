//! Fixture loading from YAML files

use std::path::Path;

use llfeed_core::fixture::{Expected, FixtureOptions, Line};
use regex::Regex;
use serde::Deserialize;

/// A single test case from a fixture file
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub desc: String,
    pub input: String,
    /// Normalised output, line by line
    pub output: Vec<ExpectedLine>,
    /// Terminal code of a whole-buffer run
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub no_scan: bool,
    #[serde(default)]
    pub scan: Option<u32>,
}

/// Expected line - either literal text or `{ re: pattern }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpectedLine {
    Exact(String),
    Pattern { re: String },
}

impl TestCase {
    pub fn expected(&self) -> Expected {
        Expected::Lines(
            self.output
                .iter()
                .map(|line| match line {
                    ExpectedLine::Exact(text) => Line::Exact(text.clone()),
                    ExpectedLine::Pattern { re } => Line::Pattern(
                        Regex::new(re).unwrap_or_else(|e| panic!("{}: bad pattern {:?}: {}", self.id, re, e)),
                    ),
                })
                .collect(),
        )
    }

    pub fn options(&self) -> FixtureOptions {
        FixtureOptions { no_scan: self.no_scan, scan: self.scan }
    }
}

/// Load all test cases from a YAML fixture file
pub fn load_fixtures(path: &Path) -> Vec<TestCase> {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read fixture file {:?}: {}", path, e));
    serde_yaml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture file {:?}: {}", path, e))
}

/// Load fixtures from the standard fixtures directory
pub fn load_fixtures_by_name(name: &str) -> Vec<TestCase> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.yaml", name));
    load_fixtures(&path)
}
