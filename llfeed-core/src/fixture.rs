//! Checking driver output against expectations across scan sizes.
//!
//! A scan sweep prints one section per chunk size:
//!
//! ```text
//! ===== SCAN 1 START =====
//! off=0 len=1 span[text]="a"
//! off=1 len=1 span[text]="b"
//! ===== SCAN 2 START =====
//! off=0 len=2 span[text]="ab"
//! ```
//!
//! Machines emit span pieces per `execute` call, so the same input prints
//! differently depending on fragmentation. [`normalize_spans`] merges
//! contiguous pieces back together; after that every section must match
//! the same expectation.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::RunConfig;
use crate::driver::Driver;
use crate::machine::Machine;

fn banner() -> &'static Regex {
    static BANNER: OnceLock<Regex> = OnceLock::new();
    BANNER.get_or_init(|| Regex::new(r"===== SCAN \d+ START =====\n").expect("valid banner pattern"))
}

fn span_line() -> &'static Regex {
    static SPAN: OnceLock<Regex> = OnceLock::new();
    SPAN.get_or_init(|| {
        Regex::new(r#"^off=(\d+)\s+len=(\d+)\s+span\[([^\]]+)\]="(.*)"$"#).expect("valid span pattern")
    })
}

/// The sections of a sweep's primary output, banners removed.
pub fn split_scans(stdout: &str) -> Vec<&str> {
    banner().split(stdout).skip(1).collect()
}

#[derive(Debug)]
enum Item<'a> {
    Raw(&'a str),
    Span { off: usize, len: usize, name: &'a str, value: String },
}

fn parse_line(line: &str) -> Item<'_> {
    let Some(caps) = span_line().captures(line) else {
        return Item::Raw(line);
    };
    let (Ok(off), Ok(len)) = (caps[1].parse::<usize>(), caps[2].parse::<usize>()) else {
        return Item::Raw(line);
    };
    let name = caps.get(3).map_or("", |m| m.as_str());
    Item::Span { off, len, name, value: caps[4].to_string() }
}

/// Merge span pieces of the same span whose ranges touch.
///
/// A merged piece moves to where its latest part was printed. Empty lines
/// are dropped and the result always ends with a newline.
pub fn normalize_spans(source: &str) -> String {
    let mut items: Vec<Option<Item<'_>>> = Vec::new();
    let mut last: HashMap<&str, usize> = HashMap::new();

    for line in source.split('\n').filter(|l| !l.is_empty()) {
        let (off, len, name, value) = match parse_line(line) {
            Item::Span { off, len, name, value } => (off, len, name, value),
            raw => {
                items.push(Some(raw));
                continue;
            }
        };

        if let Some(&idx) = last.get(name) {
            if let Some(Item::Span { off: prev_off, len: prev_len, value: prev_value, .. }) =
                items[idx].as_mut()
            {
                if *prev_off + *prev_len == off {
                    *prev_len += len;
                    prev_value.push_str(&value);
                    let merged = items[idx].take();
                    items.push(merged);
                    last.insert(name, items.len() - 1);
                    continue;
                }
            }
        }

        items.push(Some(Item::Span { off, len, name, value }));
        last.insert(name, items.len() - 1);
    }

    let mut out = String::new();
    for item in items.into_iter().flatten() {
        match item {
            Item::Raw(line) => out.push_str(line),
            Item::Span { off, len, name, value } => {
                out.push_str(&format!("off={} len={} span[{}]=\"{}\"", off, len, name, value))
            }
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}

/// One expected output line.
#[derive(Debug, Clone)]
pub enum Line {
    Exact(String),
    Pattern(Regex),
}

impl Line {
    fn matches(&self, actual: &str) -> bool {
        match self {
            Self::Exact(text) => text == actual,
            Self::Pattern(re) => re.is_match(actual),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(text) => write!(f, "{:?}", text),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Self::Exact(text.to_string())
    }
}

/// Expected normalised output of every scan.
#[derive(Debug, Clone)]
pub enum Expected {
    /// The whole output, verbatim.
    Exact(String),
    /// A pattern that must match somewhere in the output.
    Pattern(Regex),
    /// Line by line; missing and extra lines both fail.
    Lines(Vec<Line>),
}

/// Why an output did not meet its expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Zero-based line, for line-by-line expectations.
    pub line: Option<usize>,
    pub got: String,
    pub against: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "at line {}", line + 1)?;
        } else {
            f.write_str("output differs")?;
        }
        write!(f, "\n  got     : {:?}\n  against : {}", self.got, self.against)
    }
}

impl std::error::Error for Mismatch {}

impl Expected {
    /// Line-by-line expectation of exact lines.
    pub fn lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Line>,
    {
        Self::Lines(lines.into_iter().map(Into::into).collect())
    }

    pub fn check(&self, actual: &str) -> Result<(), Mismatch> {
        match self {
            Self::Exact(text) if text == actual => Ok(()),
            Self::Exact(text) => Err(Mismatch {
                line: None,
                got: actual.to_string(),
                against: format!("{:?}", text),
            }),
            Self::Pattern(re) if re.is_match(actual) => Ok(()),
            Self::Pattern(re) => Err(Mismatch {
                line: None,
                got: actual.to_string(),
                against: format!("/{}/", re.as_str()),
            }),
            Self::Lines(expected) => {
                let mut lines: Vec<&str> = actual.split('\n').collect();
                while lines.last() == Some(&"") {
                    lines.pop();
                }
                for i in 0..lines.len().max(expected.len()) {
                    let got = lines.get(i).copied();
                    match (got, expected.get(i)) {
                        (Some(got), Some(line)) if line.matches(got) => {}
                        (got, line) => {
                            return Err(Mismatch {
                                line: Some(i),
                                got: got.unwrap_or_default().to_string(),
                                against: line.map_or("<no more lines>".to_string(), Line::to_string),
                            })
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Which chunk sizes a check covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureOptions {
    /// Only feed the input whole (chunk size = input length).
    pub no_scan: bool,
    /// Only this chunk size.
    pub scan: Option<u32>,
}

/// Scan ranges covering chunk sizes `1..=len`, in batches of
/// `ceil(len / max_parallel)`.
pub fn scan_ranges(len: u32, max_parallel: usize, options: FixtureOptions) -> Vec<Range<u32>> {
    if options.no_scan {
        return vec![len..len + 1];
    }
    if let Some(scan) = options.scan {
        return vec![scan..scan + 1];
    }

    let batches = u32::try_from(max_parallel.max(1)).unwrap_or(u32::MAX);
    let step = len.div_ceil(batches).max(1);
    (1..=len)
        .step_by(step as usize)
        .map(|from| from..(from + step).min(len + 1))
        .collect()
}

/// Failure of a fixture check.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Test \"{name}\" exited with code: \"{status}\".\nstdout: {stdout}\nstderr: {stderr}")]
    Exit { name: String, status: i32, stdout: String, stderr: String },

    #[error("Test \"{name}\" printed {actual} scan sections for {expected} chunk sizes")]
    ScanCount { name: String, expected: usize, actual: usize },

    #[error("Executable: {name}\nScan value: {scan} {mismatch}")]
    Mismatch { name: String, scan: u32, mismatch: Mismatch },

    #[error("input of {0} bytes is too long to scan")]
    TooLong(usize),
}

/// Runs a machine through scan sweeps and checks what it prints.
pub struct Fixture<F> {
    name: String,
    init: F,
    max_parallel: usize,
    config: RunConfig,
}

impl<F> Fixture<F> {
    pub fn new(name: impl Into<String>, init: F) -> Self {
        let max_parallel = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self { name: name.into(), init, max_parallel, config: RunConfig::default() }
    }

    /// Batches the chunk sizes are split into (one driver run per batch).
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Check every scan of `input` against `expected`.
    pub fn check<M>(&mut self, input: &str, expected: &Expected, options: FixtureOptions) -> Result<(), FixtureError>
    where
        M: Machine,
        F: FnMut() -> M,
    {
        let len = u32::try_from(input.len()).map_err(|_| FixtureError::TooLong(input.len()))?;
        for range in scan_ranges(len, self.max_parallel, options) {
            let (status, stdout, stderr) = self.sweep::<M>(&range, input.as_bytes());
            if status != 0 {
                return Err(FixtureError::Exit { name: self.name.clone(), status, stdout, stderr });
            }

            let sections = split_scans(&stdout);
            if sections.len() != range.len() {
                return Err(FixtureError::ScanCount {
                    name: self.name.clone(),
                    expected: range.len(),
                    actual: sections.len(),
                });
            }
            for (scan, section) in range.clone().zip(sections) {
                expected
                    .check(&normalize_spans(section))
                    .map_err(|mismatch| FixtureError::Mismatch {
                        name: self.name.clone(),
                        scan,
                        mismatch,
                    })?;
            }
        }
        Ok(())
    }

    fn sweep<M>(&mut self, range: &Range<u32>, input: &[u8]) -> (i32, String, String)
    where
        M: Machine,
        F: FnMut() -> M,
    {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let spec = format!("{}:{}", range.start, range.end);
        let status = Driver::new(&mut out, &mut err, self.config.clone()).run(
            &self.name,
            &spec,
            input,
            &mut self.init,
        );
        (
            status,
            String::from_utf8_lossy(&out).into_owned(),
            String::from_utf8_lossy(&err).into_owned(),
        )
    }
}
