//! Feed strategies: how an input buffer is cut up across execution cycles.
//!
//! Every strategy drives a single machine state for the whole run, so the
//! machine sees one continuous stream no matter how it was fragmented.
//!
//! - [`whole`] - one cycle over the full buffer
//! - [`fragmented`] - consecutive sub-ranges from a [`FragmentationPlan`]
//! - [`repeat`] - the full buffer, over and over
//! - [`lines`] - newline-terminated records from a reader

use std::io::{self, BufRead};
use std::ops::Range;

use memchr::memchr;

use crate::cycle::run_one;
use crate::error::{ConfigError, DriverError, RunError, FAILURE_STATUS};
use crate::machine::{Input, Machine};
use crate::trace::Trace;

/// Longest record [`lines`] hands to the machine; longer lines are split.
pub const MAX_RECORD: usize = 16383;

/// Chunk lengths covering an input, in order.
///
/// Built only through [`fixed`](Self::fixed) and
/// [`explicit`](Self::explicit), so every chunk is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentationPlan {
    kind: PlanKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlanKind {
    /// Chunks of `chunk` bytes, the last one possibly shorter.
    Fixed { len: usize, chunk: usize },
    Explicit(Vec<usize>),
}

impl FragmentationPlan {
    /// Fixed-size chunks. `chunk` must be positive.
    pub fn fixed(len: usize, chunk: usize) -> Result<Self, ConfigError> {
        if chunk == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(Self { kind: PlanKind::Fixed { len, chunk } })
    }

    /// Explicit lengths. Each must be positive and together they must cover
    /// exactly `len` bytes.
    pub fn explicit(len: usize, lengths: Vec<usize>) -> Result<Self, ConfigError> {
        if let Some(index) = lengths.iter().position(|&n| n == 0) {
            return Err(ConfigError::EmptyChunk { index });
        }
        let covered: usize = lengths.iter().sum();
        if covered != len {
            return Err(ConfigError::PlanLength { covered, len });
        }
        Ok(Self { kind: PlanKind::Explicit(lengths) })
    }

    /// A single chunk holding all `len` bytes (none when `len` is 0).
    pub fn whole(len: usize) -> Self {
        let lengths = if len == 0 { Vec::new() } else { vec![len] };
        Self { kind: PlanKind::Explicit(lengths) }
    }

    /// Byte ranges of the chunks, in feeding order.
    pub fn ranges(&self) -> Box<dyn Iterator<Item = Range<usize>> + '_> {
        match &self.kind {
            PlanKind::Fixed { len, chunk } => {
                let (len, chunk) = (*len, *chunk);
                Box::new((0..len).step_by(chunk).map(move |start| start..(start + chunk).min(len)))
            }
            PlanKind::Explicit(lengths) => Box::new(lengths.iter().scan(0, |start, &n| {
                let range = *start..*start + n;
                *start += n;
                Some(range)
            })),
        }
    }

    /// Total bytes covered.
    pub fn len(&self) -> usize {
        match &self.kind {
            PlanKind::Fixed { len, .. } => *len,
            PlanKind::Explicit(lengths) => lengths.iter().sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cycle over the whole buffer.
pub fn whole<M: Machine + ?Sized>(
    machine: &mut M,
    buf: &[u8],
    trace: &mut Trace<'_>,
) -> Result<i32, RunError> {
    run_one(machine, Input::new(buf), trace)
}

/// Feed `buf` chunk by chunk according to `plan`.
///
/// Stops at the first chunk whose cycle returns non-zero and hands back
/// that code; reaching a parser error early is a normal outcome here. The
/// machine's `finish` hook runs only when every chunk returned 0. A plan
/// that does not cover exactly `buf` is rejected before the machine runs.
pub fn fragmented<M: Machine + ?Sized>(
    machine: &mut M,
    buf: &[u8],
    plan: &FragmentationPlan,
    trace: &mut Trace<'_>,
) -> Result<i32, DriverError> {
    if plan.len() != buf.len() {
        return Err(ConfigError::PlanLength { covered: plan.len(), len: buf.len() }.into());
    }
    for range in plan.ranges() {
        let input = Input::range(buf, range.clone()).ok_or(ConfigError::PlanLength {
            covered: range.end,
            len: buf.len(),
        })?;
        let code = run_one(machine, input, trace)?;
        if code != 0 {
            return Ok(code);
        }
    }
    machine.finish(trace);
    Ok(0)
}

/// Feed the whole buffer again and again through one state.
///
/// Runs until a cycle returns non-zero, or `limit` cycles have succeeded.
pub fn repeat<M: Machine + ?Sized>(
    machine: &mut M,
    buf: &[u8],
    limit: Option<u64>,
    trace: &mut Trace<'_>,
) -> Result<i32, RunError> {
    let mut iterations = 0u64;
    while limit.map_or(true, |limit| iterations < limit) {
        let code = whole(machine, buf, trace)?;
        if code != 0 {
            log::debug!("repeat stopped after {} iterations with code {}", iterations, code);
            return Ok(code);
        }
        iterations += 1;
    }
    machine.finish(trace);
    Ok(0)
}

/// Feed records read from `reader`, each as its own buffer.
///
/// The end of the source, or a read failure, ends the run with 0. A
/// non-zero cycle result is written to the secondary stream and returned;
/// a protocol failure is written as code -1 and then propagated.
pub fn lines<M: Machine + ?Sized, R: BufRead>(
    machine: &mut M,
    mut reader: R,
    trace: &mut Trace<'_>,
) -> Result<i32, RunError> {
    let mut record = Vec::with_capacity(MAX_RECORD);
    loop {
        record.clear();
        match read_record(&mut reader, &mut record, MAX_RECORD) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("stopped reading input: {}", e);
                break;
            }
        }

        let result = whole(machine, &record, trace);
        let code = match result {
            Ok(0) => continue,
            Ok(code) => code,
            Err(_) => FAILURE_STATUS,
        };
        let state = machine.state();
        trace.warn(format_args!(
            "code={} error={} reason={}",
            code, state.error, state.reason
        ));
        return result;
    }
    machine.finish(trace);
    Ok(0)
}

/// Read up to and including the next `\n`, but no more than `max` bytes.
///
/// Returns the number of bytes appended to `record`; 0 at end of input.
pub fn read_record<R: BufRead + ?Sized>(
    reader: &mut R,
    record: &mut Vec<u8>,
    max: usize,
) -> io::Result<usize> {
    let mut read = 0;
    while read < max {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }

        let window = &available[..available.len().min(max - read)];
        let (take, done) = match memchr(b'\n', window) {
            Some(at) => (at + 1, true),
            None => (window.len(), false),
        };
        record.extend_from_slice(&window[..take]);
        reader.consume(take);
        read += take;
        if done {
            break;
        }
    }
    Ok(read)
}
