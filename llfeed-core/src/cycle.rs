//! One execution cycle: feed a byte range until it is consumed or the
//! machine stops for good.
//!
//! ```text
//!   execute(start..end) ──▶ PAUSE ──▶ print "pause", clear error ──┐
//!         ▲                                                         │
//!         └──────────────── execute(error_pos..end) ◀───────────────┘
//! ```
//!
//! A pause is never re-presented with bytes the machine already consumed:
//! the next call always starts at `error_pos`. Pausing twice in a row at the
//! same offset means the machine cannot advance with the bytes it has, and
//! the cycle fails instead of spinning.

use crate::error::RunError;
use crate::machine::{Execution, Input, Machine};
use crate::trace::Trace;

/// Drive `machine` over `range`.
///
/// Returns 0 or the parser's error code. Protocol violations (stall, code
/// mismatch, resume offset outside the range) are `Err`.
pub fn run_one<M: Machine + ?Sized>(
    machine: &mut M,
    range: Input<'_>,
    trace: &mut Trace<'_>,
) -> Result<i32, RunError> {
    let mut input = range;
    let mut paused = false;

    let code = loop {
        let code = machine.execute(input, trace);
        if Execution::from_code(code) != Execution::Paused {
            break code;
        }

        let offset = machine.state().error_pos;
        // Only the previous resume offset is compared.
        if paused && input.start() == offset {
            trace.debug(input, "Can't make progress after pause");
            log::debug!("stalled at offset {}", offset);
            return Err(RunError::Stall { offset });
        }

        trace.print(offset, format_args!("pause"));

        // Resume
        machine.state_mut().error = 0;
        input = range.resume_at(offset).ok_or(RunError::OffsetOutOfRange {
            offset,
            start: range.start(),
            end: range.end(),
        })?;
        paused = true;
    };

    if code != 0 {
        let state = machine.state();
        if code != state.error {
            trace.print(
                state.error_pos,
                format_args!("error code mismatch got={} expected={}", code, state.error),
            );
            return Err(RunError::CodeMismatch { got: code, expected: state.error });
        }

        trace.print(
            state.error_pos,
            format_args!("error code={} reason=\"{}\"", code, state.reason),
        );
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{ParserState, ERROR_PAUSE};
    use pretty_assertions::assert_eq;

    /// One scripted `execute` outcome: returned code, recorded error and
    /// recorded offset (relative to the start of the call's range).
    #[derive(Debug, Clone, Copy)]
    struct Step {
        code: i32,
        error: i32,
        advance: usize,
    }

    fn pause(advance: usize) -> Step {
        Step { code: ERROR_PAUSE, error: ERROR_PAUSE, advance }
    }

    fn done() -> Step {
        Step { code: 0, error: 0, advance: 0 }
    }

    fn fail(code: i32, error: i32, advance: usize) -> Step {
        Step { code, error, advance }
    }

    /// Plays back a fixed list of steps and records every call's range.
    struct Scripted {
        steps: std::vec::IntoIter<Step>,
        calls: Vec<(usize, usize)>,
        state: ParserState,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Self {
            Self { steps: steps.into_iter(), calls: Vec::new(), state: ParserState::new() }
        }
    }

    impl Machine for Scripted {
        fn execute(&mut self, input: Input<'_>, _trace: &mut Trace<'_>) -> i32 {
            self.calls.push((input.start(), input.end()));
            let step = self.steps.next().expect("script exhausted");
            if step.code != 0 {
                self.state.stop(step.error, input.start() + step.advance, "scripted");
            }
            step.code
        }

        fn state(&self) -> &ParserState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut ParserState {
            &mut self.state
        }
    }

    fn run(machine: &mut Scripted, buf: &[u8]) -> (Result<i32, RunError>, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut trace = Trace::new(&mut out, &mut err);
        let result = run_one(machine, Input::new(buf), &mut trace);
        drop(trace);
        (result, String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_success_without_pause() {
        let mut m = Scripted::new(vec![done()]);
        let (result, out, _) = run(&mut m, b"abc");
        assert_eq!(result, Ok(0));
        assert_eq!(out, "");
        assert_eq!(m.calls, vec![(0, 3)]);
    }

    #[test]
    fn test_resume_after_pause() {
        let mut m = Scripted::new(vec![pause(2), pause(1), done()]);
        let (result, out, _) = run(&mut m, b"abcdef");
        assert_eq!(result, Ok(0));
        assert_eq!(out, "off=2 pause\noff=3 pause\n");
        assert_eq!(m.calls, vec![(0, 6), (2, 6), (3, 6)]);
        assert_eq!(m.state.error, 0, "pause must be cleared on resume");
    }

    #[test]
    fn test_pause_without_progress_first_time_is_allowed() {
        // First pause at the very start is fine: nothing to compare against.
        let mut m = Scripted::new(vec![pause(0), done()]);
        let (result, _, _) = run(&mut m, b"abc");
        assert_eq!(result, Ok(0));
        assert_eq!(m.calls, vec![(0, 3), (0, 3)]);
    }

    #[test]
    fn test_stall_after_two_pauses_at_same_offset() {
        let mut m = Scripted::new(vec![pause(1), pause(0), done()]);
        let (result, out, err) = run(&mut m, b"abc");
        assert_eq!(result, Err(RunError::Stall { offset: 1 }));
        assert_eq!(out, "off=1 pause\n");
        assert_eq!(err, "off=1   next=62   debug=Can't make progress after pause\n");
        assert_eq!(m.calls.len(), 2, "no third execute after a stall");
    }

    #[test]
    fn test_stall_at_end_of_range() {
        let mut m = Scripted::new(vec![pause(3), pause(0)]);
        let (result, _, err) = run(&mut m, b"abc");
        assert_eq!(result, Err(RunError::Stall { offset: 3 }));
        assert_eq!(err, "off=3   next=null debug=Can't make progress after pause\n");
    }

    #[test]
    fn test_parse_error_reported() {
        let mut m = Scripted::new(vec![fail(5, 5, 2)]);
        let (result, out, _) = run(&mut m, b"abcd");
        assert_eq!(result, Ok(5));
        assert_eq!(out, "off=2 error code=5 reason=\"scripted\"\n");
    }

    #[test]
    fn test_parse_error_after_pause() {
        let mut m = Scripted::new(vec![pause(1), fail(9, 9, 1)]);
        let (result, out, _) = run(&mut m, b"abcd");
        assert_eq!(result, Ok(9));
        assert_eq!(out, "off=1 pause\noff=2 error code=9 reason=\"scripted\"\n");
    }

    #[test]
    fn test_code_mismatch() {
        let mut m = Scripted::new(vec![fail(4, 7, 1)]);
        let (result, out, _) = run(&mut m, b"abcd");
        assert_eq!(result, Err(RunError::CodeMismatch { got: 4, expected: 7 }));
        assert_eq!(out, "off=1 error code mismatch got=4 expected=7\n");
    }

    #[test]
    fn test_resume_offset_out_of_range() {
        let mut m = Scripted::new(vec![pause(9)]);
        let (result, _, _) = run(&mut m, b"abc");
        assert_eq!(result, Err(RunError::OffsetOutOfRange { offset: 9, start: 0, end: 3 }));
    }
}
