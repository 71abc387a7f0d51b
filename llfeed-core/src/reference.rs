//! A small pausable machine for driving the harness end to end.
//!
//! ```text
//! ;     consumed, prints a bare `off=<N>` with N just past it
//! !     consumed, pauses with error_pos just past it
//! #     error 1 at its own offset; every later call fails the same way
//! else  reported as span `text`
//! ```
//!
//! Span pieces are emitted per call, so a fragmented run prints more (but
//! contiguous) pieces than a whole one.

use memchr::memchr3;

use crate::machine::{Input, Machine, ParserState, ERROR_PAUSE};
use crate::trace::Trace;

/// Error code for `#`.
pub const UNEXPECTED_HASH: i32 = 1;

/// Span name used for ordinary bytes.
pub const TEXT_SPAN: &str = "text";

#[derive(Debug, Default)]
pub struct Reference {
    state: ParserState,
}

impl Reference {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Machine for Reference {
    fn execute(&mut self, input: Input<'_>, trace: &mut Trace<'_>) -> i32 {
        if self.state.has_failed() {
            self.state.error_pos = input.start();
            return self.state.error;
        }

        let buf = input.buffer();
        let end = input.end();
        let mut pos = input.start();
        while pos < end {
            let Some(at) = memchr3(b';', b'!', b'#', &buf[pos..end]) else {
                break;
            };
            let special = pos + at;
            if special > pos {
                trace.span(TEXT_SPAN, Input::range(buf, pos..special).unwrap_or(input));
            }

            match buf[special] {
                b';' => {
                    pos = special + 1;
                    trace.mark(pos);
                }
                b'!' => return self.state.stop(ERROR_PAUSE, special + 1, "paused"),
                _ => return self.state.stop(UNEXPECTED_HASH, special, "Unexpected '#'"),
            }
        }

        if pos < end {
            trace.span(TEXT_SPAN, input.resume_at(pos).unwrap_or(input));
        }
        0
    }

    fn state(&self) -> &ParserState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ParserState {
        &mut self.state
    }
}
