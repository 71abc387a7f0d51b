//! The boundary to the external parser state machine.
//!
//! The driver never knows what grammar a machine recognizes. It only sees
//! three things: `execute` over a byte range, the terminal result code, and
//! the three observable state fields in [`ParserState`].
//!
//! Positions are absolute offsets into the buffer an [`Input`] views, so a
//! machine fed `buf[10..20]` reports `error_pos` somewhere in `10..=20`.

use std::borrow::Cow;
use std::ops::Range;

use crate::trace::Trace;

/// Result code a machine returns to request a resume.
///
/// Not an error: the driver clears it and re-enters `execute` at
/// `error_pos`. The value is arbitrary, chosen to never collide with a real
/// error code.
pub const ERROR_PAUSE: i32 = 0x7fa7_3caa;

/// Observable state of a parser state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    /// Terminal result code set when the machine stops (0 while running).
    pub error: i32,
    /// Offset at which the machine paused or failed.
    pub error_pos: usize,
    /// Diagnostic text. Only meaningful when `error` is a real error.
    pub reason: Cow<'static, str>,
}

impl ParserState {
    /// Fresh state, as left by `init`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stop at `pos` and hand back `code` for returning from
    /// `execute`.
    pub fn stop(&mut self, code: i32, pos: usize, reason: impl Into<Cow<'static, str>>) -> i32 {
        self.error = code;
        self.error_pos = pos;
        self.reason = reason.into();
        code
    }

    /// Whether a sticky (non-pause) error has been recorded.
    #[inline]
    pub fn has_failed(&self) -> bool {
        self.error != 0 && self.error != ERROR_PAUSE
    }
}

/// Decoded result of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Whole range consumed.
    Success,
    /// Suspended; resume at `error_pos`.
    Paused,
    /// Stopped with a parser error code.
    ParseError(i32),
}

impl Execution {
    /// Decode a raw result code.
    #[inline]
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            ERROR_PAUSE => Self::Paused,
            code => Self::ParseError(code),
        }
    }

    /// The raw result code.
    #[inline]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Paused => ERROR_PAUSE,
            Self::ParseError(code) => code,
        }
    }
}

/// An immutable view of `buffer[start..end]`.
///
/// Chunking only ever produces narrower views of the same buffer, so
/// offsets stay comparable across every call of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input<'a> {
    buffer: &'a [u8],
    start: usize,
    end: usize,
}

impl<'a> Input<'a> {
    /// View the whole buffer.
    #[inline]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, start: 0, end: buffer.len() }
    }

    /// View `buffer[range]`. Returns `None` if the range does not fit.
    pub fn range(buffer: &'a [u8], range: Range<usize>) -> Option<Self> {
        (range.start <= range.end && range.end <= buffer.len()).then_some(Self {
            buffer,
            start: range.start,
            end: range.end,
        })
    }

    /// The narrower view `pos..end`, used to resume after a pause.
    ///
    /// Returns `None` if `pos` lies outside `start..=end`.
    #[inline]
    pub fn resume_at(&self, pos: usize) -> Option<Self> {
        (self.start..=self.end).contains(&pos).then_some(Self { start: pos, ..*self })
    }

    /// The full underlying buffer.
    #[inline]
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// The viewed bytes.
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        &self.buffer[self.start..self.end]
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An incremental (pausable) parser state machine.
///
/// Construction plays the role of `init`: the driver receives a factory
/// closure and calls it whenever a run needs a fresh state.
pub trait Machine {
    /// Consume `input`, returning 0, [`ERROR_PAUSE`] or an error code.
    ///
    /// On pause or error the machine must set `state().error` to the
    /// returned code and `state().error_pos` to an offset inside
    /// `input.start()..=input.end()`.
    fn execute(&mut self, input: Input<'_>, trace: &mut Trace<'_>) -> i32;

    fn state(&self) -> &ParserState;

    fn state_mut(&mut self) -> &mut ParserState;

    /// Called once a run has fed all of its input without error.
    fn finish(&mut self, _trace: &mut Trace<'_>) {}
}

impl<M: Machine + ?Sized> Machine for Box<M> {
    fn execute(&mut self, input: Input<'_>, trace: &mut Trace<'_>) -> i32 {
        (**self).execute(input, trace)
    }

    fn state(&self) -> &ParserState {
        (**self).state()
    }

    fn state_mut(&mut self) -> &mut ParserState {
        (**self).state_mut()
    }

    fn finish(&mut self, trace: &mut Trace<'_>) {
        (**self).finish(trace)
    }
}
