//! Trace output shared by the driver and the machines it drives.
//!
//! Two line-oriented streams:
//!
//! ```text
//! primary    off=<N> <message>
//!            off=<N> len=<L> span[<name>]="<text>"
//!            off=<N> len=1 span[<name>]=lf
//! secondary  off=<N>   next=<hex>   debug=<message>
//! ```
//!
//! Offsets are absolute positions in the buffer being fed. Write failures
//! do not interrupt the run; the first one is kept and handed out by
//! [`Trace::take_error`] once the run is over.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

use crate::machine::Input;
use crate::span::{SegmentKind, Segments};

/// How much output a quiet run suppresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quiet {
    /// Everything is written.
    #[default]
    Off,
    /// Trace lines (`off=…`, spans) are dropped; reports, warnings and
    /// debug lines still go out.
    Trace,
    /// Nothing is written at all.
    All,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Primary,
    Secondary,
}

/// Writer pair plus quiet state for one driver.
pub struct Trace<'w> {
    out: &'w mut dyn Write,
    err: &'w mut dyn Write,
    quiet: Quiet,
    error: Option<io::Error>,
}

impl<'w> Trace<'w> {
    pub fn new(out: &'w mut dyn Write, err: &'w mut dyn Write) -> Self {
        Self { out, err, quiet: Quiet::Off, error: None }
    }

    #[inline]
    pub fn quiet(&self) -> Quiet {
        self.quiet
    }

    pub fn set_quiet(&mut self, quiet: Quiet) {
        self.quiet = quiet;
    }

    /// `off=<pos> <message>` on the primary stream.
    pub fn print(&mut self, pos: usize, message: fmt::Arguments<'_>) {
        self.print_at(Some(pos), message);
    }

    /// Like [`print`](Self::print); `None` renders as `off=NULL`.
    pub fn print_at(&mut self, pos: Option<usize>, message: fmt::Arguments<'_>) {
        if self.quiet != Quiet::Off {
            return;
        }
        let text = match message.as_str() {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Owned(message.to_string()),
        };
        self.emit(Stream::Primary, |w| {
            match pos {
                Some(pos) => write!(w, "off={}", pos)?,
                None => w.write_all(b"off=NULL")?,
            }
            if !text.is_empty() {
                w.write_all(b" ")?;
                w.write_all(text.as_bytes())?;
            }
            w.write_all(b"\n")
        });
    }

    /// Bare `off=<pos>` marker.
    pub fn mark(&mut self, pos: usize) {
        self.print(pos, format_args!(""));
    }

    /// Emit the named span covering `input`, one line per text run and per
    /// line terminator.
    pub fn span(&mut self, name: &str, input: Input<'_>) {
        if self.quiet != Quiet::Off {
            return;
        }
        for segment in Segments::new(input.bytes(), input.start()) {
            match segment.kind {
                SegmentKind::Text(text) => self.emit(Stream::Primary, |w| {
                    write!(w, "off={} len={} span[{}]=\"", segment.offset, text.len(), name)?;
                    w.write_all(text)?;
                    w.write_all(b"\"\n")
                }),
                SegmentKind::Terminator(t) => {
                    self.print(segment.offset, format_args!("len=1 span[{}]={}", name, t.as_str()))
                }
            }
        }
    }

    /// Debug line on the secondary stream, showing the byte at the start of
    /// `input` (or `null` when it is empty).
    pub fn debug(&mut self, input: Input<'_>, message: &str) {
        if self.quiet == Quiet::All {
            return;
        }
        let pos = input.start();
        self.emit(Stream::Secondary, |w| match input.bytes().first() {
            None => writeln!(w, "off={:<3} next=null debug={}", pos, message),
            Some(byte) => writeln!(w, "off={:<3} next={:02x}   debug={}", pos, byte, message),
        });
    }

    /// A full line on the primary stream that ignores [`Quiet::Trace`]
    /// (scan banners, benchmark reports).
    pub fn report(&mut self, line: fmt::Arguments<'_>) {
        if self.quiet == Quiet::All {
            return;
        }
        self.emit(Stream::Primary, |w| writeln!(w, "{}", line));
    }

    /// `===== SCAN <n> START =====`
    pub fn banner(&mut self, scan: u32) {
        self.report(format_args!("===== SCAN {} START =====", scan));
    }

    /// A full line on the secondary stream.
    pub fn warn(&mut self, line: fmt::Arguments<'_>) {
        if self.quiet == Quiet::All {
            return;
        }
        self.emit(Stream::Secondary, |w| writeln!(w, "{}", line));
    }

    /// Flush both streams.
    pub fn flush(&mut self) {
        self.emit(Stream::Primary, |w| w.flush());
        self.emit(Stream::Secondary, |w| w.flush());
    }

    /// The first write error seen since the last call, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn emit(&mut self, stream: Stream, f: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
        if self.error.is_some() {
            return;
        }
        let w: &mut dyn Write = match stream {
            Stream::Primary => &mut *self.out,
            Stream::Secondary => &mut *self.err,
        };
        if let Err(e) = f(w) {
            self.error = Some(e);
        }
    }
}

impl fmt::Debug for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("quiet", &self.quiet)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
