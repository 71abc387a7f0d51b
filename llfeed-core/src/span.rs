//! Line-aware splitting of span ranges.
//!
//! A span range is cut into maximal runs of non-terminator bytes and single
//! `\r` / `\n` terminators, left to right. Concatenating every segment (one
//! byte per terminator) gives back the original range.
//!
//! ```text
//! "ab\r\ncd"  ->  Text("ab")  Cr  Lf  Text("cd")
//! ""          ->  Text("")
//! "\n"        ->  Lf
//! ```

use memchr::memchr2;

/// A line terminator byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Cr,
    Lf,
}

impl Terminator {
    /// The marker used in trace output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cr => "cr",
            Self::Lf => "lf",
        }
    }

    /// The terminator byte itself.
    pub fn byte(self) -> u8 {
        match self {
            Self::Cr => b'\r',
            Self::Lf => b'\n',
        }
    }
}

/// What a segment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind<'a> {
    /// A run without terminators. Empty only for an empty range.
    Text(&'a [u8]),
    Terminator(Terminator),
}

/// One piece of a span range, positioned by absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub offset: usize,
    pub kind: SegmentKind<'a>,
}

impl Segment<'_> {
    /// Bytes covered by this segment.
    pub fn len(&self) -> usize {
        match self.kind {
            SegmentKind::Text(text) => text.len(),
            SegmentKind::Terminator(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator over the segments of a span range.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    bytes: &'a [u8],
    base: usize,
    pos: usize,
    pending: Option<Terminator>,
    started: bool,
}

impl<'a> Segments<'a> {
    /// Segment `bytes`, reporting offsets relative to `base`.
    pub fn new(bytes: &'a [u8], base: usize) -> Self {
        Self { bytes, base, pos: 0, pending: None, started: false }
    }

    fn terminator(&mut self, terminator: Terminator) -> Segment<'a> {
        let offset = self.base + self.pos;
        // A terminator is a real byte of the range.
        debug_assert!(self.pos < self.bytes.len());
        self.pos += 1;
        Segment { offset, kind: SegmentKind::Terminator(terminator) }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if let Some(terminator) = self.pending.take() {
            return Some(self.terminator(terminator));
        }
        if self.started && self.pos == self.bytes.len() {
            return None;
        }
        self.started = true;

        let rest = &self.bytes[self.pos..];
        let Some(at) = memchr2(b'\r', b'\n', rest) else {
            let offset = self.base + self.pos;
            self.pos = self.bytes.len();
            return Some(Segment { offset, kind: SegmentKind::Text(rest) });
        };

        let terminator = if rest[at] == b'\r' { Terminator::Cr } else { Terminator::Lf };
        if at == 0 {
            return Some(self.terminator(terminator));
        }

        let offset = self.base + self.pos;
        self.pos += at;
        self.pending = Some(terminator);
        Some(Segment { offset, kind: SegmentKind::Text(&rest[..at]) })
    }
}
