//! Byte offsets into template source text.

/// Half-open byte range `start..end` into the markup handed to the parser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} past end {end}");
        Self { start, end }
    }

    /// Zero-width span at `at`, used for synthesized events.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn shift(self, by: usize) -> Self {
        Self {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

/// Source position attached to a diagnostic. Either side may be unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl SourceRange {
    pub const NONE: SourceRange = SourceRange {
        start: None,
        end: None,
    };

    pub fn at(start: usize) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn is_none(self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn shift(self, by: usize) -> Self {
        Self {
            start: self.start.map(|s| s + by),
            end: self.end.map(|e| e + by),
        }
    }
}

impl From<Span> for SourceRange {
    fn from(span: Span) -> Self {
        Self {
            start: Some(span.start),
            end: Some(span.end),
        }
    }
}

impl From<Option<Span>> for SourceRange {
    fn from(span: Option<Span>) -> Self {
        span.map_or(SourceRange::NONE, SourceRange::from)
    }
}
