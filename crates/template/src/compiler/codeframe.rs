//! Source excerpts with a caret underline, used in error reports.

const RANGE: usize = 2;

/// Renders the lines around `start..end` of `source`, up to two lines of
/// context either side, with `^` under the offending part. A range that runs
/// past its first line keeps underlining the following lines.
///
/// Offsets are byte positions; underlines are measured in characters. A
/// start past the end of the source yields an empty frame.
pub fn generate_code_frame(source: &str, start: usize, end: usize) -> String {
    let lines = split_lines(source);
    let Some(i) = lines.iter().position(|line| start < line.end()) else {
        return String::new();
    };
    let mut out: Vec<String> = Vec::new();
    let mut j = i.saturating_sub(RANGE);
    while j < lines.len() && (j <= i + RANGE || end > lines[j].start) {
        let line = &lines[j];
        out.push(format!("{:<3}|  {}", j + 1, line.text));
        if j == i {
            let pad = line.column(start);
            let width = if end > line.end() {
                line.text.chars().count().saturating_sub(pad)
            } else {
                line.column(end).saturating_sub(pad)
            };
            out.push(format!("   |  {}{}", " ".repeat(pad), "^".repeat(width)));
        } else if j > i && end > line.start {
            out.push(format!("   |  {}", "^".repeat(line.column(end))));
        }
        j += 1;
    }
    out.join("\n")
}

struct Line<'a> {
    text: &'a str,
    start: usize,
    /// Length of the line terminator; the last line counts as if it had a
    /// one-byte terminator.
    term: usize,
}

impl Line<'_> {
    fn end(&self) -> usize {
        self.start + self.text.len() + self.term
    }

    /// Characters of the line before byte `offset` of the source.
    fn column(&self, offset: usize) -> usize {
        let rel = offset.saturating_sub(self.start);
        self.text.char_indices().take_while(|&(k, _)| k < rel).count()
    }
}

/// Splits on `\n` or `\r\n`.
fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut rest = source;
    while let Some(nl) = rest.find('\n') {
        let (text, term) = match rest[..nl].strip_suffix('\r') {
            Some(line) => (line, 2),
            None => (&rest[..nl], 1),
        };
        lines.push(Line { text, start, term });
        start += nl + 1;
        rest = &rest[nl + 1..];
    }
    lines.push(Line {
        text: rest,
        start,
        term: 1,
    });
    lines
}
