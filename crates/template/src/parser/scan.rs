//! Non-committing matchers over the unconsumed markup.
//!
//! Every matcher looks at a `&str` starting at the current cursor and returns
//! byte lengths relative to it. Nothing here mutates parser state; a failed
//! match leaves the caller free to try the next construct.

use memchr::{memchr, memchr_iter, memmem};
use std::ops::Range;

/// Attribute as matched inside a start tag. Offsets are relative to the
/// start of the tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawAttr {
    /// Start of the match, including leading whitespace.
    pub(crate) start: usize,
    pub(crate) leading_ws: usize,
    pub(crate) name: Range<usize>,
    pub(crate) value: Option<Range<usize>>,
    pub(crate) end: usize,
}

/// A complete start tag, `<` through `>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StartTagMatch {
    pub(crate) name: Range<usize>,
    pub(crate) attrs: Vec<RawAttr>,
    pub(crate) unary_slash: bool,
    pub(crate) len: usize,
}

/// A complete end tag, `</name ... >`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EndTagMatch {
    pub(crate) name_len: usize,
    pub(crate) len: usize,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '.' | '_')
        || matches!(c,
            '\u{00B7}'
            | '\u{00C0}'..='\u{00D6}'
            | '\u{00D8}'..='\u{00F6}'
            | '\u{00F8}'..='\u{037D}'
            | '\u{037F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{203F}'..='\u{2040}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}')
}

fn match_ncname(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if is_name_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|&(_, c)| !is_name_char(c))
        .map_or(s.len(), |(i, _)| i)
}

/// Length of an optionally prefixed name (`prefix:local`) at the start of
/// `s`, or 0.
pub(crate) fn match_qname(s: &str) -> usize {
    let first = match_ncname(s);
    if first == 0 {
        return 0;
    }
    if s.as_bytes().get(first) == Some(&b':') {
        let local = match_ncname(&s[first + 1..]);
        if local > 0 {
            return first + 1 + local;
        }
    }
    first
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// `<name` at the start of `s`; returns the name length.
pub(crate) fn match_start_tag_open(s: &str) -> Option<usize> {
    let rest = s.strip_prefix('<')?;
    let n = match_qname(rest);
    (n > 0).then_some(n)
}

/// `</name` at the start of `s`; returns the name length.
fn match_end_tag_open(s: &str) -> Option<usize> {
    let rest = s.strip_prefix("</")?;
    let n = match_qname(rest);
    (n > 0).then_some(n)
}

/// `</name` followed by anything up to and including the next `>`.
pub(crate) fn match_end_tag(s: &str) -> Option<EndTagMatch> {
    let name_len = match_end_tag_open(s)?;
    let after = 2 + name_len;
    let gt = memchr(b'>', &s.as_bytes()[after..])?;
    Some(EndTagMatch {
        name_len,
        len: after + gt + 1,
    })
}

/// Optional whitespace, optional `/`, then `>`. Returns (slash, length).
fn match_start_tag_close(s: &str) -> Option<(bool, usize)> {
    let ws = leading_ws(s);
    let bytes = &s.as_bytes()[ws..];
    match bytes {
        [b'>', ..] => Some((false, ws + 1)),
        [b'/', b'>', ..] => Some((true, ws + 2)),
        _ => None,
    }
}

fn is_attr_name_stop(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
}

/// `\s*=\s*` followed by a double-quoted, single-quoted or bare value.
/// Returns the value range and the total length, both relative to `s`.
fn match_attr_value(s: &str) -> Option<(Range<usize>, usize)> {
    let mut i = leading_ws(s);
    if s.as_bytes().get(i) != Some(&b'=') {
        return None;
    }
    i += 1;
    i += leading_ws(&s[i..]);
    let bytes = s.as_bytes();
    match bytes.get(i) {
        Some(&quote @ (b'"' | b'\'')) => {
            let open = i + 1;
            let close = open + memchr(quote, &bytes[open..])?;
            // Repeated closing quotes are swallowed with the value.
            let end = close + bytes[close..].iter().take_while(|&&b| b == quote).count();
            Some((open..close, end))
        }
        Some(_) => {
            let rest = &s[i..];
            let len = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`'))
                .unwrap_or(rest.len());
            (len > 0).then(|| (i..i + len, i + len))
        }
        None => None,
    }
}

fn finish_attr(s: &str, ws: usize, name_end: usize) -> RawAttr {
    let (value, end) = match match_attr_value(&s[name_end..]) {
        Some((range, len)) => (
            Some(range.start + name_end..range.end + name_end),
            name_end + len,
        ),
        None => (None, name_end),
    };
    RawAttr {
        start: 0,
        leading_ws: ws,
        name: ws..name_end,
        value,
        end,
    }
}

/// Plain attribute: a run of name characters with an optional value.
fn match_attr(s: &str) -> Option<RawAttr> {
    let ws = leading_ws(s);
    let body = &s[ws..];
    let name_len = body.find(is_attr_name_stop).unwrap_or(body.len());
    if name_len == 0 {
        return None;
    }
    Some(finish_attr(s, ws, ws + name_len))
}

/// Attribute whose argument is a bracketed expression, for example
/// `:[key]="value"` or `v-bind:[key]`. The bracketed part may contain
/// characters a plain attribute name can't.
fn match_dynamic_arg_attr(s: &str) -> Option<RawAttr> {
    let ws = leading_ws(s);
    let body = &s[ws..];
    let bytes = body.as_bytes();
    let prefix = match bytes {
        [b'v', b'-', ..] => {
            let word = bytes[2..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_' || **b == b'-')
                .count();
            if word == 0 || bytes.get(2 + word) != Some(&b':') {
                return None;
            }
            2 + word + 1
        }
        [b'@' | b':' | b'#', ..] => 1,
        _ => return None,
    };
    if bytes.get(prefix) != Some(&b'[') {
        return None;
    }
    let inner_start = prefix + 1;
    let segment_len = memchr(b'=', &bytes[inner_start..]).unwrap_or(bytes.len() - inner_start);
    let segment = &bytes[inner_start..inner_start + segment_len];
    // At least one character inside the brackets; the first `]` after it
    // closes them.
    let close = 1 + memchr(b']', segment.get(1..)?)?;
    let after = inner_start + close + 1;
    let tail = body[after..].find(is_attr_name_stop).unwrap_or(body.len() - after);
    Some(finish_attr(s, ws, ws + after + tail))
}

/// Complete start tag at the start of `s`. Returns `None` without consuming
/// anything if the tag isn't closed by `>` or `/>` after zero or more
/// attributes.
pub(crate) fn match_start_tag(s: &str) -> Option<StartTagMatch> {
    let name_len = match_start_tag_open(s)?;
    let mut i = 1 + name_len;
    let mut attrs = Vec::new();
    loop {
        let rest = &s[i..];
        if let Some((unary_slash, len)) = match_start_tag_close(rest) {
            return Some(StartTagMatch {
                name: 1..1 + name_len,
                attrs,
                unary_slash,
                len: i + len,
            });
        }
        let mut attr = match_dynamic_arg_attr(rest).or_else(|| match_attr(rest))?;
        debug_assert!(attr.end > 0);
        attr.start += i;
        attr.name = attr.name.start + i..attr.name.end + i;
        attr.value = attr.value.map(|v| v.start + i..v.end + i);
        attr.end += i;
        i = attr.end;
        debug_assert!(s.is_char_boundary(i));
        attrs.push(attr);
    }
}

/// Length of a `<!-- ... -->` comment and the range of its text, or `None`
/// if the terminator is missing.
pub(crate) fn match_comment(s: &str) -> Option<(Range<usize>, usize)> {
    if !s.starts_with("<!--") {
        return None;
    }
    // `<!-->` and `<!--->` close immediately with empty text.
    let close = 2 + memmem::find(&s.as_bytes()[2..], b"-->")?;
    Some((4..close.max(4), close + 3))
}

/// Length of a `<![ ... ]>` conditional comment.
pub(crate) fn match_conditional_comment(s: &str) -> Option<usize> {
    if !s.starts_with("<![") {
        return None;
    }
    memmem::find(s.as_bytes(), b"]>").map(|close| close + 2)
}

/// Length of a `<!DOCTYPE ...>` declaration. The keyword is matched without
/// regard to case.
pub(crate) fn match_doctype(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() < 11 || !bytes[..9].eq_ignore_ascii_case(b"<!DOCTYPE") || bytes[9] != b' ' {
        return None;
    }
    match memchr(b'>', &bytes[10..]) {
        Some(gt) if gt > 0 => Some(10 + gt + 1),
        _ => None,
    }
}

/// True when `s` begins a construct the structural steps could consume, or
/// would consume once more input follows it.
///
/// `has_gt_after` answers whether a `>` exists anywhere at or after a byte
/// offset relative to `s`; it keeps repeated probes linear.
fn is_structural_start(s: &str, has_gt_after: impl Fn(usize) -> bool) -> bool {
    if let Some(name_len) = match_end_tag_open(s) {
        if has_gt_after(2 + name_len) {
            return true;
        }
    }
    match_start_tag_open(s).is_some() || s.starts_with("<!--") || s.starts_with("<![")
}

/// Offset of the first `<` in `s` that starts a structural construct, or the
/// length of `s` when none does. Lone `<` characters are part of the text.
pub(crate) fn find_text_end(s: &str) -> usize {
    let bytes = s.as_bytes();
    let last_gt = memchr::memrchr(b'>', bytes);
    for lt in memchr_iter(b'<', bytes) {
        let has_gt_after = |rel: usize| last_gt.is_some_and(|gt| gt >= lt + rel);
        if is_structural_start(&s[lt..], has_gt_after) {
            return lt;
        }
    }
    s.len()
}

/// Locates `</lower_name` (any case) followed by `>`, `/` or whitespace and
/// then anything up to `>`. Returns the offsets of `<` and just past `>`.
pub(crate) fn find_raw_text_close(s: &str, lower_name: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let name = lower_name.as_bytes();
    for lt in memchr_iter(b'<', bytes) {
        let after_name = lt + 2 + name.len();
        let Some(candidate) = bytes.get(lt..after_name) else {
            return None;
        };
        if candidate[1] != b'/' || !candidate[2..].eq_ignore_ascii_case(name) {
            continue;
        }
        match bytes.get(after_name) {
            Some(b) if *b == b'>' || *b == b'/' || b.is_ascii_whitespace() => {}
            _ => continue,
        }
        let gt = memchr(b'>', &bytes[after_name..])?;
        return Some((lt, after_name + gt + 1));
    }
    None
}

/// Strips `<!--...-->` and `<![CDATA[...]]>` wrappers, keeping their
/// content. Unterminated wrappers are left in place.
pub(crate) fn unwrap_comment_and_cdata(text: &str) -> String {
    let once = unwrap_delimited(text, "<!--", "-->");
    unwrap_delimited(&once, "<![CDATA[", "]]>")
}

fn unwrap_delimited(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        let inner = start + open.len();
        let Some(end) = rest[inner..].find(close) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&rest[inner..inner + end]);
        rest = &rest[inner + end + close.len()..];
    }
    out.push_str(rest);
    out
}
