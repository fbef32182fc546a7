//! Character reference decoding for attribute values and element text.
//!
//! Attribute values only ever see the short fixed table the markup parser
//! promises (`&lt;`, `&gt;`, `&quot;`, `&amp;`, `&#39;`, plus `&#10;`/`&#9;`
//! when newline decoding is on). Element text goes through a wider decoder
//! used by the AST builder.

use memchr::memchr_iter;

const ATTR_REFS: &[(&[u8], char)] = &[
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&amp;", '&'),
    (b"&#39;", '\''),
];

const NEWLINE_REFS: &[(&[u8], char)] = &[(b"&#10;", '\n'), (b"&#9;", '\t')];

const NAMED_TEXT_REFS: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

/// Decodes an attribute value in a single left-to-right pass.
///
/// Output of one replacement is never re-scanned, so `&amp;lt;` becomes
/// `&lt;` and not `<`.
pub(crate) fn decode_attr(value: &str, decode_newlines: bool) -> String {
    decode_with(value, |rest| {
        lookup(ATTR_REFS, rest).or_else(|| {
            if decode_newlines {
                lookup(NEWLINE_REFS, rest)
            } else {
                None
            }
        })
    })
}

/// Decodes element text: common named references and well-formed,
/// semicolon-terminated numeric references. Anything else passes through.
pub(crate) fn decode_text(text: &str) -> String {
    decode_with(text, |rest| {
        lookup(NAMED_TEXT_REFS, rest).or_else(|| numeric_ref(rest))
    })
}

fn decode_with(s: &str, mut matcher: impl FnMut(&[u8]) -> Option<(char, usize)>) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    for amp in memchr_iter(b'&', bytes) {
        // A replacement never contains `&`, so positions inside a consumed
        // reference can't show up here.
        debug_assert!(amp >= copy_start);
        let Some((ch, len)) = matcher(&bytes[amp..]) else {
            continue;
        };
        out.push_str(&s[copy_start..amp]);
        out.push(ch);
        copy_start = amp + len;
    }
    out.push_str(&s[copy_start..]);
    out
}

fn lookup(table: &[(&[u8], char)], rest: &[u8]) -> Option<(char, usize)> {
    table
        .iter()
        .find(|(pat, _)| rest.starts_with(pat))
        .map(|(pat, ch)| (*ch, pat.len()))
}

fn numeric_ref(rest: &[u8]) -> Option<(char, usize)> {
    let (digits_start, radix, max_digits) = match rest {
        [b'&', b'#', b'x' | b'X', ..] => (3, 16, MAX_HEX_DIGITS),
        [b'&', b'#', ..] => (2, 10, MAX_DEC_DIGITS),
        _ => return None,
    };
    let digits = rest[digits_start..]
        .iter()
        .take(max_digits + 1)
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if digits == 0 || digits > max_digits {
        return None;
    }
    let end = digits_start + digits;
    if rest.get(end) != Some(&b';') {
        return None;
    }
    let text = std::str::from_utf8(&rest[digits_start..end]).ok()?;
    let ch = u32::from_str_radix(text, radix).ok().and_then(char::from_u32)?;
    Some((ch, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_decodes_fixed_table() {
        assert_eq!(decode_attr("a &lt; b &gt; c", false), "a < b > c");
        assert_eq!(decode_attr("&quot;x&quot; &#39;y&#39;", false), "\"x\" 'y'");
        assert_eq!(decode_attr("Tom &amp; Jerry", false), "Tom & Jerry");
    }

    #[test]
    fn attr_never_rescans_replacements() {
        assert_eq!(decode_attr("&amp;lt;", false), "&lt;");
        assert_eq!(decode_attr("&amp;#10;", true), "&#10;");
    }

    #[test]
    fn attr_newline_refs_follow_flag() {
        assert_eq!(decode_attr("a&#10;b&#9;c", false), "a&#10;b&#9;c");
        assert_eq!(decode_attr("a&#10;b&#9;c", true), "a\nb\tc");
    }

    #[test]
    fn attr_leaves_other_references_alone() {
        assert_eq!(decode_attr("&nbsp;&copy;&#215;", true), "&nbsp;&copy;&#215;");
        assert_eq!(decode_attr("&lt", false), "&lt");
        assert_eq!(decode_attr("π &amp; σ", false), "π & σ");
    }

    #[test]
    fn text_decodes_named_and_numeric() {
        assert_eq!(decode_text("a&nbsp;b &apos;c&apos;"), "a\u{00A0}b 'c'");
        assert_eq!(decode_text("&#215; &#xD7;"), "× ×");
        assert_eq!(decode_text("120×32"), "120×32");
    }

    #[test]
    fn text_passes_through_malformed_numeric() {
        assert_eq!(decode_text("&#xZZ;"), "&#xZZ;");
        assert_eq!(decode_text("&#99999999;"), "&#99999999;");
        assert_eq!(decode_text("&#xD800;"), "&#xD800;");
        assert_eq!(decode_text("&#123"), "&#123");
        assert_eq!(decode_text("&#;"), "&#;");
        assert_eq!(decode_text("&notanentity;"), "&notanentity;");
    }

    #[test]
    fn text_respects_digit_limits() {
        assert_eq!(decode_text("&#1114111;"), "\u{10FFFF}");
        assert_eq!(decode_text("&#11141111;"), "&#11141111;");
        assert_eq!(decode_text("&#x10FFFF;"), "\u{10FFFF}");
    }
}
