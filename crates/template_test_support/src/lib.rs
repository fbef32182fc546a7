//! Helpers shared by the template crate's golden tests and benchmarks.

use std::fmt::Write;

use template::parser::{ParseEvent, ParseOutcome};
use template::span::SourceRange;

/// One web-template block: a bound attribute, an interpolation, a void
/// element and a static subtree.
pub const BLOCK_TEMPLATE: &str =
    "<div class=\"box\" :title=\"t\"><span>hello {{ name }}</span><img src=\"x\"><ul><li>a</li></ul></div>";

/// `blocks` copies of [`BLOCK_TEMPLATE`] back to back.
pub fn make_blocks(blocks: usize) -> String {
    let mut html = String::with_capacity(BLOCK_TEMPLATE.len() * blocks);
    for _ in 0..blocks {
        html.push_str(BLOCK_TEMPLATE);
    }
    html
}

/// [`make_blocks`] wrapped in a single root element, so the result compiles
/// cleanly.
pub fn make_component(blocks: usize) -> String {
    format!("<main>{}</main>", make_blocks(blocks))
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Points at the first differing line with two lines of context around it.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map(String::as_str).unwrap_or("<missing>")
    }
    let max = expected.len().max(actual.len());
    let mut out = String::new();

    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(&mut out, "first mismatch at line {} (showing {}..={}):", i + 1, start + 1, end);
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

fn format_range(range: SourceRange) -> String {
    let side = |v: Option<usize>| v.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
    format!("{}..{}", side(range.start), side(range.end))
}

/// One line per event in the `template-events-v1` format, then `EOF`.
///
/// ```text
/// START name=div attrs=[id="a"] unary=false
/// CHARS text="hi" raw=false
/// END name=div
/// COMMENT text=" c "
/// WARN msg="tag <p> has no matching end tag." at=3..6
/// EOF
/// ```
pub fn format_events(outcome: &ParseOutcome) -> Vec<String> {
    let mut out = Vec::with_capacity(outcome.events.len() + 1);
    for event in &outcome.events {
        let line = match event {
            ParseEvent::Start {
                tag, attrs, unary, ..
            } => {
                let attrs: Vec<String> = attrs
                    .iter()
                    .map(|attr| format!("{}=\"{}\"", attr.name, escape_text(&attr.value)))
                    .collect();
                format!("START name={tag} attrs=[{}] unary={unary}", attrs.join(" "))
            }
            ParseEvent::End { tag, .. } => format!("END name={tag}"),
            ParseEvent::Chars { text, span } => {
                format!("CHARS text=\"{}\" raw={}", escape_text(text), span.is_none())
            }
            ParseEvent::Comment { text, .. } => format!("COMMENT text=\"{}\"", escape_text(text)),
            ParseEvent::Warn { msg, range } => {
                format!("WARN msg=\"{}\" at={}", escape_text(msg), format_range(*range))
            }
        };
        out.push(line);
    }
    out.push("EOF".to_string());
    out
}
