//! Forgiving, event-driven markup parser for templates.
//!
//! The parser walks the source once, left to right, and reports what it sees
//! to a [`ParseHandler`]: start tags, end tags, text and comments. It never
//! builds a tree. Malformed input degrades to text or to diagnostics; parsing
//! itself can't fail.
//!
//! Each loop iteration is a single step that either consumes input or, when
//! nothing at the cursor is recognizable, flushes the remainder as text and
//! stops. Every iteration therefore makes progress and the loop runs at most
//! once per input byte.

mod events;
mod scan;
mod stack;


pub use events::{ParseEvent, ParseOutcome, parse_events};

use crate::entities::decode_attr;
use crate::span::{SourceRange, Span};
use crate::tags::{self, TagPredicate};
use scan::StartTagMatch;
use stack::{OpenTag, OpenTagStack};

/// Attribute of a start tag, value already decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// Present only when source ranges are requested. Excludes the
    /// whitespace before the attribute name.
    pub span: Option<Span>,
}

/// Receives parse events in source order.
pub trait ParseHandler {
    fn start(&mut self, tag: &str, attrs: &[Attribute], unary: bool, span: Span);

    fn end(&mut self, tag: &str, span: Span);

    /// `span` is `None` for text inside raw-text elements.
    fn chars(&mut self, text: &str, span: Option<Span>);

    fn comment(&mut self, _text: &str, _span: Span) {}

    fn warn(&mut self, _msg: String, _range: SourceRange) {}
}

/// Knobs the parser consults. Everything is fixed for the duration of one
/// parse.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Apply HTML's implicit-close rules for `<p>` and optional end tags.
    pub expect_html: bool,
    pub is_unary_tag: TagPredicate,
    pub can_be_left_open_tag: TagPredicate,
    /// Elements whose content is consumed as raw text.
    pub is_raw_text_tag: TagPredicate,
    pub should_keep_comment: bool,
    pub should_decode_newlines: bool,
    pub should_decode_newlines_for_href: bool,
    pub output_source_range: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            expect_html: false,
            is_unary_tag: TagPredicate::none(),
            can_be_left_open_tag: TagPredicate::none(),
            is_raw_text_tag: TagPredicate::new(tags::is_plain_text_element),
            should_keep_comment: false,
            should_decode_newlines: false,
            should_decode_newlines_for_href: false,
            output_source_range: false,
        }
    }
}

/// Parses `markup`, reporting every event to `handler`.
///
/// On return every tag opened during the parse has been closed, either by a
/// matching end tag or by the final flush (which warns about it).
pub fn parse<H: ParseHandler + ?Sized>(markup: &str, options: &ParseOptions, handler: &mut H) {
    let mut parser = Parser {
        source: markup,
        options,
        handler,
        pos: 0,
        stack: OpenTagStack::default(),
        #[cfg(any(test, feature = "debug-stats"))]
        steps: 0,
    };
    parser.run();
}

struct Parser<'a, H: ?Sized> {
    source: &'a str,
    options: &'a ParseOptions,
    handler: &'a mut H,
    pos: usize,
    stack: OpenTagStack,
    #[cfg(any(test, feature = "debug-stats"))]
    steps: usize,
}

impl<H: ParseHandler + ?Sized> Parser<'_, H> {
    fn run(&mut self) {
        while self.pos < self.source.len() {
            let before = self.pos;
            #[cfg(any(test, feature = "debug-stats"))]
            {
                self.steps += 1;
            }
            match self.raw_text_parent() {
                Some(tag) => self.step_raw_text(&tag),
                None => self.step_markup(),
            }
            debug_assert!(self.source.is_char_boundary(self.pos));
            if self.pos == before {
                self.flush_stalled();
                break;
            }
        }
        self.close_tag(None, self.pos, self.pos);
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "template.parser",
            "parse finished: bytes={} steps={}",
            self.source.len(),
            self.steps
        );
    }

    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn last_tag(&self) -> Option<&str> {
        self.stack.current().map(|entry| entry.tag.as_str())
    }

    /// Name of the innermost open tag when its content is raw text.
    fn raw_text_parent(&self) -> Option<String> {
        self.last_tag()
            .filter(|tag| self.options.is_raw_text_tag.test(tag))
            .map(str::to_string)
    }

    fn step_markup(&mut self) {
        if self.rest().starts_with('<') && self.step_structural() {
            return;
        }
        self.step_text();
    }

    /// Tries each construct in precedence order. Returns false, with nothing
    /// consumed, when none matches.
    fn step_structural(&mut self) -> bool {
        let source = self.source;
        let start = self.pos;
        let rest = &source[start..];

        if let Some((text, len)) = scan::match_comment(rest) {
            if self.options.should_keep_comment {
                let text = &rest[text];
                self.handler.comment(text, Span::new(start, start + len));
            }
            self.pos += len;
            return true;
        }
        if let Some(len) = scan::match_conditional_comment(rest) {
            self.pos += len;
            return true;
        }
        if let Some(len) = scan::match_doctype(rest) {
            self.pos += len;
            return true;
        }
        if let Some(m) = scan::match_end_tag(rest) {
            let name = &rest[2..2 + m.name_len];
            self.pos += m.len;
            self.close_tag(Some(name), start, start + m.len);
            return true;
        }
        if let Some(m) = scan::match_start_tag(rest) {
            self.pos += m.len;
            let tag = self.handle_start_tag(rest, start, m);
            if tags::ignores_first_newline(&tag) && self.rest().starts_with('\n') {
                self.pos += 1;
            }
            return true;
        }
        false
    }

    fn step_text(&mut self) {
        let source = self.source;
        let start = self.pos;
        let rest = &source[start..];
        let len = scan::find_text_end(rest);
        if len == 0 {
            return;
        }
        self.pos += len;
        self.handler
            .chars(&rest[..len], Some(Span::new(start, start + len)));
    }

    fn step_raw_text(&mut self, tag: &str) {
        let source = self.source;
        let start = self.pos;
        let rest = &source[start..];
        let lower = tag.to_lowercase();
        let close = scan::find_raw_text_close(rest, &lower);
        let content_len = close.map_or(rest.len(), |(lt, _)| lt);

        let mut text = rest[..content_len].to_string();
        if !tags::is_opaque_text_element(&lower) {
            text = scan::unwrap_comment_and_cdata(&text);
        }
        if tags::ignores_first_newline(&lower) && text.starts_with('\n') {
            text.remove(0);
        }
        if !text.is_empty() {
            self.handler.chars(&text, None);
        }

        match close {
            Some((lt, gt)) => {
                self.pos += gt;
                self.close_tag(Some(tag), start + lt, start + gt);
            }
            // Left open; the final flush closes it with a diagnostic.
            None => self.pos = self.source.len(),
        }
    }

    /// Emits the start event and returns the tag name.
    fn handle_start_tag(&mut self, rest: &str, start: usize, m: StartTagMatch) -> String {
        let tag = rest[m.name.clone()].to_string();
        let end = start + m.len;

        if self.options.expect_html {
            if self.last_tag() == Some("p") && tags::is_non_phrasing_tag(&tag) {
                self.close_tag(Some("p"), end, end);
            }
            if self.options.can_be_left_open_tag.test(&tag) && self.last_tag() == Some(tag.as_str())
            {
                self.close_tag(Some(&tag), end, end);
            }
        }

        let unary = self.options.is_unary_tag.test(&tag) || m.unary_slash;
        let attrs: Vec<Attribute> = m
            .attrs
            .iter()
            .map(|raw| {
                let name = &rest[raw.name.clone()];
                let value = raw.value.clone().map_or("", |v| &rest[v]);
                let decode_newlines = if tag == "a" && name == "href" {
                    self.options.should_decode_newlines_for_href
                } else {
                    self.options.should_decode_newlines
                };
                Attribute {
                    name: name.to_string(),
                    value: decode_attr(value, decode_newlines),
                    span: self.options.output_source_range.then(|| {
                        Span::new(start + raw.start + raw.leading_ws, start + raw.end)
                    }),
                }
            })
            .collect();

        let span = Span::new(start, end);
        if unary {
            self.handler.start(&tag, &attrs, true, span);
        } else {
            self.stack.push(OpenTag::new(&tag, attrs, span));
            let Parser { stack, handler, .. } = self;
            if let Some(top) = stack.current() {
                handler.start(&top.tag, &top.attrs, false, span);
            }
        }
        tag
    }

    /// Closes the innermost open tag named `name` (compared lower-cased) and
    /// everything above it. `None` closes everything. Entries other than the
    /// named one are reported as missing their end tag.
    fn close_tag(&mut self, name: Option<&str>, start: usize, end: usize) {
        let span = Span::new(start, end);
        let index = match name {
            Some(name) => self.stack.position_of(&name.to_lowercase()),
            None => Some(0),
        };
        let Some(index) = index else {
            // Stray `</br>` and `</p>` behave like the browser: `<br>` and
            // an empty `<p></p>`.
            let Some(name) = name else {
                return;
            };
            match name.to_lowercase().as_str() {
                "br" => self.handler.start(name, &[], true, span),
                "p" => {
                    self.handler.start(name, &[], false, span);
                    self.handler.end(name, span);
                }
                _ => {}
            }
            return;
        };

        let closed = self.stack.pop_from(index);
        let matched = closed.len().saturating_sub(1);
        for (i, entry) in closed.iter().enumerate() {
            if i != matched || name.is_none() {
                self.handler.warn(
                    format!("tag <{}> has no matching end tag.", entry.tag),
                    SourceRange::from(entry.span),
                );
            }
            self.handler.end(&entry.tag, span);
        }
    }

    /// Nothing at the cursor could be consumed: hand the rest over as text.
    fn flush_stalled(&mut self) {
        let source = self.source;
        let start = self.pos;
        let rest = &source[start..];
        self.handler
            .chars(rest, Some(Span::new(start, source.len())));
        if !self.stack.is_empty() {
            self.handler.warn(
                format!("Mal-formatted tag at end of template: \"{rest}\""),
                SourceRange::at(source.len()),
            );
        }
        self.pos = source.len();
    }
}
