//! Owned event stream, for callers that would rather inspect a list than
//! implement [`ParseHandler`].

use super::{Attribute, ParseHandler, ParseOptions, parse};
use crate::span::{SourceRange, Span};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseEvent {
    Start {
        tag: String,
        attrs: Vec<Attribute>,
        unary: bool,
        span: Span,
    },
    End {
        tag: String,
        span: Span,
    },
    Chars {
        text: String,
        span: Option<Span>,
    },
    Comment {
        text: String,
        span: Span,
    },
    Warn {
        msg: String,
        range: SourceRange,
    },
}

/// Everything one parse reported, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub events: Vec<ParseEvent>,
}

impl ParseOutcome {
    pub fn warnings(&self) -> impl Iterator<Item = (&str, SourceRange)> + '_ {
        self.events.iter().filter_map(|event| match event {
            ParseEvent::Warn { msg, range } => Some((msg.as_str(), *range)),
            _ => None,
        })
    }

    /// Concatenation of all text events.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|event| match event {
                ParseEvent::Chars { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ParseHandler for ParseOutcome {
    fn start(&mut self, tag: &str, attrs: &[Attribute], unary: bool, span: Span) {
        self.events.push(ParseEvent::Start {
            tag: tag.to_string(),
            attrs: attrs.to_vec(),
            unary,
            span,
        });
    }

    fn end(&mut self, tag: &str, span: Span) {
        self.events.push(ParseEvent::End {
            tag: tag.to_string(),
            span,
        });
    }

    fn chars(&mut self, text: &str, span: Option<Span>) {
        self.events.push(ParseEvent::Chars {
            text: text.to_string(),
            span,
        });
    }

    fn comment(&mut self, text: &str, span: Span) {
        self.events.push(ParseEvent::Comment {
            text: text.to_string(),
            span,
        });
    }

    fn warn(&mut self, msg: String, range: SourceRange) {
        self.events.push(ParseEvent::Warn { msg, range });
    }
}

/// Parses `markup` and collects the events.
pub fn parse_events(markup: &str, options: &ParseOptions) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    parse(markup, options, &mut outcome);
    outcome
}
