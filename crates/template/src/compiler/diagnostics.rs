//! Compile-time diagnostics and where they end up.

use std::fmt;

use crate::span::SourceRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Error,
    Tip,
}

/// One message produced while compiling a template.
///
/// Offsets are byte positions in the template as the caller passed it,
/// leading whitespace included. They are only filled in when source ranges
/// were requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerWarning {
    pub msg: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub kind: DiagnosticKind,
}

impl CompilerWarning {
    pub fn range(&self) -> SourceRange {
        SourceRange {
            start: self.start,
            end: self.end,
        }
    }
}

impl fmt::Display for CompilerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

/// Per-compile collector handed to every stage that can complain.
///
/// When source ranges are on, incoming ranges are relative to the trimmed
/// template and get shifted by the stripped leading whitespace. When they
/// are off, ranges are dropped.
#[derive(Debug, Default)]
pub struct Diagnostics {
    leading_ws: Option<usize>,
    errors: Vec<CompilerWarning>,
    tips: Vec<CompilerWarning>,
}

impl Diagnostics {
    /// `leading_ws` is `Some` exactly when source ranges are requested.
    pub fn new(leading_ws: Option<usize>) -> Self {
        Self {
            leading_ws,
            errors: Vec::new(),
            tips: Vec::new(),
        }
    }

    pub fn error(&mut self, msg: impl Into<String>, range: SourceRange) {
        self.push(msg.into(), range, DiagnosticKind::Error);
    }

    pub fn tip(&mut self, msg: impl Into<String>, range: SourceRange) {
        self.push(msg.into(), range, DiagnosticKind::Tip);
    }

    pub fn push(&mut self, msg: String, range: SourceRange, kind: DiagnosticKind) {
        let range = match self.leading_ws {
            Some(shift) => range.shift(shift),
            None => SourceRange::NONE,
        };
        let warning = CompilerWarning {
            msg,
            start: range.start,
            end: range.end,
            kind,
        };
        match kind {
            DiagnosticKind::Error => self.errors.push(warning),
            DiagnosticKind::Tip => self.tips.push(warning),
        }
    }

    pub fn errors(&self) -> &[CompilerWarning] {
        &self.errors
    }

    pub fn into_parts(self) -> (Vec<CompilerWarning>, Vec<CompilerWarning>) {
        (self.errors, self.tips)
    }
}

/// Outlet for formatted reports from `compile_to_functions`.
pub trait DiagnosticSink: fmt::Debug + Send + Sync {
    /// `context` names the component or caller the template belongs to.
    fn report(&self, message: &str, kind: DiagnosticKind, context: Option<&str>);
}

/// Sink that forwards to the `log` facade: errors at warn level, tips at
/// info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, message: &str, kind: DiagnosticKind, context: Option<&str>) {
        let context = context.map(|c| format!("\n\nfound in <{c}>")).unwrap_or_default();
        match kind {
            DiagnosticKind::Error => log::warn!(target: "template.compiler", "{message}{context}"),
            DiagnosticKind::Tip => log::info!(target: "template.compiler", "{message}{context}"),
        }
    }
}
