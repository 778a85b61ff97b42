//! Non-fatal build events.
//!
//! The builder never logs through a global: it reports to a [`DiagnosticSink`]
//! handed to it by the caller. [`TracingSink`] forwards to `tracing`,
//! [`CollectingSink`] also keeps the events so callers can inspect them.

use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed or missing JSON field. The entry is skipped or defaulted.
    ParseError,
    /// Module type tag not found in the registry. The module is omitted.
    UnknownType,
    /// Anything else worth telling the patch author about.
    Warning,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub module: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, module: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            module: module.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn parse(module: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::ParseError, module, message)
    }

    pub fn warning(module: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, module, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::ParseError => "parse error",
            DiagnosticKind::UnknownType => "unknown type",
            DiagnosticKind::Warning => "warning",
        };
        match &self.module {
            Some(module) => write!(f, "{kind} [{module}]: {}", self.message),
            None => write!(f, "{kind}: {}", self.message),
        }
    }
}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

fn trace(diagnostic: &Diagnostic) {
    tracing::warn!(
        kind = ?diagnostic.kind,
        module = diagnostic.module.as_deref().unwrap_or(""),
        "{}",
        diagnostic.message
    );
}

#[derive(Default, Clone, Copy, Debug)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        trace(&diagnostic);
    }
}

#[derive(Default, Debug)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        trace(&diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
