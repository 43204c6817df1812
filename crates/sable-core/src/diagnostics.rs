//! Recoverable, user-facing messages.
//!
//! Diagnostics travel alongside whatever output an emitter managed to
//! produce. Conditions that indicate a compiler defect are
//! [`EmitError`](crate::EmitError)s instead.

use std::collections::VecDeque;
use std::fmt;

/// A single diagnostic message.
///
/// ```
/// use sable_core::{Diagnostic, DiagnosticKind};
///
/// let diagnostic = Diagnostic::error("reference 'std.sbl' not found").at("std.sbl");
/// assert_eq!(diagnostic.kind, DiagnosticKind::Error);
/// assert_eq!(diagnostic.to_string(), "std.sbl: error: reference 'std.sbl' not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity level of this diagnostic
    pub kind: DiagnosticKind,
    /// The diagnostic message text
    pub message: String,
    /// File or symbol the diagnostic refers to, if any
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, message)
    }

    /// Attach a location.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The severity level of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The affected output was not produced.
    Error,
    /// Output was produced but may not be what the user intended.
    Warning,
    Info,
}

/// A FIFO queue of diagnostics.
///
/// ```
/// use sable_core::Diagnostics;
///
/// let mut diagnostics = Diagnostics::new();
/// diagnostics.warning("unused reference");
/// diagnostics.error("bad image");
/// assert!(diagnostics.has_errors());
/// assert_eq!(diagnostics.error_count(), 1);
/// assert_eq!(diagnostics.count(), 2);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    diagnostics: VecDeque<Diagnostic>,
    has_errors: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic to the back of the queue.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind == DiagnosticKind::Error {
            self.has_errors = true;
        }
        self.diagnostics.push_back(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::error(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::warning(message));
    }

    /// Move every diagnostic of `other` to the back of this queue.
    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.diagnostics {
            self.push(diagnostic);
        }
    }

    /// Returns `true` if the queue contains any error diagnostics.
    ///
    /// Tracked on insertion, so this does not scan the queue.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Takes the oldest diagnostic off the queue.
    pub fn pop(&mut self) -> Option<Diagnostic> {
        let diagnostic = self.diagnostics.pop_front();
        self.has_errors = self
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error);
        diagnostic
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.has_errors = false;
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Warning)
    }

    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::collections::vec_deque::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Error => write!(f, "error"),
            DiagnosticKind::Warning => write!(f, "warning"),
            DiagnosticKind::Info => write!(f, "info"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("first");
        diagnostics.error("second");
        assert_eq!(diagnostics.pop().map(|d| d.message), Some("first".into()));
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.pop().map(|d| d.message), Some("second".into()));
        assert!(!diagnostics.has_errors());
        assert!(diagnostics.pop().is_none());
    }

    #[test]
    fn extend_keeps_error_flag() {
        let mut a = Diagnostics::new();
        a.warning("w");
        let mut b = Diagnostics::new();
        b.error("e");
        a.extend(b);
        assert!(a.has_errors());
        assert_eq!(a.count(), 2);
        assert_eq!(a.warning_count(), 1);
    }

    #[test]
    fn display_one_per_line() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::error("bad image").at("lib.sbl"));
        diagnostics.warning("empty module");
        assert_eq!(
            diagnostics.to_string(),
            "lib.sbl: error: bad image\nwarning: empty module"
        );
    }
}
