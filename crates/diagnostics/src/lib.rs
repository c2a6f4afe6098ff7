//! Diagnostics for the report-script toolchain.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Span`], and [`LineIndex`] types
//! used to report errors, warnings, and informational messages from the
//! script parser and the command interpreter. Diagnostic codes are defined
//! in the [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants and their explanations.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps byte offsets in a source string to line and column positions.
///
/// Lines and columns are **0-indexed** internally; add 1 when displaying to
/// users. Built in O(n), each lookup is O(log n) via binary search.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// Offsets past the end of the source clamp to the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line, col)
    }

    /// Byte offset of the start of the given 0-indexed line, if in bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// ── Severity / Span ──────────────────────────────────────────────────────

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error — the script cannot be applied.
    Error,
    /// Warning — a command degraded to a default or was skipped.
    Warn,
    /// Informational note.
    Info,
}

/// Byte span in the source script.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic message produced by the parser or interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"RPT0101"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Optional byte span in the source script that this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling; free-form key-value strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Shorthand for an `Info` diagnostic.
    pub fn info(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Info, message, span)
    }

    /// Attach machine-readable context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code,
    /// if available.
    pub fn explain(&self) -> Option<&'static str> {
        codes::explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LineIndex ────────────────────────────────────────────────────────

    #[test]
    fn line_index_maps_offsets() {
        let idx = LineIndex::new("SetJob<a.rpt>\nLogonServer<s$d>");
        assert_eq!(idx.line_count(), 2);
        assert_eq!(idx.line_col(0), (0, 0));
        assert_eq!(idx.line_col(12), (0, 12));
        assert_eq!(idx.line_col(14), (1, 0));
        assert_eq!(idx.line_start(1), Some(14));
        assert_eq!(idx.line_start(2), None);
    }

    #[test]
    fn line_index_empty_input() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_col(0), (0, 0));
    }

    #[test]
    fn line_index_offset_past_end_clamps() {
        let idx = LineIndex::new("ab");
        assert_eq!(idx.line_col(100), (0, 100));
    }

    // ── Span ────────────────────────────────────────────────────────────

    #[test]
    fn span_constructors() {
        let s = Span::new(5, 10);
        assert_eq!((s.start, s.end), (5, 10));
        let e = Span::empty(7);
        assert_eq!((e.start, e.end), (7, 7));
    }

    #[test]
    #[should_panic(expected = "Span end (3) < start (5)")]
    fn span_inverted_panics() {
        Span::new(5, 3);
    }

    // ── Diagnostic ──────────────────────────────────────────────────────

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(codes::MALFORMED_LINE, "missing '<' delimiter", None);
        assert_eq!(format!("{d}"), "error[RPT0101]: missing '<' delimiter");
    }

    #[test]
    fn diagnostic_serde_omits_empty_fields() {
        let d = Diagnostic::warn(codes::TABLE_NOT_FOUND, "no such table", None);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("span"), "None span should be omitted: {json}");
        assert!(
            !json.contains("context"),
            "None context should be omitted: {json}"
        );
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }

    #[test]
    fn diagnostic_context_round_trips() {
        let d = Diagnostic::warn(codes::UNKNOWN_COMMAND, "dropped line", Some(Span::new(0, 8)))
            .with_context(BTreeMap::from([("keyword".into(), "SetFoo".into())]));
        let json = serde_json::to_string(&d).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
        assert_eq!(back.context.unwrap().get("keyword").unwrap(), "SetFoo");
    }

    // ── codes::explain ──────────────────────────────────────────────────

    #[test]
    fn all_codes_have_explanations() {
        let all = [
            codes::MALFORMED_LINE,
            codes::UNKNOWN_COMMAND,
            codes::BAD_HEX,
            codes::BAD_NUMBER,
            codes::LOGON_TOO_SHORT,
            codes::PARAM_DEFAULTED,
            codes::TABLE_NOT_FOUND,
            codes::FIELD_NOT_FOUND,
            codes::PARAMETER_NOT_FOUND,
            codes::FORMULA_NOT_FOUND,
            codes::SORT_FIELD_OUT_OF_RANGE,
            codes::CONNECTIVITY_FAILED,
            codes::QUERY_NO_TABLES,
            codes::SUBREPORT_DEPTH_EXCEEDED,
            codes::REPORT_LOAD_FAILED,
            codes::QUERY_FAILED,
        ];
        for code in &all {
            assert!(
                codes::explain(code).is_some(),
                "diagnostic code {code} has no explain() entry"
            );
        }
    }

    #[test]
    fn explain_unknown_code_is_none() {
        assert!(codes::explain("RPT9999").is_none());
        let d = Diagnostic::error("RPT9999", "test", None);
        assert!(d.explain().is_none());
    }
}
