//! Report-script core library.
//!
//! Parses the line-oriented template script that drives a report viewer
//! (`Keyword<field1,field2,...>` per line) and interprets the resulting
//! command list against a report-document model. The main entry points are
//! [`parse_str`] for parsing and [`interpret`] for applying a parsed
//! command list through the [`ReportModel`] and [`QueryGateway`] capability
//! interfaces — the core never owns windows, report engines, or database
//! connections itself.

#![warn(missing_docs)]

/// Shorthand for building a `BTreeMap<String, String>` diagnostic context.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}
pub(crate) use ctx;

/// Decoders for packed command payloads (parameter fields, logon info).
pub mod decode;
/// Hex text payload decoding.
pub mod hex;
/// The ordered-dispatch command interpreter.
pub mod interp;
/// Capability interfaces and shared value types.
pub mod model;
/// Script lexing, the command table, and the script parser.
pub mod script;

// ── Convenience re-exports ──────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Parser
pub use script::command::{Command, CommandList, CommandTag};
pub use script::parser::{ParseError, ParseResult, parse_str};

// Payload decoding
pub use decode::logon::LogonInfo;
pub use decode::param::ParameterField;
pub use hex::{DecodeError, TextWidth, decode_hex_text};

// Capability interfaces
pub use model::{
    ConnectionInfo, ModelError, QueryError, QueryGateway, ReportModel, ReportScope, RowSet,
    SortDirection,
};

// Interpreter
pub use interp::{InterpretError, MAX_SUBREPORT_DEPTH, RunReport, interpret};

/// Serialize any value as pretty JSON (for host/CLI dumps).
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
