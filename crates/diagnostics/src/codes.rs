//! Diagnostic ID constants for the report-script toolchain.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. IDs are stable once published: renumbering breaks
//! downstream tooling that filters on them.

// ── Parser (RPT01xx) ────────────────────────────────────────────────────

/// A script line has no `<` command delimiter. Fatal to the whole parse.
pub const MALFORMED_LINE: &str = "RPT0101";
/// A line's keyword matched no known command and was dropped.
pub const UNKNOWN_COMMAND: &str = "RPT0102";

// ── Decoding (RPT02xx) ──────────────────────────────────────────────────

/// A `0x`-prefixed hex payload could not be decoded to text.
pub const BAD_HEX: &str = "RPT0201";
/// A numeric field could not be parsed.
pub const BAD_NUMBER: &str = "RPT0202";
/// A `$`-delimited logon payload had fewer than two fields.
pub const LOGON_TOO_SHORT: &str = "RPT0203";
/// A parameter-field block failed to decode and was treated as defaults.
pub const PARAM_DEFAULTED: &str = "RPT0204";

// ── Lookups (RPT03xx) ───────────────────────────────────────────────────

/// No table matched the requested name or index.
pub const TABLE_NOT_FOUND: &str = "RPT0301";
/// A `{table.field}` reference did not resolve to a database field.
pub const FIELD_NOT_FOUND: &str = "RPT0302";
/// No parameter field exists at the requested index.
pub const PARAMETER_NOT_FOUND: &str = "RPT0303";
/// No formula field matched the requested name.
pub const FORMULA_NOT_FOUND: &str = "RPT0304";
/// A sort-field index was outside the document's sort-field count.
pub const SORT_FIELD_OUT_OF_RANGE: &str = "RPT0305";

// ── Connectivity and queries (RPT04xx) ──────────────────────────────────

/// A table connectivity test failed; remaining tables were left untouched.
pub const CONNECTIVITY_FAILED: &str = "RPT0401";
/// No table names could be extracted from a SQL query text.
pub const QUERY_NO_TABLES: &str = "RPT0402";

// ── Interpreter limits (RPT05xx) ────────────────────────────────────────

/// Subreport traversal exceeded the defensive depth bound.
pub const SUBREPORT_DEPTH_EXCEEDED: &str = "RPT0501";

// ── Fatal host failures (RPT06xx) ───────────────────────────────────────

/// A report definition could not be loaded into the model.
pub const REPORT_LOAD_FAILED: &str = "RPT0601";
/// The query-layer round trip (connect, execute, fetch) failed.
pub const QUERY_FAILED: &str = "RPT0602";

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    Some(match id {
        MALFORMED_LINE => {
            "Every script line must look like Keyword<field1,field2,...>. A line \
             without the '<' delimiter cannot be split into keyword and payload, \
             so the whole script load is aborted."
        }
        UNKNOWN_COMMAND => {
            "The keyword before '<' did not exactly match any command in the fixed \
             command table (matching is case-sensitive). The line contributes \
             nothing to the command list."
        }
        BAD_HEX => {
            "Hex payloads are '0x' followed by an even number of hex digits. \
             Payloads that are too short, odd-length, or contain non-hex \
             characters decode to nothing and the command degrades to a no-op."
        }
        BAD_NUMBER => "An integer or floating-point field failed to parse.",
        LOGON_TOO_SHORT => {
            "Logon payloads are server$database with optional $user$password. \
             Fewer than two '$'-separated fields cannot form a credential bundle."
        }
        PARAM_DEFAULTED => {
            "A sub-field of the 14-part parameter block failed to decode. Partial \
             records are never applied; the command was skipped."
        }
        TABLE_NOT_FOUND => {
            "The table name or index referenced by the command does not exist at \
             any searched report level. The mutation was skipped."
        }
        FIELD_NOT_FOUND => {
            "A bracketed {table.field} sort-field reference did not resolve; the \
             sort field was left unchanged."
        }
        PARAMETER_NOT_FOUND => "The decoded parameter index has no parameter field.",
        FORMULA_NOT_FOUND => {
            "No formula field with the requested name was found, or the looked-up \
             formula reported a different name."
        }
        SORT_FIELD_OUT_OF_RANGE => {
            "The 1-based sort-field index exceeds the document's sort-field count."
        }
        CONNECTIVITY_FAILED => {
            "A table's connectivity test failed after applying new connection \
             info. Iteration stops at the first failure; tables after it keep \
             their previous connection info."
        }
        QUERY_NO_TABLES => {
            "No table names could be extracted from between the FROM and WHERE \
             keywords of the query text, so no data source was set."
        }
        SUBREPORT_DEPTH_EXCEEDED => {
            "Subreport nesting exceeded the defensive recursion bound, which \
             usually indicates a subreport cycle in the report definition."
        }
        REPORT_LOAD_FAILED => {
            "The report model could not load the requested report definition. \
             Interpretation halts; effects of earlier commands remain applied."
        }
        QUERY_FAILED => {
            "The query layer failed to connect or to execute the query text. \
             Interpretation halts; effects of earlier commands remain applied."
        }
        _ => return None,
    })
}
