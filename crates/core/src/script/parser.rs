//! Script parsing: raw lines → lexed lines → classified, ordered commands.

use super::command::{Command, CommandList, CommandTag};
use super::lexer::lex_line;
use crate::ctx;
use report_script_diagnostics::{Diagnostic, Span, codes};
use serde::Serialize;
use thiserror::Error;

/// Result of parsing a script.
#[derive(Debug, Serialize)]
pub struct ParseResult {
    /// The ordered command list.
    pub commands: CommandList,
    /// Non-fatal diagnostics (dropped unknown-keyword lines).
    pub diagnostics: Vec<Diagnostic>,
}

/// Fatal script parse failure. The whole script load aborts; no partial
/// command list is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A non-blank line had no `<` command delimiter.
    #[error("line {line}: missing command delimiter '<'")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// Byte span of the offending line.
        span: Span,
    },
}

/// Parse a whole script into an ordered command list.
///
/// Per line: blank and whitespace-only lines are ignored; a non-blank
/// line without `<` aborts the parse; a line whose keyword is not in the
/// command table is dropped with a warning diagnostic and contributes
/// nothing (not even a placeholder); every other line becomes a
/// [`Command`] inserted under the list's ordering rule. The result is
/// deterministic for a given script text.
pub fn parse_str(input: &str) -> Result<ParseResult, ParseError> {
    let mut commands = CommandList::new();
    let mut diagnostics = Vec::new();

    let mut offset = 0usize;
    for (line_idx, raw) in input.split('\n').enumerate() {
        let start = offset;
        offset += raw.len() + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            continue;
        }
        let span = Span::new(start, start + line.len());
        let Ok(lexed) = lex_line(line) else {
            return Err(ParseError::MalformedLine {
                line: line_idx + 1,
                span,
            });
        };
        let tag = CommandTag::classify(lexed.keyword);
        if tag == CommandTag::Unknown {
            diagnostics.push(
                Diagnostic::warn(
                    codes::UNKNOWN_COMMAND,
                    format!("unknown command keyword {:?}; line dropped", lexed.keyword),
                    Some(span),
                )
                .with_context(ctx!("keyword" => lexed.keyword)),
            );
            continue;
        }
        commands.insert(Command {
            tag,
            fields: lexed.fields,
            span,
        });
    }

    Ok(ParseResult {
        commands,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        let res = parse_str("\nSetJob<a.rpt>\n   \n\n").unwrap();
        assert_eq!(res.commands.len(), 1);
        assert!(res.diagnostics.is_empty());
    }

    #[test]
    fn malformed_line_aborts_with_position() {
        let err = parse_str("SetJob<a.rpt>\nnot a command\n").unwrap_err();
        let ParseError::MalformedLine { line, span } = err;
        assert_eq!(line, 2);
        assert_eq!(span, Span::new(14, 27));
    }

    #[test]
    fn crlf_terminators_are_tolerated() {
        let res = parse_str("SetJob<a.rpt>\r\nSetReportTitle<0x>\r\n").unwrap();
        assert_eq!(res.commands.len(), 2);
        assert_eq!(res.commands.get(0).unwrap().fields, vec!["a.rpt"]);
    }

    #[test]
    fn unknown_keyword_is_dropped_with_warning() {
        let res = parse_str("SetFoo<1,2>\nSetJob<a.rpt>\n").unwrap();
        assert_eq!(res.commands.len(), 1);
        assert_eq!(res.diagnostics.len(), 1);
        assert_eq!(res.diagnostics[0].id, codes::UNKNOWN_COMMAND);
        assert_eq!(
            res.diagnostics[0]
                .context
                .as_ref()
                .unwrap()
                .get("keyword")
                .unwrap(),
            "SetFoo"
        );
    }

    #[test]
    fn command_spans_index_into_the_source() {
        let source = "SetJob<a.rpt>\nSetReportTitle<0x>\n";
        let res = parse_str(source).unwrap();
        let title = res.commands.get(1).unwrap();
        assert_eq!(&source[title.span.start..title.span.end], "SetReportTitle<0x>");
    }
}
