//! Line lexing for the script micro-format.

use thiserror::Error;

/// A lexed script line: the command keyword and its raw payload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedLine<'a> {
    /// Text before the first `<`. May be empty.
    pub keyword: &'a str,
    /// Comma-split payload. Empty fields are preserved and nothing is
    /// trimmed at this stage.
    pub fields: Vec<String>,
}

/// A script line without the `<` command delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("missing command delimiter '<'")]
pub struct MalformedLine;

/// Split one script line into its keyword and payload fields.
///
/// The payload is everything between the first `<` and the line's final
/// character; the final character is always stripped as the closing `>`,
/// whatever it actually is. A line ending directly at the `<` has an
/// empty payload, which still lexes as a single empty field.
pub fn lex_line(line: &str) -> Result<LexedLine<'_>, MalformedLine> {
    let lt = line.find('<').ok_or(MalformedLine)?;
    let keyword = &line[..lt];
    let rest = &line[lt + 1..];
    let payload = match rest.char_indices().last() {
        Some((last, _)) => &rest[..last],
        None => "",
    };
    let fields = payload.split(',').map(str::to_owned).collect();
    Ok(LexedLine { keyword, fields })
}
