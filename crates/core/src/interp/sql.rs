//! Table-name extraction from SQL query text.
//!
//! The query command needs the names of the tables a query reads so the
//! fetched rows can be handed to the report keyed by table. This is not a
//! SQL parser: it lifts the `FROM` clause with a case-insensitive scan
//! and takes the first token of each comma-separated source, which is
//! enough for the flat `FROM a, b, c` queries the script format carries.

/// Extract table names from the `FROM` clause of `query`.
///
/// The clause runs from after the first `FROM` to the first `WHERE`, or
/// to the end of the text when there is none. Each comma-separated entry
/// contributes its first whitespace-delimited token (aliases are
/// dropped), with any surrounding double quotes stripped. A query with no
/// `FROM` yields no names.
pub fn extract_table_names(query: &str) -> Vec<String> {
    let upper = query.to_ascii_uppercase();
    let Some(from) = upper.find("FROM") else {
        return Vec::new();
    };
    let clause_start = from + "FROM".len();
    let clause_end = upper[clause_start..]
        .find("WHERE")
        .map_or(query.len(), |w| clause_start + w);

    query[clause_start..clause_end]
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .map(|token| token.trim_matches('"').to_owned())
        .filter(|name| !name.is_empty())
        .collect()
}
