//! Ordered-dispatch command interpreter.
//!
//! Walks a [`CommandList`] and applies each command to the host's
//! [`ReportModel`], using the [`QueryGateway`] for the one command that
//! touches a database. Lookup misses and decode failures inside a single
//! command degrade to a warning diagnostic and skip that mutation; only
//! report loading, query execution, and runaway subreport nesting halt
//! the run.

pub mod sql;

use crate::ctx;
use crate::decode::logon::LogonInfo;
use crate::decode::param::ParameterField;
use crate::hex::{TextWidth, decode_hex_text};
use crate::model::{
    ConnectionInfo, ModelError, QueryError, QueryGateway, ReportModel, ReportScope, SortDirection,
};
use crate::script::command::{Command, CommandList, CommandTag};
use report_script_diagnostics::{Diagnostic, Span, codes};
use serde::Serialize;
use thiserror::Error;

/// Subreport nesting bound for the table-location search. The source
/// format has no cycle guard, so the walk is cut off here and reported
/// as fatal instead of recursing forever.
pub const MAX_SUBREPORT_DEPTH: usize = 16;

/// Outcome of a completed interpretation pass.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Number of commands applied.
    pub executed: usize,
    /// Warnings collected along the way (lookup misses, payloads that
    /// degraded to defaults).
    pub diagnostics: Vec<Diagnostic>,
}

/// Fatal interpretation failure. Effects already applied by earlier
/// commands stay in place; no rollback is performed.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// Loading a report definition failed.
    #[error("command {index}: report load failed")]
    Model {
        /// 0-based index of the failing command in the list.
        index: usize,
        /// The model-side cause.
        #[source]
        source: ModelError,
    },
    /// The query-layer round trip failed.
    #[error("command {index}: query failed")]
    Query {
        /// 0-based index of the failing command in the list.
        index: usize,
        /// The gateway-side cause.
        #[source]
        source: QueryError,
    },
    /// The subreport tree nests deeper than [`MAX_SUBREPORT_DEPTH`].
    #[error("command {index}: subreport nesting depth {depth} exceeds the supported limit")]
    SubreportDepth {
        /// 0-based index of the failing command in the list.
        index: usize,
        /// Depth at which the walk was cut off.
        depth: usize,
    },
}

impl InterpretError {
    /// Index of the command that halted the run.
    pub fn command_index(&self) -> usize {
        match self {
            InterpretError::Model { index, .. }
            | InterpretError::Query { index, .. }
            | InterpretError::SubreportDepth { index, .. } => *index,
        }
    }
}

/// A halt raised inside a handler, before the command index is known.
enum Halt {
    Model(ModelError),
    Query(QueryError),
    Depth(usize),
}

impl Halt {
    fn at(self, index: usize) -> InterpretError {
        match self {
            Halt::Model(source) => InterpretError::Model { index, source },
            Halt::Query(source) => InterpretError::Query { index, source },
            Halt::Depth(depth) => InterpretError::SubreportDepth { index, depth },
        }
    }
}

/// Apply a parsed command list to the host model, in order.
///
/// Command N's effects are visible before command N+1 begins; later
/// commands routinely depend on earlier ones (a report must be loaded
/// before its tables can be rebound, credentials must be applied before
/// the query command reuses them).
pub fn interpret<M: ReportModel, Q: QueryGateway>(
    commands: &CommandList,
    model: &mut M,
    gateway: &Q,
) -> Result<RunReport, InterpretError> {
    let mut interp = Interpreter {
        model,
        gateway,
        diags: Vec::new(),
    };
    for (index, command) in commands.iter().enumerate() {
        interp.apply(command).map_err(|halt| halt.at(index))?;
    }
    Ok(RunReport {
        executed: commands.len(),
        diagnostics: interp.diags,
    })
}

struct Interpreter<'a, M, Q> {
    model: &'a mut M,
    gateway: &'a Q,
    diags: Vec<Diagnostic>,
}

impl<M: ReportModel, Q: QueryGateway> Interpreter<'_, M, Q> {
    fn apply(&mut self, command: &Command) -> Result<(), Halt> {
        match command.tag {
            CommandTag::SetJob => self.set_job(command)?,
            CommandTag::SetNthTableLocation => self.set_nth_table_location(command),
            CommandTag::SetTableLocation => self.set_table_location(command)?,
            CommandTag::MapNthTable => self.map_nth_table(command),
            CommandTag::SetNthTableLogonInfo => self.set_nth_table_logon_info(command),
            CommandTag::LogonServer => self.logon_server(command),
            CommandTag::SetSqlQuery => self.set_sql_query(command)?,
            CommandTag::SetSelectionFormula => self.set_selection_formula(command),
            CommandTag::SetNthParameterField => self.set_nth_parameter_field(command),
            CommandTag::SetNthSortField => self.set_nth_sort_field(command),
            CommandTag::SetFormula => self.set_formula(command),
            CommandTag::SetReportTitle => self.set_report_title(command),
            CommandTag::OutputToWindow => self.output_to_window(command),
            // Recognized but unimplemented in the source command set.
            CommandTag::SetSubReportSelectionFormula
            | CommandTag::DeleteNthSortField
            | CommandTag::SetNthGroupSortField
            | CommandTag::DeleteNthGroupSortField => {}
            // The parser never emits Unknown.
            CommandTag::Unknown => {}
        }
        Ok(())
    }

    // ── Report loading ──────────────────────────────────────────────────

    fn set_job(&mut self, command: &Command) -> Result<(), Halt> {
        let Some(path) = command.fields.first() else {
            return Ok(());
        };
        self.model.load(path).map_err(Halt::Model)
    }

    // ── Table location commands ─────────────────────────────────────────

    fn set_nth_table_location(&mut self, command: &Command) {
        if command.fields.len() < 4 {
            return;
        }
        // fields[1] (a connection buffer) and fields[3] are carried by the
        // format but no handler consumes them.
        let Some(index) = self.parse_index(&command.fields[0], command.span) else {
            return;
        };
        if !self
            .model
            .set_table_location(&ReportScope::root(), index, &command.fields[2])
        {
            self.warn_no_table(index, command.span);
        }
    }

    fn set_table_location(&mut self, command: &Command) -> Result<(), Halt> {
        if command.fields.len() < 3 {
            return Ok(());
        }
        let old = command.fields[0].trim();
        let new = command.fields[1].trim();
        let root = ReportScope::root();
        if self.rename_table_here(&root, old, new) {
            return Ok(());
        }
        let propagate = command.fields[2].trim().parse::<i64>().is_ok_and(|v| v > 0);
        if propagate {
            let mut renamed = false;
            for name in self.model.subreport_names(&root) {
                renamed |= self.rename_table_below(&root.child(&name), old, new)?;
            }
            if renamed {
                return Ok(());
            }
        }
        self.diags.push(
            Diagnostic::warn(
                codes::TABLE_NOT_FOUND,
                format!("no table named {old:?} matched at any report level"),
                Some(command.span),
            )
            .with_context(ctx!("table" => old)),
        );
        Ok(())
    }

    /// Rename the first table at `scope` whose name matches `old`
    /// (case-insensitive), propagating the same rename to matching tables
    /// in the scope's direct subreports. Returns whether a match was found
    /// at this level.
    fn rename_table_here(&mut self, scope: &ReportScope, old: &str, new: &str) -> bool {
        for i in 0..self.model.table_count(scope) {
            let matched = self
                .model
                .table_name(scope, i)
                .is_some_and(|n| n.eq_ignore_ascii_case(old));
            if !matched {
                continue;
            }
            self.model.set_table_location(scope, i, new);
            for sub in self.model.subreport_names(scope) {
                let child = scope.child(&sub);
                for j in 0..self.model.table_count(&child) {
                    if self
                        .model
                        .table_name(&child, j)
                        .is_some_and(|n| n.eq_ignore_ascii_case(old))
                    {
                        self.model.set_table_location(&child, j, new);
                    }
                }
            }
            return true;
        }
        false
    }

    /// Depth-first table-location search under `scope`, bounded by
    /// [`MAX_SUBREPORT_DEPTH`].
    fn rename_table_below(
        &mut self,
        scope: &ReportScope,
        old: &str,
        new: &str,
    ) -> Result<bool, Halt> {
        if scope.depth() > MAX_SUBREPORT_DEPTH {
            return Err(Halt::Depth(scope.depth()));
        }
        if self.rename_table_here(scope, old, new) {
            return Ok(true);
        }
        let mut renamed = false;
        for name in self.model.subreport_names(scope) {
            renamed |= self.rename_table_below(&scope.child(&name), old, new)?;
        }
        Ok(renamed)
    }

    fn map_nth_table(&mut self, command: &Command) {
        if command.fields.len() < 2 {
            return;
        }
        let Some(number) = self.parse_number(&command.fields[0], command.span) else {
            return;
        };
        if number < 1 {
            self.warn_bad_table_number(number, command.span);
            return;
        }
        let index = (number - 1) as usize;
        if !self
            .model
            .set_table_location(&ReportScope::root(), index, command.fields[1].trim())
        {
            self.warn_no_table(index, command.span);
        }
    }

    // ── Logon commands ──────────────────────────────────────────────────

    fn set_nth_table_logon_info(&mut self, command: &Command) {
        if command.fields.len() < 3 {
            return;
        }
        let Some(number) = self.parse_number(&command.fields[0], command.span) else {
            return;
        };
        // fields[2] is a propagate flag the source format defines but
        // never acts on; it still has to parse as a number.
        if self.parse_number(&command.fields[2], command.span).is_none() {
            return;
        }
        let Some(logon) = self.decode_logon(&command.fields[1], command.span) else {
            return;
        };
        if number < 1 {
            self.warn_bad_table_number(number, command.span);
            return;
        }
        let index = (number - 1) as usize;
        let scope = ReportScope::root();
        let connection = ConnectionInfo::from_logon(&logon);
        if !self.model.set_table_connection(&scope, index, &connection) {
            self.warn_no_table(index, command.span);
            return;
        }
        // The rebound connection resolves its own schema, so a
        // `schema.table` location collapses to the bare table name.
        if let Some(location) = self.model.table_location(&scope, index)
            && let Some(dot) = location.find('.')
            && dot > 0
        {
            self.model
                .set_table_location(&scope, index, &location[dot + 1..]);
        }
        if !self.model.test_table_connectivity(&scope, index) {
            self.warn_connectivity(index, command.span);
        }
    }

    fn logon_server(&mut self, command: &Command) {
        let Some(payload) = command.fields.first() else {
            return;
        };
        let Some(logon) = self.decode_logon(payload, command.span) else {
            return;
        };
        let user = match logon.user_id.as_deref() {
            Some(user) if !user.is_empty() => user,
            _ => "dbo",
        };
        let password = logon.password.as_deref().unwrap_or_default();
        self.model
            .set_database_logon(user, password, &logon.server_name, &logon.database_name);

        let connection = ConnectionInfo::from_logon(&logon);
        let scope = ReportScope::root();
        for index in 0..self.model.table_count(&scope) {
            self.model.set_table_connection(&scope, index, &connection);
            if !self.model.test_table_connectivity(&scope, index) {
                // Remaining tables keep their previous connection info.
                self.warn_connectivity(index, command.span);
                break;
            }
        }
    }

    // ── Query and formula commands ──────────────────────────────────────

    fn set_sql_query(&mut self, command: &Command) -> Result<(), Halt> {
        let Some(payload) = command.fields.first() else {
            return Ok(());
        };
        let query = match decode_hex_text(payload, TextWidth::SingleByte) {
            Ok(text) => text,
            Err(err) => {
                self.warn_bad_hex(&err, command.span);
                return Ok(());
            }
        };
        let names = sql::extract_table_names(&query);
        let Some(first) = names.first() else {
            self.diags.push(Diagnostic::warn(
                codes::QUERY_NO_TABLES,
                "no table names resolved from the query's FROM clause".to_owned(),
                Some(command.span),
            ));
            return Ok(());
        };
        let connection = self
            .model
            .table_connection(&ReportScope::root(), 0)
            .unwrap_or_default();
        let rows = self
            .gateway
            .run_query(&connection, &query)
            .map_err(Halt::Query)?;
        self.model.set_data_source(first, rows);
        Ok(())
    }

    fn set_selection_formula(&mut self, command: &Command) {
        if command.fields.is_empty() {
            return;
        }
        // Formula text may contain commas, so the split payload is
        // rejoined verbatim.
        let formula = command.fields.join(",");
        self.model.set_selection_formula(&formula);
    }

    fn set_formula(&mut self, command: &Command) {
        if command.fields.len() < 2 {
            return;
        }
        let name = command.fields[0].trim();
        let text = match decode_hex_text(&command.fields[1], TextWidth::SingleByte) {
            Ok(text) => text,
            Err(err) => {
                self.warn_bad_hex(&err, command.span);
                return;
            }
        };
        match self.model.formula_name(name) {
            Some(reported) if reported == name => {
                if !self.model.set_formula_text(name, &text) {
                    self.warn_no_formula(name, command.span);
                }
            }
            // A lookup that reports a different name is left untouched.
            Some(_) => {}
            None => self.warn_no_formula(name, command.span),
        }
    }

    // ── Parameter and sort commands ─────────────────────────────────────

    fn set_nth_parameter_field(&mut self, command: &Command) {
        if command.fields.len() < 2 {
            return;
        }
        let record = match ParameterField::decode(&command.fields) {
            Ok(record) => record,
            Err(err) => {
                self.diags.push(
                    Diagnostic::warn(
                        codes::PARAM_DEFAULTED,
                        format!("parameter payload failed to decode, command skipped: {err}"),
                        Some(command.span),
                    )
                    .with_context(ctx!("error" => err.to_string())),
                );
                return;
            }
        };
        if record.parm_number < 0 {
            self.warn_no_parameter(record.parm_number, command.span);
            return;
        }
        let index = record.parm_number as usize;
        if !self
            .model
            .set_parameter_value(index, &record.current_value, &record.default_value)
        {
            self.warn_no_parameter(record.parm_number, command.span);
        }
    }

    fn set_nth_sort_field(&mut self, command: &Command) {
        if command.fields.len() < 3 {
            return;
        }
        let Some(number) = self.parse_number(&command.fields[0], command.span) else {
            return;
        };
        let Some(code) = self.parse_number(&command.fields[2], command.span) else {
            return;
        };
        let direction = if code == 0 {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        let count = self.model.sort_field_count();
        if number < 1 || number as usize > count {
            self.diags.push(
                Diagnostic::warn(
                    codes::SORT_FIELD_OUT_OF_RANGE,
                    format!("sort field {number} is outside the report's {count} sort fields"),
                    Some(command.span),
                )
                .with_context(ctx!("index" => number.to_string())),
            );
            return;
        }
        let index = (number - 1) as usize;
        let spec = command.fields[1].trim();
        if self.model.sort_field_name(index).as_deref() == Some(spec) {
            self.model.set_sort_direction(index, direction);
        } else if let Some(stripped) = spec.strip_prefix('{') {
            let inner = stripped.strip_suffix('}').unwrap_or(stripped);
            if let Some((table, field)) = inner.split_once('.')
                && !self.model.bind_sort_field(index, table, field, direction)
            {
                self.diags.push(
                    Diagnostic::warn(
                        codes::FIELD_NOT_FOUND,
                        format!("field {field:?} in table {table:?} did not resolve"),
                        Some(command.span),
                    )
                    .with_context(ctx!("table" => table, "field" => field)),
                );
            }
        }
    }

    // ── Title commands ──────────────────────────────────────────────────

    fn set_report_title(&mut self, command: &Command) {
        let Some(payload) = command.fields.first() else {
            return;
        };
        match decode_hex_text(payload, TextWidth::DoubleByte) {
            Ok(title) => self.model.set_title(&title),
            Err(err) => self.warn_bad_hex(&err, command.span),
        }
    }

    fn output_to_window(&mut self, command: &Command) {
        match self.model.title() {
            Some(title) if !title.is_empty() => self.model.set_window_title(&title),
            // An empty (but present) title suppresses the fallback.
            Some(_) => {}
            None => {
                if let Some(fallback) = command.fields.first()
                    && !fallback.is_empty()
                {
                    self.model.set_window_title(fallback);
                }
            }
        }
    }

    // ── Shared guards and warnings ──────────────────────────────────────

    fn parse_number(&mut self, raw: &str, span: Span) -> Option<i64> {
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.diags.push(
                    Diagnostic::warn(
                        codes::BAD_NUMBER,
                        format!("expected a number, got {raw:?}; command skipped"),
                        Some(span),
                    )
                    .with_context(ctx!("value" => raw)),
                );
                None
            }
        }
    }

    /// Parse a non-negative 0-based index.
    fn parse_index(&mut self, raw: &str, span: Span) -> Option<usize> {
        let number = self.parse_number(raw, span)?;
        if number < 0 {
            self.warn_bad_table_number(number, span);
            return None;
        }
        Some(number as usize)
    }

    fn decode_logon(&mut self, payload: &str, span: Span) -> Option<LogonInfo> {
        let logon = LogonInfo::decode(payload);
        if logon.is_none() {
            self.diags.push(Diagnostic::warn(
                codes::LOGON_TOO_SHORT,
                "logon payload has fewer than two `$`-separated fields; command skipped"
                    .to_owned(),
                Some(span),
            ));
        }
        logon
    }

    fn warn_bad_table_number(&mut self, number: i64, span: Span) {
        self.diags.push(
            Diagnostic::warn(
                codes::TABLE_NOT_FOUND,
                format!("table number {number} does not address any table"),
                Some(span),
            )
            .with_context(ctx!("number" => number.to_string())),
        );
    }

    fn warn_no_table(&mut self, index: usize, span: Span) {
        self.diags.push(
            Diagnostic::warn(
                codes::TABLE_NOT_FOUND,
                format!("no table at index {index}"),
                Some(span),
            )
            .with_context(ctx!("index" => index.to_string())),
        );
    }

    fn warn_no_formula(&mut self, name: &str, span: Span) {
        self.diags.push(
            Diagnostic::warn(
                codes::FORMULA_NOT_FOUND,
                format!("no formula field named {name:?}"),
                Some(span),
            )
            .with_context(ctx!("formula" => name)),
        );
    }

    fn warn_no_parameter(&mut self, number: i32, span: Span) {
        self.diags.push(
            Diagnostic::warn(
                codes::PARAMETER_NOT_FOUND,
                format!("no parameter field at index {number}"),
                Some(span),
            )
            .with_context(ctx!("index" => number.to_string())),
        );
    }

    fn warn_connectivity(&mut self, index: usize, span: Span) {
        self.diags.push(
            Diagnostic::warn(
                codes::CONNECTIVITY_FAILED,
                format!("connectivity test failed for table {index}"),
                Some(span),
            )
            .with_context(ctx!("index" => index.to_string())),
        );
    }

    fn warn_bad_hex(&mut self, err: &crate::hex::DecodeError, span: Span) {
        self.diags.push(
            Diagnostic::warn(
                codes::BAD_HEX,
                format!("hex payload failed to decode, command skipped: {err}"),
                Some(span),
            )
            .with_context(ctx!("error" => err.to_string())),
        );
    }
}
