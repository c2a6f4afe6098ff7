//! Capability interfaces the interpreter drives.
//!
//! The core never owns the report document, a window, or a database
//! connection. The host supplies a [`ReportModel`] (the live
//! report/document state) and a [`QueryGateway`] (the connectivity
//! collaborator used only by the SQL query command); the interpreter
//! expresses every side effect as a call through these traits.

use crate::decode::logon::LogonInfo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Value types ─────────────────────────────────────────────────────────

/// Connection descriptor applied to tables and the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Server (or DSN) name.
    pub server_name: String,
    /// Database name.
    pub database_name: String,
    /// User id; empty when not supplied.
    pub user_id: String,
    /// Password; empty when not supplied.
    pub password: String,
}

impl ConnectionInfo {
    /// Build connection info from decoded logon credentials.
    pub fn from_logon(logon: &LogonInfo) -> Self {
        Self {
            server_name: logon.server_name.clone(),
            database_name: logon.database_name.clone(),
            user_id: logon.user_id.clone().unwrap_or_default(),
            password: logon.password.clone().unwrap_or_default(),
        }
    }
}

/// Tabular query result handed to the report as its data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSet {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Rows of stringly typed cells, one `Vec` per row.
    pub rows: Vec<Vec<String>>,
}

/// Sort order for a report sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Addresses one report level: the root document or a nested subreport.
///
/// Elements are subreport names, outermost first; the root is the empty
/// path. Scopes are cheap snapshots — the interpreter builds them while
/// walking the section tree rather than holding live subreport handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportScope {
    path: Vec<String>,
}

impl ReportScope {
    /// The root document.
    pub fn root() -> Self {
        Self::default()
    }

    /// The scope of a subreport nested directly under this one.
    pub fn child(&self, subreport: &str) -> Self {
        let mut path = self.path.clone();
        path.push(subreport.to_owned());
        Self { path }
    }

    /// Subreport names from the root down, outermost first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Nesting depth; 0 for the root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Whether this scope is the root document.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Failure in the report-model collaborator.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Loading a report definition failed.
    #[error("failed to load report definition {path:?}")]
    Load {
        /// The path or identifier that was requested.
        path: String,
        /// The host-side cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failure in the query-layer collaborator.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Opening the connection failed.
    #[error("connection to {server:?} failed: {message}")]
    Connect {
        /// Server the connection was attempted against.
        server: String,
        /// Human-readable cause.
        message: String,
    },
    /// The query itself failed to execute.
    #[error("query execution failed: {message}")]
    Execute {
        /// Human-readable cause.
        message: String,
    },
}

// ── Capability traits ───────────────────────────────────────────────────

/// The live report/document state the interpreter mutates.
///
/// Methods that address a table, field, or parameter return `false` when
/// the target does not exist; the interpreter records a diagnostic and
/// moves on. Only [`ReportModel::load`] fails hard. The model is treated
/// as exclusively owned by the interpreter for the duration of a run.
pub trait ReportModel {
    /// Load the report definition at `path` into the model.
    fn load(&mut self, path: &str) -> Result<(), ModelError>;

    /// Number of tables at the given report level.
    fn table_count(&self, scope: &ReportScope) -> usize;

    /// Logical name of the table at `index`, if it exists.
    fn table_name(&self, scope: &ReportScope, index: usize) -> Option<String>;

    /// Current location of the table at `index`, if it exists.
    fn table_location(&self, scope: &ReportScope, index: usize) -> Option<String>;

    /// Set the location of the table at `index`.
    fn set_table_location(&mut self, scope: &ReportScope, index: usize, location: &str) -> bool;

    /// Current connection info of the table at `index`, once one has been
    /// applied.
    fn table_connection(&self, scope: &ReportScope, index: usize) -> Option<ConnectionInfo>;

    /// Replace the connection info of the table at `index`.
    fn set_table_connection(
        &mut self,
        scope: &ReportScope,
        index: usize,
        connection: &ConnectionInfo,
    ) -> bool;

    /// Test connectivity of the table at `index` with its current
    /// connection info.
    fn test_table_connectivity(&mut self, scope: &ReportScope, index: usize) -> bool;

    /// Names of subreports placed in this level's section tree, in
    /// section order.
    fn subreport_names(&self, scope: &ReportScope) -> Vec<String>;

    /// Apply database logon credentials at the document level.
    fn set_database_logon(&mut self, user: &str, password: &str, server: &str, database: &str);

    /// Number of sort fields on the root document.
    fn sort_field_count(&self) -> usize;

    /// Name of the database field bound to the sort field at `index`.
    fn sort_field_name(&self, index: usize) -> Option<String>;

    /// Update the direction of the sort field at `index` in place.
    fn set_sort_direction(&mut self, index: usize, direction: SortDirection) -> bool;

    /// Re-bind the sort field at `index` to `table`.`field` with the
    /// given direction. Returns `false` when the field reference does not
    /// resolve.
    fn bind_sort_field(
        &mut self,
        index: usize,
        table: &str,
        field: &str,
        direction: SortDirection,
    ) -> bool;

    /// Replace the current and default value collections of the parameter
    /// at `index` with one value each.
    fn set_parameter_value(&mut self, index: usize, current: &str, default: &str) -> bool;

    /// The name a formula-field lookup reports for `name`, if any.
    fn formula_name(&self, name: &str) -> Option<String>;

    /// Overwrite the text of the formula field named `name`.
    fn set_formula_text(&mut self, name: &str, text: &str) -> bool;

    /// Document title metadata.
    fn title(&self) -> Option<String>;

    /// Set the document title metadata.
    fn set_title(&mut self, title: &str);

    /// Set the viewer's record selection formula.
    fn set_selection_formula(&mut self, formula: &str);

    /// Set the host window's display title.
    fn set_window_title(&mut self, title: &str);

    /// Hand the report a tabular data source keyed by table name.
    fn set_data_source(&mut self, table: &str, rows: RowSet);
}

/// The database/ODBC connectivity collaborator, used exclusively by the
/// SQL query command. Connection acquisition and release are scoped
/// inside one call: the connection is closed on both success and failure
/// before the call returns.
pub trait QueryGateway {
    /// Open a connection described by `connection`, execute `query`
    /// literally, and return the fetched rows.
    fn run_query(&self, connection: &ConnectionInfo, query: &str) -> Result<RowSet, QueryError>;
}
