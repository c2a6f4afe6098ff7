//! The fixed command table and the command value types.

use report_script_diagnostics::Span;
use serde::Serialize;

/// Tag identifying one script command within the fixed, closed command
/// set. There is no open extension point: keywords outside this table
/// classify as [`CommandTag::Unknown`] and never survive parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandTag {
    /// Keyword not present in the command table; dropped at parse time.
    Unknown,
    /// Load a report definition into the model.
    SetJob,
    /// Set the location of the table at a 0-based index.
    SetNthTableLocation,
    /// Rename a table by name, propagating into subreports.
    SetTableLocation,
    /// Map a 1-based table index to a location string.
    MapNthTable,
    /// Rebind one table's connection info from a logon payload.
    SetNthTableLogonInfo,
    /// Apply logon credentials to the document and every table.
    LogonServer,
    /// Execute a SQL query and set the result as the data source.
    SetSqlQuery,
    /// Set the viewer's record selection formula.
    SetSelectionFormula,
    /// Recognized but unimplemented.
    SetSubReportSelectionFormula,
    /// Replace one parameter field's current/default values.
    SetNthParameterField,
    /// Update or re-bind one sort field.
    SetNthSortField,
    /// Recognized but unimplemented.
    DeleteNthSortField,
    /// Recognized but unimplemented.
    SetNthGroupSortField,
    /// Recognized but unimplemented.
    DeleteNthGroupSortField,
    /// Overwrite a named formula field's text.
    SetFormula,
    /// Set the document title metadata.
    SetReportTitle,
    /// Push the document title to the host window.
    OutputToWindow,
}

impl CommandTag {
    /// Classify a keyword with an exact, case-sensitive table lookup.
    pub fn classify(keyword: &str) -> Self {
        match keyword {
            "SetJob" => CommandTag::SetJob,
            "SetNthTableLocation" => CommandTag::SetNthTableLocation,
            "SetTableLocation" => CommandTag::SetTableLocation,
            "MapNthTable" => CommandTag::MapNthTable,
            "SetNthTableLogonInfo" => CommandTag::SetNthTableLogonInfo,
            "LogonServer" => CommandTag::LogonServer,
            "SetSQLQuery" => CommandTag::SetSqlQuery,
            "SetSelectionFormula" => CommandTag::SetSelectionFormula,
            "SetSubReportSelectionFormula" => CommandTag::SetSubReportSelectionFormula,
            "SetNthParameterField" => CommandTag::SetNthParameterField,
            "SetNthSortField" => CommandTag::SetNthSortField,
            "DeleteNthSortField" => CommandTag::DeleteNthSortField,
            "SetNthGroupSortField" => CommandTag::SetNthGroupSortField,
            "DeleteNthGroupSortField" => CommandTag::DeleteNthGroupSortField,
            "SetFormula" => CommandTag::SetFormula,
            "SetReportTitle" => CommandTag::SetReportTitle,
            "OutputToWindow" => CommandTag::OutputToWindow,
            _ => CommandTag::Unknown,
        }
    }

    /// The script keyword for this tag (`None` for [`CommandTag::Unknown`]).
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            CommandTag::Unknown => return None,
            CommandTag::SetJob => "SetJob",
            CommandTag::SetNthTableLocation => "SetNthTableLocation",
            CommandTag::SetTableLocation => "SetTableLocation",
            CommandTag::MapNthTable => "MapNthTable",
            CommandTag::SetNthTableLogonInfo => "SetNthTableLogonInfo",
            CommandTag::LogonServer => "LogonServer",
            CommandTag::SetSqlQuery => "SetSQLQuery",
            CommandTag::SetSelectionFormula => "SetSelectionFormula",
            CommandTag::SetSubReportSelectionFormula => "SetSubReportSelectionFormula",
            CommandTag::SetNthParameterField => "SetNthParameterField",
            CommandTag::SetNthSortField => "SetNthSortField",
            CommandTag::DeleteNthSortField => "DeleteNthSortField",
            CommandTag::SetNthGroupSortField => "SetNthGroupSortField",
            CommandTag::DeleteNthGroupSortField => "DeleteNthGroupSortField",
            CommandTag::SetFormula => "SetFormula",
            CommandTag::SetReportTitle => "SetReportTitle",
            CommandTag::OutputToWindow => "OutputToWindow",
        })
    }
}

/// One decoded, classified script instruction. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    /// The classified command tag. Never [`CommandTag::Unknown`] inside a
    /// [`CommandList`].
    pub tag: CommandTag,
    /// The comma-split payload, order-significant, possibly containing
    /// empty strings.
    pub fields: Vec<String>,
    /// Byte span of the source line the command came from.
    pub span: Span,
}

/// Ordered command sequence. Insertion order is script order except for
/// one rule: the SQL query command is forced to index 1 so that it always
/// immediately follows the first accepted command (or opens the list when
/// it is the first accepted command itself).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandList {
    items: Vec<Command>,
}

impl CommandList {
    /// An empty command list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one command per the ordering rule.
    pub fn insert(&mut self, command: Command) {
        if command.tag == CommandTag::SetSqlQuery {
            let at = self.items.len().min(1);
            self.items.insert(at, command);
        } else {
            self.items.push(command);
        }
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list holds no commands.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The command at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Command> {
        self.items.get(index)
    }

    /// Iterate the commands in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.items.iter()
    }

    /// The commands as a slice.
    pub fn as_slice(&self) -> &[Command] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
