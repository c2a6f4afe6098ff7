//! In-memory reference implementation of the report-model capability.
//!
//! Backed by a [`ReportDefinition`] document tree plus the runtime state
//! the interpreter mutates around it (logon, selection formula, window
//! title, data sources). Loading reads a JSON definition from disk, so a
//! script's `SetJob` line points at a `.json` file instead of a vendor
//! report format.

use crate::definition::{ReportDefinition, ReportObjectDef, SortFieldDef, TableDef};
use report_script_core::{
    ConnectionInfo, ModelError, ReportModel, ReportScope, RowSet, SortDirection,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;

/// Document-level logon credentials, as applied by a logon command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLogon {
    /// User id after defaulting.
    pub user_id: String,
    /// Password.
    pub password: String,
    /// Server name.
    pub server_name: String,
    /// Database name.
    pub database_name: String,
}

/// The reference report model: a definition tree plus runtime state.
#[derive(Debug, Default, Serialize)]
pub struct MemoryReportModel {
    /// The loaded definition (empty until a report is loaded).
    pub definition: ReportDefinition,
    /// Document logon, once applied.
    pub document_logon: Option<DocumentLogon>,
    /// Viewer selection formula, once set.
    pub selection_formula: Option<String>,
    /// Host window title, once set.
    pub window_title: Option<String>,
    /// Data sources handed to the report, keyed by table name.
    pub data_sources: BTreeMap<String, RowSet>,
}

impl MemoryReportModel {
    /// A model pre-loaded with `definition` (no `SetJob` needed).
    pub fn with_definition(definition: ReportDefinition) -> Self {
        Self {
            definition,
            ..Self::default()
        }
    }

    fn node(&self, scope: &ReportScope) -> Option<&ReportDefinition> {
        let mut node = &self.definition;
        for name in scope.path() {
            node = node.subreports.get(name)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, scope: &ReportScope) -> Option<&mut ReportDefinition> {
        let mut node = &mut self.definition;
        for name in scope.path() {
            node = node.subreports.get_mut(name)?;
        }
        Some(node)
    }

    fn table(&self, scope: &ReportScope, index: usize) -> Option<&TableDef> {
        self.node(scope)?.tables.get(index)
    }

    fn table_mut(&mut self, scope: &ReportScope, index: usize) -> Option<&mut TableDef> {
        self.node_mut(scope)?.tables.get_mut(index)
    }
}

impl ReportModel for MemoryReportModel {
    fn load(&mut self, path: &str) -> Result<(), ModelError> {
        let boxed = |e: Box<dyn std::error::Error + Send + Sync>| ModelError::Load {
            path: path.to_owned(),
            source: e,
        };
        let text = fs::read_to_string(path).map_err(|e| boxed(Box::new(e)))?;
        self.definition = serde_json::from_str(&text).map_err(|e| boxed(Box::new(e)))?;
        Ok(())
    }

    fn table_count(&self, scope: &ReportScope) -> usize {
        self.node(scope).map_or(0, |n| n.tables.len())
    }

    fn table_name(&self, scope: &ReportScope, index: usize) -> Option<String> {
        Some(self.table(scope, index)?.name.clone())
    }

    fn table_location(&self, scope: &ReportScope, index: usize) -> Option<String> {
        Some(self.table(scope, index)?.location.clone())
    }

    fn set_table_location(&mut self, scope: &ReportScope, index: usize, location: &str) -> bool {
        match self.table_mut(scope, index) {
            Some(table) => {
                table.location = location.to_owned();
                true
            }
            None => false,
        }
    }

    fn table_connection(&self, scope: &ReportScope, index: usize) -> Option<ConnectionInfo> {
        self.table(scope, index)?.connection.clone()
    }

    fn set_table_connection(
        &mut self,
        scope: &ReportScope,
        index: usize,
        connection: &ConnectionInfo,
    ) -> bool {
        match self.table_mut(scope, index) {
            Some(table) => {
                table.connection = Some(connection.clone());
                true
            }
            None => false,
        }
    }

    fn test_table_connectivity(&mut self, scope: &ReportScope, index: usize) -> bool {
        self.table(scope, index).is_some_and(|t| t.reachable)
    }

    fn subreport_names(&self, scope: &ReportScope) -> Vec<String> {
        let Some(node) = self.node(scope) else {
            return Vec::new();
        };
        node.sections
            .iter()
            .flat_map(|section| section.objects.iter())
            .filter_map(|object| match object {
                ReportObjectDef::Subreport { name } => Some(name.clone()),
                ReportObjectDef::Text { .. } => None,
            })
            .collect()
    }

    fn set_database_logon(&mut self, user: &str, password: &str, server: &str, database: &str) {
        self.document_logon = Some(DocumentLogon {
            user_id: user.to_owned(),
            password: password.to_owned(),
            server_name: server.to_owned(),
            database_name: database.to_owned(),
        });
    }

    fn sort_field_count(&self) -> usize {
        self.definition.sort_fields.len()
    }

    fn sort_field_name(&self, index: usize) -> Option<String> {
        Some(self.definition.sort_fields.get(index)?.field.clone())
    }

    fn set_sort_direction(&mut self, index: usize, direction: SortDirection) -> bool {
        match self.definition.sort_fields.get_mut(index) {
            Some(sort) => {
                sort.direction = direction;
                true
            }
            None => false,
        }
    }

    fn bind_sort_field(
        &mut self,
        index: usize,
        table: &str,
        field: &str,
        direction: SortDirection,
    ) -> bool {
        let resolves = self
            .definition
            .tables
            .iter()
            .any(|t| t.name == table && t.fields.iter().any(|f| f == field));
        if !resolves {
            return false;
        }
        match self.definition.sort_fields.get_mut(index) {
            Some(sort) => {
                *sort = SortFieldDef {
                    field: format!("{table}.{field}"),
                    direction,
                };
                true
            }
            None => false,
        }
    }

    fn set_parameter_value(&mut self, index: usize, current: &str, default: &str) -> bool {
        match self.definition.parameters.get_mut(index) {
            Some(parameter) => {
                parameter.current_values = vec![current.to_owned()];
                parameter.default_values = vec![default.to_owned()];
                true
            }
            None => false,
        }
    }

    fn formula_name(&self, name: &str) -> Option<String> {
        self.definition
            .formulas
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.name.clone())
    }

    fn set_formula_text(&mut self, name: &str, text: &str) -> bool {
        match self.definition.formulas.iter_mut().find(|f| f.name == name) {
            Some(formula) => {
                formula.text = text.to_owned();
                true
            }
            None => false,
        }
    }

    fn title(&self) -> Option<String> {
        self.definition.title.clone()
    }

    fn set_title(&mut self, title: &str) {
        self.definition.title = Some(title.to_owned());
    }

    fn set_selection_formula(&mut self, formula: &str) {
        self.selection_formula = Some(formula.to_owned());
    }

    fn set_window_title(&mut self, title: &str) {
        self.window_title = Some(title.to_owned());
    }

    fn set_data_source(&mut self, table: &str, rows: RowSet) {
        self.data_sources.insert(table.to_owned(), rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::SectionDef;

    fn nested() -> MemoryReportModel {
        let mut root = ReportDefinition {
            tables: vec![TableDef::named("Orders")],
            sections: vec![SectionDef {
                objects: vec![
                    ReportObjectDef::Text {
                        text: "header".into(),
                    },
                    ReportObjectDef::Subreport {
                        name: "Detail".into(),
                    },
                ],
            }],
            ..ReportDefinition::default()
        };
        root.subreports.insert(
            "Detail".into(),
            ReportDefinition {
                tables: vec![TableDef::named("Totals")],
                ..ReportDefinition::default()
            },
        );
        MemoryReportModel::with_definition(root)
    }

    #[test]
    fn scopes_address_nested_tables() {
        let model = nested();
        let root = ReportScope::root();
        assert_eq!(model.table_name(&root, 0).as_deref(), Some("Orders"));
        let detail = root.child("Detail");
        assert_eq!(model.table_name(&detail, 0).as_deref(), Some("Totals"));
        assert_eq!(model.table_count(&root.child("Missing")), 0);
    }

    #[test]
    fn subreport_names_follow_section_order() {
        let model = nested();
        assert_eq!(model.subreport_names(&ReportScope::root()), ["Detail"]);
        assert!(
            model
                .subreport_names(&ReportScope::root().child("Detail"))
                .is_empty()
        );
    }

    #[test]
    fn bind_sort_field_requires_a_resolvable_field() {
        let mut model = MemoryReportModel::with_definition(ReportDefinition {
            tables: vec![TableDef {
                fields: vec!["Amount".into()],
                ..TableDef::named("Orders")
            }],
            sort_fields: vec![SortFieldDef {
                field: "Customers.Name".into(),
                direction: SortDirection::Ascending,
            }],
            ..ReportDefinition::default()
        });
        assert!(!model.bind_sort_field(0, "Orders", "Total", SortDirection::Descending));
        assert!(model.bind_sort_field(0, "Orders", "Amount", SortDirection::Descending));
        assert_eq!(model.definition.sort_fields[0].field, "Orders.Amount");
        assert_eq!(
            model.definition.sort_fields[0].direction,
            SortDirection::Descending
        );
    }

    #[test]
    fn load_failure_names_the_path() {
        let mut model = MemoryReportModel::default();
        let err = model.load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
