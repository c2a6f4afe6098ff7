//! Serde-backed report definition documents.
//!
//! A definition is the static description a `SetJob` command loads: the
//! tables, sort fields, formulas, parameters, and section layout of one
//! report, with nested definitions for its subreports. Every field
//! defaults, so minimal JSON documents stay minimal.

use report_script_core::{ConnectionInfo, SortDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One report level: the whole document, or one subreport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// Document title metadata.
    #[serde(default)]
    pub title: Option<String>,
    /// Database tables, in report order.
    #[serde(default)]
    pub tables: Vec<TableDef>,
    /// Sort fields, in application order.
    #[serde(default)]
    pub sort_fields: Vec<SortFieldDef>,
    /// Formula fields.
    #[serde(default)]
    pub formulas: Vec<FormulaDef>,
    /// Parameter fields, positionally indexed.
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    /// Layout sections; subreport placements live here.
    #[serde(default)]
    pub sections: Vec<SectionDef>,
    /// Nested definitions, keyed by subreport name.
    #[serde(default)]
    pub subreports: BTreeMap<String, ReportDefinition>,
}

/// One database table of a report level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Logical table name.
    pub name: String,
    /// Physical location the table is bound to.
    #[serde(default)]
    pub location: String,
    /// Field names available for sort-field binding.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Connection info, once one has been applied.
    #[serde(default)]
    pub connection: Option<ConnectionInfo>,
    /// Whether connectivity tests against this table succeed.
    #[serde(default = "default_true")]
    pub reachable: bool,
}

impl TableDef {
    /// A reachable table whose location equals its name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            location: name.to_owned(),
            fields: Vec::new(),
            connection: None,
            reachable: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One sort field, bound to a `table.field` name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortFieldDef {
    /// Full field name, `table.field`.
    pub field: String,
    /// Sort order.
    #[serde(default = "default_direction")]
    pub direction: SortDirection,
}

fn default_direction() -> SortDirection {
    SortDirection::Ascending
}

/// One formula field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaDef {
    /// Formula name, matched exactly.
    pub name: String,
    /// Formula body text.
    #[serde(default)]
    pub text: String,
}

/// One parameter field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Parameter name.
    #[serde(default)]
    pub name: String,
    /// Current value collection.
    #[serde(default)]
    pub current_values: Vec<String>,
    /// Default value collection.
    #[serde(default)]
    pub default_values: Vec<String>,
}

/// One layout section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionDef {
    /// Report objects placed in the section, in order.
    #[serde(default)]
    pub objects: Vec<ReportObjectDef>,
}

/// One report object inside a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportObjectDef {
    /// Static text.
    Text {
        /// The text content.
        text: String,
    },
    /// A subreport placement; `name` keys into
    /// [`ReportDefinition::subreports`].
    Subreport {
        /// Subreport name.
        name: String,
    },
}
