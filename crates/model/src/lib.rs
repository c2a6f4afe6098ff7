//! Reference host for the report-script interpreter.
//!
//! Provides a JSON-backed [`MemoryReportModel`] implementing the core's
//! report-model capability, plus a [`StaticQueryGateway`] that answers
//! queries from canned responses. Together they let whole scripts run
//! deterministically with no report engine or database attached, which
//! is what the CLI's `run` command and the integration tests do.

#![warn(missing_docs)]

/// Serde document types for report definitions.
pub mod definition;
/// Canned-response query gateway.
pub mod gateway;
/// The in-memory report model.
pub mod host;

pub use definition::{
    FormulaDef, ParameterDef, ReportDefinition, ReportObjectDef, SectionDef, SortFieldDef,
    TableDef,
};
pub use gateway::StaticQueryGateway;
pub use host::{DocumentLogon, MemoryReportModel};
