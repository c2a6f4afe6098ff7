//! Whole-script runs against the reference host.

use report_script_core::{InterpretError, ReportModel, RowSet, SortDirection, interpret, parse_str};
use report_script_diagnostics::codes;
use report_script_model::{
    MemoryReportModel, ReportDefinition, ReportObjectDef, SectionDef, SortFieldDef,
    StaticQueryGateway, TableDef,
};
use std::io::Write;

fn ascii_hex(text: &str) -> String {
    format!(
        "0x{}",
        text.bytes().map(|b| format!("{b:02X}")).collect::<String>()
    )
}

fn utf16_hex(text: &str) -> String {
    format!(
        "0x{}",
        text.encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .map(|b| format!("{b:02X}"))
            .collect::<String>()
    )
}

fn run_script(
    script: &str,
    model: &mut MemoryReportModel,
    gateway: &StaticQueryGateway,
) -> report_script_core::RunReport {
    let parsed = parse_str(script).unwrap();
    interpret(&parsed.commands, model, gateway).unwrap()
}

#[test]
fn full_script_drives_the_model_end_to_end() {
    let definition = serde_json::json!({
        "tables": [{"name": "Orders", "location": "Orders"}],
        "formulas": [{"name": "Total", "text": "0"}],
        "sort_fields": [{"field": "Orders.Amount"}]
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{definition}").unwrap();
    let path = file.path().to_str().unwrap().to_owned();

    let query = "SELECT * FROM Orders WHERE Amount > 0";
    let gateway = StaticQueryGateway::new().with_response(
        query,
        RowSet {
            columns: vec!["Amount".into()],
            rows: vec![vec!["12".into()]],
        },
    );

    let script = format!(
        "SetJob<{path}>\n\
         LogonServer<srv$db$sa$secret>\n\
         SetSQLQuery<{}>\n\
         SetFormula<Total,{}>\n\
         SetReportTitle<{}>\n\
         OutputToWindow<fallback>\n\
         SetSelectionFormula<{{Orders.Amount}} > 0>\n",
        ascii_hex(query),
        ascii_hex("Sum({Orders.Amount})"),
        utf16_hex("Order Summary"),
    );

    let mut model = MemoryReportModel::default();
    let report = run_script(&script, &mut model, &gateway);

    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(report.executed, 7);

    let logon = model.document_logon.as_ref().unwrap();
    assert_eq!(logon.user_id, "sa");
    assert_eq!(logon.server_name, "srv");
    assert_eq!(model.definition.formulas[0].text, "Sum({Orders.Amount})");
    assert_eq!(model.definition.title.as_deref(), Some("Order Summary"));
    assert_eq!(model.window_title.as_deref(), Some("Order Summary"));
    assert_eq!(model.selection_formula.as_deref(), Some("{Orders.Amount} > 0"));
    assert_eq!(model.data_sources["Orders"].rows, vec![vec!["12".to_owned()]]);
    assert_eq!(
        model.definition.tables[0].connection.as_ref().unwrap().user_id,
        "sa"
    );
}

#[test]
fn sql_query_is_applied_right_after_the_first_command() {
    // The query rides at the end of the script but must run before the
    // formula mutation that follows the first command.
    let query = "SELECT * FROM Orders";
    let gateway = StaticQueryGateway::new().with_response(query, RowSet::default());
    let mut model = MemoryReportModel::with_definition(ReportDefinition {
        tables: vec![TableDef::named("Orders")],
        ..ReportDefinition::default()
    });
    let script = format!(
        "SetReportTitle<{}>\nSetSelectionFormula<x>\nSetSQLQuery<{}>\n",
        utf16_hex("T"),
        ascii_hex(query),
    );
    let parsed = parse_str(&script).unwrap();
    assert_eq!(parsed.commands.get(1).unwrap().fields, [ascii_hex(query)]);
    let report = interpret(&parsed.commands, &mut model, &gateway).unwrap();
    assert!(report.diagnostics.is_empty());
    assert!(model.data_sources.contains_key("Orders"));
}

#[test]
fn table_rename_descends_through_nested_subreports() {
    let inner = ReportDefinition {
        tables: vec![TableDef::named("Totals")],
        ..ReportDefinition::default()
    };
    let mut middle = ReportDefinition {
        sections: vec![SectionDef {
            objects: vec![ReportObjectDef::Subreport {
                name: "Inner".into(),
            }],
        }],
        ..ReportDefinition::default()
    };
    middle.subreports.insert("Inner".into(), inner);
    let mut root = ReportDefinition {
        tables: vec![TableDef::named("Orders")],
        sections: vec![SectionDef {
            objects: vec![ReportObjectDef::Subreport {
                name: "Middle".into(),
            }],
        }],
        ..ReportDefinition::default()
    };
    root.subreports.insert("Middle".into(), middle);

    let mut model = MemoryReportModel::with_definition(root);
    let report = run_script(
        "SetTableLocation<totals,dbo.Totals,1>\n",
        &mut model,
        &StaticQueryGateway::new(),
    );
    assert!(report.diagnostics.is_empty());
    assert_eq!(
        model.definition.subreports["Middle"].subreports["Inner"].tables[0].location,
        "dbo.Totals"
    );
}

#[test]
fn rename_without_propagate_flag_stays_at_the_top() {
    let mut root = ReportDefinition {
        sections: vec![SectionDef {
            objects: vec![ReportObjectDef::Subreport {
                name: "Detail".into(),
            }],
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
    let mut model = MemoryReportModel::with_definition(root);
    let report = run_script(
        "SetTableLocation<Totals,dbo.Totals,0>\n",
        &mut model,
        &StaticQueryGateway::new(),
    );
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].id, codes::TABLE_NOT_FOUND);
    assert_eq!(
        model.definition.subreports["Detail"].tables[0].location,
        "Totals"
    );
}

#[test]
fn runaway_subreport_nesting_is_fatal() {
    // 20 nested levels, none containing the requested table.
    let mut node = ReportDefinition::default();
    for _ in 0..20 {
        let mut parent = ReportDefinition {
            sections: vec![SectionDef {
                objects: vec![ReportObjectDef::Subreport { name: "S".into() }],
            }],
            ..ReportDefinition::default()
        };
        parent.subreports.insert("S".into(), node);
        node = parent;
    }
    let mut model = MemoryReportModel::with_definition(node);
    let parsed = parse_str("SetTableLocation<Missing,X,1>\n").unwrap();
    let err = interpret(&parsed.commands, &mut model, &StaticQueryGateway::new()).unwrap_err();
    assert!(matches!(
        err,
        InterpretError::SubreportDepth { index: 0, depth: 17 }
    ));
}

#[test]
fn connection_refusal_halts_the_query_command() {
    let query = "SELECT * FROM Orders";
    let mut model = MemoryReportModel::with_definition(ReportDefinition {
        tables: vec![TableDef::named("Orders")],
        ..ReportDefinition::default()
    });
    let script = format!("SetSQLQuery<{}>\n", ascii_hex(query));
    let parsed = parse_str(&script).unwrap();
    let err = interpret(
        &parsed.commands,
        &mut model,
        &StaticQueryGateway::refusing_connections(),
    )
    .unwrap_err();
    assert!(matches!(err, InterpretError::Query { index: 0, .. }));
    assert!(model.data_sources.is_empty());
}

#[test]
fn unreachable_table_stops_the_logon_sweep() {
    let mut model = MemoryReportModel::with_definition(ReportDefinition {
        tables: vec![
            TableDef {
                reachable: false,
                ..TableDef::named("Orders")
            },
            TableDef::named("Customers"),
        ],
        ..ReportDefinition::default()
    });
    let report = run_script(
        "LogonServer<srv$db>\n",
        &mut model,
        &StaticQueryGateway::new(),
    );
    assert_eq!(report.diagnostics[0].id, codes::CONNECTIVITY_FAILED);
    assert!(model.definition.tables[0].connection.is_some());
    assert!(model.definition.tables[1].connection.is_none());
}

#[test]
fn sort_field_commands_update_the_definition() {
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
    let report = run_script(
        "SetNthSortField<1,{Orders.Amount},1>\n",
        &mut model,
        &StaticQueryGateway::new(),
    );
    assert!(report.diagnostics.is_empty());
    assert_eq!(model.definition.sort_fields[0].field, "Orders.Amount");
    assert_eq!(
        model.definition.sort_fields[0].direction,
        SortDirection::Descending
    );
}

#[test]
fn parameter_command_replaces_value_collections() {
    let mut model = MemoryReportModel::with_definition(ReportDefinition {
        parameters: vec![
            report_script_model::ParameterDef {
                name: "Region".into(),
                current_values: vec!["old".into(), "older".into()],
                default_values: vec![],
            },
        ],
        ..ReportDefinition::default()
    });
    let block = [
        utf16_hex("North"),
        "1".into(),
        utf16_hex("All"),
        "1".into(),
        "0".into(),
        utf16_hex(""),
        "0".into(),
        "0".into(),
        "0".into(),
        utf16_hex("Region"),
        "0".into(),
        utf16_hex(""),
        utf16_hex(""),
        "0".into(),
    ]
    .join(";");
    let report = run_script(
        &format!("SetNthParameterField<1,{block}>\n"),
        &mut model,
        &StaticQueryGateway::new(),
    );
    assert!(report.diagnostics.is_empty());
    assert_eq!(model.definition.parameters[0].current_values, ["North"]);
    assert_eq!(model.definition.parameters[0].default_values, ["All"]);
}

#[test]
fn set_job_failure_reports_the_model_error() {
    let mut model = MemoryReportModel::default();
    let parsed = parse_str("SetJob</no/such/definition.json>\n").unwrap();
    let err = interpret(&parsed.commands, &mut model, &StaticQueryGateway::new()).unwrap_err();
    assert!(matches!(err, InterpretError::Model { index: 0, .. }));
}

#[test]
fn loading_a_definition_resets_previous_tables() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::json!({"tables": [{"name": "New"}]})).unwrap();
    let mut model = MemoryReportModel::with_definition(ReportDefinition {
        tables: vec![TableDef::named("Old")],
        ..ReportDefinition::default()
    });
    model.load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(model.definition.tables.len(), 1);
    assert_eq!(model.definition.tables[0].name, "New");
}
