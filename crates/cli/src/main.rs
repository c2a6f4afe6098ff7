mod render;

use std::collections::BTreeMap;
use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use report_script_core::{
    CommandList, InterpretError, ParseError, ParseResult, interpret, parse_str, to_pretty_json,
};
use report_script_diagnostics::{Diagnostic, Severity, codes};
use report_script_model::{MemoryReportModel, ReportDefinition, StaticQueryGateway};

use crate::render::{Format, print_summary, render_diagnostics};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "rpt",
    version,
    about = "Report script toolchain — parse, check, and run report template scripts"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse a script and print its command list.
    Parse { file: String },

    /// Syntax-check a script without applying it.
    Check { file: String },

    /// Run a script against the in-memory reference model.
    Run {
        /// Script file. When omitted the script is empty: zero commands
        /// run and the model is printed in its default state.
        file: Option<String>,
        /// Report definition JSON to preload. A script's own SetJob line
        /// can also load one from disk.
        #[arg(long)]
        model: Option<String>,
        /// Canned query responses JSON for the query gateway.
        #[arg(long)]
        data: Option<String>,
    },

    /// Explain a diagnostic ID (e.g. RPT0101).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Parse { file } => cmd_parse(&file, format)?,
        Cmd::Check { file } => cmd_check(&file, format)?,
        Cmd::Run { file, model, data } => {
            cmd_run(file.as_deref(), model.as_deref(), data.as_deref(), format)?;
        }
        Cmd::Explain { id } => cmd_explain(&id, format),
    }

    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_parse(file: &str, format: Format) -> Result<()> {
    let input = read_script(file)?;
    let res = parse_or_fail(&input, file, format);

    match format {
        Format::Json => {
            // Single valid JSON object to stdout.
            let out = serde_json::json!({
                "commands": res.commands,
                "diagnostics": res.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Command list to stdout, diagnostics to stderr.
            println!("{}", to_pretty_json(&res.commands)?);
            if !res.diagnostics.is_empty() {
                render_diagnostics(&input, file, &res.diagnostics, format);
                print_summary(&res.diagnostics);
            }
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

fn cmd_check(file: &str, format: Format) -> Result<()> {
    let input = read_script(file)?;
    let res = parse_or_fail(&input, file, format);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": true,
                "diagnostics": res.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics(&input, file, &res.diagnostics, format);
            print_summary(&res.diagnostics);
            eprintln!("script ok");
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

fn cmd_run(
    file: Option<&str>,
    model_path: Option<&str>,
    data_path: Option<&str>,
    format: Format,
) -> Result<()> {
    let (input, name) = match file {
        Some(file) => (read_script(file)?, file),
        None => (String::new(), "<empty>"),
    };
    let res = parse_or_fail(&input, name, format);

    let mut model = match model_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read report definition {path:?}"))?;
            let definition: ReportDefinition = serde_json::from_str(&text)
                .with_context(|| format!("invalid report definition {path:?}"))?;
            MemoryReportModel::with_definition(definition)
        }
        None => MemoryReportModel::default(),
    };
    let gateway = match data_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read query data {path:?}"))?;
            serde_json::from_str::<StaticQueryGateway>(&text)
                .with_context(|| format!("invalid query data {path:?}"))?
        }
        None => StaticQueryGateway::new(),
    };

    let mut diagnostics = res.diagnostics;
    let run = match interpret(&res.commands, &mut model, &gateway) {
        Ok(run) => run,
        Err(err) => {
            diagnostics.push(interpret_error_diagnostic(&err, &res.commands));
            fail(&input, name, &diagnostics, format);
        }
    };
    diagnostics.extend(run.diagnostics);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "executed": run.executed,
                "model": model,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            println!("{}", to_pretty_json(&model)?);
            render_diagnostics(&input, name, &diagnostics, format);
            print_summary(&diagnostics);
            eprintln!("ran {} commands", run.executed);
        }
    }

    exit_on_errors(&diagnostics);
    Ok(())
}

fn cmd_explain(id: &str, format: Format) {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": codes::explain(id),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&out).expect("explain JSON cannot fail")
            );
        }
        Format::Pretty => {
            // Explanation is the expected output — stdout, not stderr.
            if let Some(text) = codes::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn read_script(file: &str) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("failed to read script {file:?}"))
}

/// Parse the script, or render the fatal parse error and exit 1.
fn parse_or_fail(input: &str, filename: &str, format: Format) -> ParseResult {
    match parse_str(input) {
        Ok(res) => res,
        Err(err) => {
            let ParseError::MalformedLine { line, span } = err;
            let diagnostic = Diagnostic::error(
                codes::MALFORMED_LINE,
                format!("line {line}: missing command delimiter '<'"),
                Some(span),
            )
            .with_context(BTreeMap::from([("line".to_owned(), line.to_string())]));
            fail(input, filename, &[diagnostic], format);
        }
    }
}

/// Map a fatal interpretation error to a diagnostic anchored at the
/// failing command's source line.
fn interpret_error_diagnostic(err: &InterpretError, commands: &CommandList) -> Diagnostic {
    let span = commands.get(err.command_index()).map(|c| c.span);
    let (code, cause) = match err {
        InterpretError::Model { source, .. } => {
            (codes::REPORT_LOAD_FAILED, Some(source.to_string()))
        }
        InterpretError::Query { source, .. } => (codes::QUERY_FAILED, Some(source.to_string())),
        InterpretError::SubreportDepth { .. } => (codes::SUBREPORT_DEPTH_EXCEEDED, None),
    };
    let mut diagnostic = Diagnostic::error(code, err.to_string(), span);
    if let Some(cause) = cause {
        diagnostic = diagnostic.with_context(BTreeMap::from([("cause".to_owned(), cause)]));
    }
    diagnostic
}

/// Render failure diagnostics in the requested format and exit 1.
fn fail(input: &str, filename: &str, diagnostics: &[Diagnostic], format: Format) -> ! {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": false,
                "diagnostics": diagnostics,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&out).expect("failure JSON cannot fail")
            );
        }
        Format::Pretty => {
            render_diagnostics(input, filename, diagnostics, format);
            print_summary(diagnostics);
        }
    }
    process::exit(1);
}

/// Exit with code 1 if any diagnostic is an error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
    {
        process::exit(1);
    }
}
