//! CLI rendering for the read-side commands.
//!
//! JSON and YAML emit the data unchanged; there is no response envelope.
//! Table output is shaped per type: lists go through [`TableView`], and
//! single records are flattened into field/value rows.

use crate::core::error::{ExitCode, GatehouseError};
use crate::core::intent::Intent;
use crate::core::trace::TraceEntry;
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// Machine-readable JSON format.
    Json,
    /// Machine-readable YAML format.
    Yaml,
}

/// Table projection for list-shaped command output.
pub trait TableView {
    /// Column headers, in display order.
    fn headers() -> &'static [&'static str];
    /// One row of cells, matching [`TableView::headers`].
    fn row(&self) -> Vec<String>;
}

impl TableView for Intent {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "STATUS", "SCOPE"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.status.to_string(),
            self.owned_scope.join(", "),
        ]
    }
}

impl TableView for TraceEntry {
    fn headers() -> &'static [&'static str] {
        &["TIMESTAMP", "CLASS", "FILE", "REASON"]
    }

    fn row(&self) -> Vec<String> {
        let file = self
            .files
            .first()
            .map_or_else(|| "-".to_string(), |f| f.relative_path.clone());
        vec![
            self.timestamp.clone(),
            self.mutation_class.to_string(),
            file,
            self.classification_reason.clone(),
        ]
    }
}

/// Emits a list of items.
pub fn emit_rows<T: Serialize + TableView>(rows: &[T], format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(T::headers().iter().copied());
            for item in rows {
                table.add_row(item.row());
            }
            println!("{table}");
            ExitCode::Success
        }
        OutputFormat::Json => emit_json(&rows),
        OutputFormat::Yaml => emit_yaml(&rows),
    }
}

/// Emits a single record; table mode renders its top-level fields.
pub fn emit_record<T: Serialize>(record: &T, format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Table => {
            let Ok(value) = serde_json::to_value(record) else {
                return ExitCode::Error;
            };
            let mut table = Table::new();
            table.set_header(["FIELD", "VALUE"]);
            for (field, rendered) in record_rows(&value) {
                table.add_row([field, rendered]);
            }
            println!("{table}");
            ExitCode::Success
        }
        OutputFormat::Json => emit_json(record),
        OutputFormat::Yaml => emit_yaml(record),
    }
}

/// Reports an error on stderr in the requested format.
pub fn fail(err: &GatehouseError, format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Table => {
            eprintln!("Error: {err}");
            if let Some(hint) = &err.hint {
                eprintln!("Hint: {hint}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(err).unwrap_or_else(|_| err.to_string());
            eprintln!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(err).unwrap_or_else(|_| err.to_string());
            eprint!("{yaml}");
        }
    }
    ExitCode::Error
}

fn emit_json<T: Serialize>(data: &T) -> ExitCode {
    match serde_json::to_string_pretty(data) {
        Ok(json) => {
            println!("{json}");
            ExitCode::Success
        }
        Err(_) => ExitCode::Error,
    }
}

fn emit_yaml<T: Serialize>(data: &T) -> ExitCode {
    match serde_yaml::to_string(data) {
        Ok(yaml) => {
            print!("{yaml}");
            ExitCode::Success
        }
        Err(_) => ExitCode::Error,
    }
}

/// Flattens a record's top-level fields into field/value pairs.
fn record_rows(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(field, v)| (field.clone(), render_scalar(v)))
            .collect(),
        other => vec![("value".to_string(), render_scalar(other))],
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
