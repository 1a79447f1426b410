use crate::export;
use crate::ipc::handlers::reports::date_or_today;
use crate::ipc::helpers::{class_filter, get_optional_str, get_required_date, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use anyhow::Context;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy)]
enum Format {
    Csv,
    Spreadsheet,
    Print,
}

impl Format {
    fn ext(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "xls",
            Self::Print => "html",
        }
    }
}

fn write_out(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Shared tail of every export: optionally write to `outPath`, then answer
/// with the document text and its suggested filename.
fn finish(
    params: &Value,
    method: &str,
    filename: String,
    content: String,
    row_count: usize,
) -> Result<Value, HandlerErr> {
    let out_path = get_optional_str(params, "outPath")?
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    if let Some(p) = out_path.as_deref() {
        write_out(p, &content).map_err(|e| {
            HandlerErr::new("export_failed", format!("{e:#}"))
                .with_details(json!({ "outPath": p.to_string_lossy() }))
        })?;
    }
    tracing::info!(
        method,
        filename = %filename,
        rows = row_count,
        written = out_path.is_some(),
        "export produced"
    );
    Ok(json!({
        "filename": filename,
        "content": content,
        "rowCount": row_count,
        "outPath": out_path.map(|p| p.to_string_lossy().to_string()),
    }))
}

fn exports_joined(state: &AppState, params: &Value, format: Format) -> Result<Value, HandlerErr> {
    let date = date_or_today(params, "date")?.format("%Y-%m-%d").to_string();
    let filter = class_filter(params)?;
    let setup = &state.setup;
    let rows = export::project_rows(
        &state.data,
        filter.as_deref(),
        &setup.export.unassigned_label,
    );
    let content = match format {
        Format::Csv => export::to_csv(&rows),
        Format::Spreadsheet => export::to_spreadsheet(&rows),
        Format::Print => {
            let generated_on = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
            export::to_print(&rows, &setup.print, &generated_on)
        }
    };
    let filename = export::export_filename(
        &setup.export.file_prefix,
        &date,
        filter.as_deref(),
        format.ext(),
    );
    let method = match format {
        Format::Csv => "exports.csv",
        Format::Spreadsheet => "exports.spreadsheet",
        Format::Print => "exports.print",
    };
    finish(params, method, filename, content, rows.len())
}

fn exports_attendance_csv(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let date = get_required_date(params, "date")?.format("%Y-%m-%d").to_string();
    let filter = class_filter(params)?;
    let (content, count) = export::attendance_sheet_csv(
        &state.data,
        &date,
        filter.as_deref(),
        &state.setup.export.unassigned_label,
    );
    let filename = format!("absensi_{}_{}.csv", date, filter.as_deref().unwrap_or("all"));
    finish(params, "exports.attendanceCsv", filename, content, count)
}

fn exports_grades_csv(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = class_filter(params)?;
    let (content, count) = export::grade_ledger_csv(&state.data, filter.as_deref());
    let filename = format!("nilai_{}.csv", filter.as_deref().unwrap_or("all"));
    finish(params, "exports.gradesCsv", filename, content, count)
}

fn handle_exports_csv(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, exports_joined(state, &req.params, Format::Csv))
}

fn handle_exports_spreadsheet(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, exports_joined(state, &req.params, Format::Spreadsheet))
}

fn handle_exports_print(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, exports_joined(state, &req.params, Format::Print))
}

fn handle_exports_attendance_csv(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, exports_attendance_csv(state, &req.params))
}

fn handle_exports_grades_csv(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, exports_grades_csv(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "exports.csv" => Some(handle_exports_csv(state, req)),
        "exports.spreadsheet" => Some(handle_exports_spreadsheet(state, req)),
        "exports.print" => Some(handle_exports_print(state, req)),
        "exports.attendanceCsv" => Some(handle_exports_attendance_csv(state, req)),
        "exports.gradesCsv" => Some(handle_exports_grades_csv(state, req)),
        _ => None,
    }
}
