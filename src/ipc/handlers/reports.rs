use crate::buckets;
use crate::calc;
use crate::export;
use crate::ipc::helpers::{class_filter, get_optional_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use serde_json::{json, Value};

/// `params[key]` as a date, or the local calendar date when absent.
pub(crate) fn date_or_today(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    match get_optional_str(params, key)?.filter(|s| !s.trim().is_empty()) {
        Some(raw) => Ok(buckets::parse_date(raw.trim())?),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn average_text(v: Option<f64>) -> String {
    v.map(export::two_decimals)
        .unwrap_or_else(|| "-".to_string())
}

fn reports_dashboard(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let today = date_or_today(params, "today")?;
    let stats = calc::dashboard_stats(&state.data, today);
    Ok(json!({
        "month": buckets::month_key_of(today),
        "students": stats.students,
        "classes": stats.classes,
        "attendanceThisMonth": stats.attendance_this_month,
        "gradesThisMonth": stats.grades_this_month,
    }))
}

fn reports_recap(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let date = date_or_today(params, "date")?;
    let filter = class_filter(params)?;
    let recap = calc::recap(
        &state.data,
        date,
        filter.as_deref(),
        &state.setup.export.unassigned_label,
    );
    let rows: Vec<Value> = recap
        .rows
        .iter()
        .map(|r| {
            json!({
                "studentId": r.student_id,
                "name": r.name,
                "className": r.class_name,
                "attendance": r.attendance,
                "monthlyAverage": r.monthly_average,
                "semesterAverage": r.semester_average,
                "monthlyAverageText": average_text(r.monthly_average),
                "semesterAverageText": average_text(r.semester_average),
            })
        })
        .collect();
    Ok(json!({
        "date": recap.date,
        "month": recap.month,
        "semester": recap.semester,
        "rows": rows,
    }))
}

fn reports_rows(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = class_filter(params)?;
    let rows = export::project_rows(
        &state.data,
        filter.as_deref(),
        &state.setup.export.unassigned_label,
    );
    Ok(json!({ "rows": rows }))
}

fn handle_reports_dashboard(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, reports_dashboard(state, &req.params))
}

fn handle_reports_recap(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, reports_recap(state, &req.params))
}

fn handle_reports_rows(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, reports_rows(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "reports.dashboard" => Some(handle_reports_dashboard(state, req)),
        "reports.recap" => Some(handle_reports_recap(state, req)),
        "reports.rows" => Some(handle_reports_rows(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_text_rounds_ties_up() {
        assert_eq!(average_text(Some(82.125)), "82.13");
        assert_eq!(average_text(Some(1.005)), "1.00");
        assert_eq!(average_text(None), "-");
    }
}
