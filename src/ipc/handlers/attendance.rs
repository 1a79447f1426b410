use crate::ipc::helpers::{
    class_filter, get_required_date, get_required_str, require_workspace, respond,
    with_persist_warning, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use crate::store::StoreKey;
use serde_json::{json, Value};

fn attendance_day(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let date = get_required_date(params, "date")?.format("%Y-%m-%d").to_string();
    let filter = class_filter(params)?;
    let unassigned = state.setup.export.unassigned_label.as_str();

    let mut counts = [0usize; 4];
    let mut rows = Vec::new();
    for r in state.data.roster(filter.as_deref(), unassigned) {
        let status = state.data.records.status_on(&date, &r.student_id);
        if let Some(s) = status {
            if let Some(i) = AttendanceStatus::ALL.iter().position(|x| *x == s) {
                counts[i] += 1;
            }
        }
        rows.push(json!({
            "studentId": r.student_id,
            "name": r.name,
            "classId": r.class_id,
            "className": r.class_name,
            "status": status.map(AttendanceStatus::code),
            "label": status.map(AttendanceStatus::label),
        }));
    }

    Ok(json!({
        "date": date,
        "rows": rows,
        "counts": {
            "H": counts[0],
            "I": counts[1],
            "S": counts[2],
            "A": counts[3],
        },
    }))
}

fn attendance_set(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let date = get_required_str(params, "date")?;
    let student_id = get_required_str(params, "studentId")?;
    let status = AttendanceStatus::parse(&get_required_str(params, "status")?)?;
    state.data = state
        .data
        .record_attendance(date.trim(), &student_id, status)?;
    let warning = state.persist(&[StoreKey::Records]);
    Ok(with_persist_warning(
        json!({ "ok": true, "status": status.code() }),
        warning,
    ))
}

fn attendance_clear(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let date = get_required_str(params, "date")?;
    let student_id = get_required_str(params, "studentId")?;
    state.data = state.data.clear_attendance(date.trim(), &student_id)?;
    let warning = state.persist(&[StoreKey::Records]);
    Ok(with_persist_warning(json!({ "ok": true }), warning))
}

fn handle_attendance_day(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, attendance_day(state, &req.params))
}

fn handle_attendance_set(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, attendance_set(state, &req.params))
}

fn handle_attendance_clear(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, attendance_clear(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "attendance.day" => Some(handle_attendance_day(state, req)),
        "attendance.set" => Some(handle_attendance_set(state, req)),
        "attendance.clear" => Some(handle_attendance_clear(state, req)),
        _ => None,
    }
}
