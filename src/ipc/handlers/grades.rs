use crate::buckets;
use crate::calc;
use crate::ipc::helpers::{
    class_filter, get_optional_str, get_required_score, get_required_str, require_workspace,
    respond, with_persist_warning, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreKey;
use serde_json::{json, Value};

fn grades_add(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let date = get_required_str(params, "date")?;
    let student_id = get_required_str(params, "studentId")?;
    let score = get_required_score(params, "score")?;
    let (next, entry) = state.data.record_grade(date.trim(), &student_id, score)?;
    state.data = next;
    let warning = state.persist(&[StoreKey::Records]);
    Ok(with_persist_warning(json!({ "entry": entry }), warning))
}

/// Raw entries in roster order, each student's entries in insertion order.
fn grades_list(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = class_filter(params)?;
    let only_student = get_optional_str(params, "studentId")?;
    let unassigned = state.setup.export.unassigned_label.as_str();

    let mut entries = Vec::new();
    for r in state.data.roster(filter.as_deref(), unassigned) {
        if only_student.as_deref().is_some_and(|s| s != r.student_id) {
            continue;
        }
        for g in state.data.records.grades_for(&r.student_id) {
            entries.push(json!({
                "studentId": r.student_id,
                "name": r.name,
                "className": r.class_name,
                "date": g.date,
                "month": buckets::month_key(&g.date).ok(),
                "semester": buckets::semester_key(&g.date).ok(),
                "score": g.score,
                "classId": g.class_id,
            }));
        }
    }
    Ok(json!({ "entries": entries }))
}

fn grades_aggregate(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = class_filter(params)?;
    let agg = calc::aggregate(&state.data.records, filter.as_deref());
    if agg.skipped_entries > 0 {
        tracing::warn!(
            skipped = agg.skipped_entries,
            "grade entries with unparseable dates left out of aggregation"
        );
    }
    serde_json::to_value(&agg).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

fn handle_grades_add(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, grades_add(state, &req.params))
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, grades_list(state, &req.params))
}

fn handle_grades_aggregate(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, grades_aggregate(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "grades.add" => Some(handle_grades_add(state, req)),
        "grades.list" => Some(handle_grades_list(state, req)),
        "grades.aggregate" => Some(handle_grades_aggregate(state, req)),
        _ => None,
    }
}
