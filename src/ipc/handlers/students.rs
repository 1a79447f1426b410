use crate::ipc::helpers::{
    class_filter, get_optional_str, get_required_str, require_workspace, respond,
    with_persist_warning, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreKey;
use serde_json::{json, Value};

fn students_list(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = class_filter(params)?;
    let unassigned = state.setup.export.unassigned_label.as_str();
    let rows: Vec<Value> = state
        .data
        .roster(filter.as_deref(), unassigned)
        .into_iter()
        .map(|r| {
            json!({
                "id": r.student_id,
                "name": r.name,
                "classId": r.class_id,
                "className": r.class_name,
            })
        })
        .collect();
    Ok(json!({ "students": rows }))
}

fn students_create(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let name = get_required_str(params, "name")?;
    let class_id = get_optional_str(params, "classId")?;
    let (next, student) = state.data.create_student(&name, class_id.as_deref())?;
    state.data = next;
    let warning = state.persist(&[StoreKey::Students]);
    Ok(with_persist_warning(json!({ "student": student }), warning))
}

fn students_update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let name = get_optional_str(params, "name")?;
    let class_id = get_optional_str(params, "classId")?;
    state.data = state
        .data
        .update_student(&student_id, name.as_deref(), class_id.as_deref())?;
    let warning = state.persist(&[StoreKey::Students]);
    Ok(with_persist_warning(
        json!({ "student": state.data.student(&student_id) }),
        warning,
    ))
}

fn students_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let student_id = get_required_str(params, "studentId")?;
    // Deleting purges every mark and grade, so the caller must confirm it.
    if params.get("confirm").and_then(Value::as_bool) != Some(true) {
        return Err(
            HandlerErr::bad_params("confirm must be true to delete a student")
                .with_details(json!({ "studentId": student_id })),
        );
    }
    let (next, purged) = state.data.delete_student(&student_id)?;
    state.data = next;
    tracing::info!(
        student_id = %student_id,
        attendance_marks = purged.attendance_marks,
        grade_entries = purged.grade_entries,
        "student deleted"
    );
    let warning = state.persist(&[StoreKey::Students, StoreKey::Records]);
    Ok(with_persist_warning(
        json!({
            "ok": true,
            "purgedAttendance": purged.attendance_marks,
            "purgedGrades": purged.grade_entries,
        }),
        warning,
    ))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, students_list(state, &req.params))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, students_create(state, &req.params))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, students_update(state, &req.params))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, students_delete(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
