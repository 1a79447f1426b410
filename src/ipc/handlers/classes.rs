use crate::ipc::helpers::{get_required_str, require_workspace, respond, with_persist_warning, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreKey;
use serde_json::{json, Value};

fn classes_list(state: &AppState) -> Value {
    let mut classes: Vec<&crate::model::Class> = state.data.classes.iter().collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    let rows: Vec<Value> = classes
        .into_iter()
        .map(|c| {
            let student_count = state
                .data
                .students
                .iter()
                .filter(|s| s.assigned_class() == Some(c.id.as_str()))
                .count();
            json!({
                "id": c.id,
                "name": c.name,
                "studentCount": student_count,
            })
        })
        .collect();
    json!({ "classes": rows })
}

fn classes_create(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let name = get_required_str(params, "name")?;
    let (next, class) = state.data.create_class(&name)?;
    state.data = next;
    let warning = state.persist(&[StoreKey::Classes]);
    Ok(with_persist_warning(
        json!({ "classId": class.id, "name": class.name }),
        warning,
    ))
}

fn classes_rename(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let class_id = get_required_str(params, "classId")?;
    let name = get_required_str(params, "name")?;
    state.data = state.data.rename_class(&class_id, &name)?;
    let warning = state.persist(&[StoreKey::Classes]);
    Ok(with_persist_warning(json!({ "ok": true }), warning))
}

fn classes_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let class_id = get_required_str(params, "classId")?;
    let (next, unassigned) = state.data.delete_class(&class_id)?;
    state.data = next;
    tracing::info!(class_id = %class_id, unassigned, "class deleted");
    let warning = state.persist(&[StoreKey::Classes, StoreKey::Students]);
    Ok(with_persist_warning(
        json!({ "ok": true, "unassignedStudents": unassigned }),
        warning,
    ))
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, Ok(classes_list(state)))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, classes_create(state, &req.params))
}

fn handle_classes_rename(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, classes_rename(state, &req.params))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, classes_delete(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.rename" => Some(handle_classes_rename(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
