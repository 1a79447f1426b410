use crate::ipc::helpers::{get_required_str, require_workspace, respond, with_persist_warning, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::setup::SetupSection;
use crate::store::StoreKey;
use serde_json::{json, Value};

fn setup_get(state: &AppState) -> Value {
    json!({
        "export": state.setup.export,
        "print": state.setup.print,
    })
}

fn setup_update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let section_raw = get_required_str(params, "section")?;
    let Some(section) = SetupSection::parse(&section_raw) else {
        return Err(HandlerErr::bad_params("unknown section")
            .with_details(json!({ "section": section_raw })));
    };
    let Some(patch) = params.get("patch").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("patch must be an object"));
    };

    state
        .setup
        .apply_patch(section, patch)
        .map_err(HandlerErr::bad_params)?;
    let warning = state.persist(&[StoreKey::Setup]);
    Ok(with_persist_warning(json!({ "ok": true }), warning))
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, Ok(setup_get(state)))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, setup_update(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
