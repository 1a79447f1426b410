use crate::db::SqliteKv;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match SqliteKv::open(&path) {
        Ok(kv) => {
            state.attach(path.clone(), Box::new(kv));
            tracing::info!(
                workspace = %path.display(),
                classes = state.data.classes.len(),
                students = state.data.students.len(),
                "workspace selected"
            );
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "classCount": state.data.classes.len(),
                    "studentCount": state.data.students.len(),
                    "currentUser": state.session,
                }),
            )
        }
        Err(e) => {
            tracing::warn!(workspace = %path.display(), error = %e, "failed to open workspace");
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
