use crate::auth::{self, SessionUser};
use crate::ipc::helpers::{get_required_str, require_workspace, respond, with_persist_warning, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreKey;
use serde_json::{json, Value};

fn credentials(params: &Value) -> Result<(String, String), HandlerErr> {
    let username = get_required_str(params, "username")?;
    let password = get_required_str(params, "password")?;
    Ok((username, password))
}

fn auth_register(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let (username, password) = credentials(params)?;
    let (users, user) = auth::register(&state.users, &username, &password)?;
    state.users = users;
    let session = SessionUser::from(&user);
    state.session = Some(session.clone());
    tracing::info!(username = %session.username, "user registered");
    let warning = state.persist(&[StoreKey::Users, StoreKey::CurrentUser]);
    Ok(with_persist_warning(json!({ "user": session }), warning))
}

fn auth_login(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let (username, password) = credentials(params)?;
    let session = SessionUser::from(auth::login(&state.users, &username, &password)?);
    state.session = Some(session.clone());
    tracing::info!(username = %session.username, "user logged in");
    let warning = state.persist(&[StoreKey::CurrentUser]);
    Ok(with_persist_warning(json!({ "user": session }), warning))
}

fn auth_logout(state: &mut AppState) -> Result<Value, HandlerErr> {
    require_workspace(state)?;
    let was_logged_in = state.session.take().is_some();
    let warning = state.persist(&[StoreKey::CurrentUser]);
    Ok(with_persist_warning(
        json!({ "loggedOut": was_logged_in }),
        warning,
    ))
}

fn handle_auth_register(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, auth_register(state, &req.params))
}

fn handle_auth_login(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, auth_login(state, &req.params))
}

fn handle_auth_logout(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, auth_logout(state))
}

fn handle_auth_current(state: &mut AppState, req: &Request) -> Value {
    respond(&req.id, Ok(json!({ "user": state.session })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "auth.register" => Some(handle_auth_register(state, req)),
        "auth.login" => Some(handle_auth_login(state, req)),
        "auth.logout" => Some(handle_auth_logout(state, req)),
        "auth.current" => Some(handle_auth_current(state, req)),
        _ => None,
    }
}
