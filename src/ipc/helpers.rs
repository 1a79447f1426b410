use crate::auth::AuthError;
use crate::buckets::{self, InvalidDate};
use crate::ipc::error::{err, ok};
use crate::ipc::types::AppState;
use crate::model::RecordError;
use chrono::NaiveDate;
use serde_json::{json, Value};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<RecordError> for HandlerErr {
    fn from(e: RecordError) -> Self {
        let details = match &e {
            RecordError::UnknownStudent(id) => Some(json!({ "studentId": id })),
            RecordError::UnknownClass(id) => Some(json!({ "classId": id })),
            RecordError::InvalidDate(InvalidDate(d)) => Some(json!({ "date": d })),
            _ => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

impl From<AuthError> for HandlerErr {
    fn from(e: AuthError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<InvalidDate> for HandlerErr {
    fn from(e: InvalidDate) -> Self {
        let details = json!({ "date": e.0 });
        Self::bad_params(e.to_string()).with_details(details)
    }
}

pub fn respond(id: &str, res: Result<Value, HandlerErr>) -> Value {
    match res {
        Ok(result) => ok(id, result),
        Err(e) => e.response(id),
    }
}

pub fn require_workspace(state: &AppState) -> Result<(), HandlerErr> {
    if state.store.is_none() {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    }
    Ok(())
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

/// `classId` filter; absent, null and "" all mean every class.
pub fn class_filter(params: &Value) -> Result<Option<String>, HandlerErr> {
    Ok(get_optional_str(params, "classId")?.filter(|s| !s.trim().is_empty()))
}

pub fn get_required_date(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = get_required_str(params, key)?;
    Ok(buckets::parse_date(raw.trim())?)
}

/// Accepts a JSON number or a numeric string, mirroring a free-text score
/// field. Blank and non-finite values are rejected.
pub fn get_required_score(params: &Value, key: &str) -> Result<f64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    let score = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if s.is_finite() => Ok(s),
        _ => Err(HandlerErr::bad_params(format!("{} must be a finite number", key))
            .with_details(json!({ "value": v }))),
    }
}

/// Adds `persistWarning` to a successful result when the write-through failed.
pub fn with_persist_warning(mut result: Value, warning: Option<String>) -> Value {
    if let (Some(w), Some(obj)) = (warning, result.as_object_mut()) {
        obj.insert("persistWarning".to_string(), Value::String(w));
    }
    result
}
