use crate::backend::{Backend, BackendError};
use crate::guard::{self, GuardOutcome, Screen};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::screens::ScreenError;
use serde::de::DeserializeOwned;
use serde_json::json;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ScreenError> for HandlerErr {
    fn from(e: ScreenError) -> Self {
        match e {
            ScreenError::Validation(fields) => HandlerErr {
                code: "validation_failed",
                message: "validation failed".to_string(),
                details: Some(json!({ "fields": fields })),
            },
            ScreenError::Rejected(message) => HandlerErr::new("validation_failed", message),
            ScreenError::Backend { code, source } => HandlerErr::new(code, source.to_string()),
            ScreenError::NotFound { what, redirect } => HandlerErr {
                code: "not_found",
                message: format!("{what} not found"),
                details: Some(json!({ "redirect": redirect })),
            },
        }
    }
}

/// Auth failures carry the backend's own message, shown verbatim on the form.
pub fn auth_err(e: BackendError) -> HandlerErr {
    match e {
        BackendError::Sql(_) | BackendError::Decode(_) => {
            log::error!("auth backend failure: {e}");
            HandlerErr::new("db_query_failed", e.to_string())
        }
        other => HandlerErr::new("auth_failed", other.to_string()),
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_str_or_empty(params: &serde_json::Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Deserializes `params[key]`, or the whole params object when `key` is `None`.
pub fn parse_params<T: DeserializeOwned>(
    params: &serde_json::Value,
    key: Option<&str>,
) -> Result<T, HandlerErr> {
    let value = match key {
        Some(k) => params.get(k).cloned().unwrap_or(serde_json::Value::Null),
        None => params.clone(),
    };
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value).map_err(|e| HandlerErr::new("bad_params", e.to_string()))
}

pub fn no_workspace() -> HandlerErr {
    HandlerErr::new("no_workspace", "select a workspace first")
}

pub fn backend(state: &AppState) -> Result<&Backend, HandlerErr> {
    state.backend.as_ref().ok_or_else(no_workspace)
}

/// Maps a guard decision that blocks the screen onto an error response.
pub fn guard_err(outcome: &GuardOutcome) -> Option<HandlerErr> {
    match outcome {
        GuardOutcome::Render(_) => None,
        GuardOutcome::Loading => Some(HandlerErr::new("loading", "session is still resolving")),
        GuardOutcome::Redirect(to) => Some(HandlerErr {
            code: "unauthenticated",
            message: "sign in first".to_string(),
            details: Some(json!({ "redirect": to })),
        }),
        GuardOutcome::Forbidden => Some(HandlerErr::new(
            "forbidden",
            "your role cannot open this screen",
        )),
    }
}

/// Runs `f` only when the workspace is open and the guard lets the current
/// session into `screen`.
pub fn guarded(
    state: &mut AppState,
    req: &Request,
    screen: Screen,
    f: fn(&mut AppState, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    if state.backend.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    state.sync_auth();
    let outcome = guard::check(screen, &state.auth);
    if let Some(e) = guard_err(&outcome) {
        log::debug!("{} blocked: {:?}", req.method, outcome);
        return e.response(&req.id);
    }
    match f(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

/// Like [`guarded`] for handlers that need no signed-in session.
pub fn open(
    state: &mut AppState,
    req: &Request,
    f: fn(&mut AppState, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    state.sync_auth();
    match f(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}
