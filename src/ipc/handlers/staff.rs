use crate::guard::Screen;
use crate::ipc::helpers::{backend, guarded, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::staff::{self, StaffForm, StaffKind, ROLES_NO_DOCENTE};
use serde_json::json;

fn kind(params: &serde_json::Value) -> Result<StaffKind, HandlerErr> {
    if params.get("kind").is_none() {
        return Ok(StaffKind::Docentes);
    }
    parse_params(params, Some("kind"))
}

fn staff_list(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = kind(params)?;
    let rows = staff::list(backend(state)?, kind)?;
    Ok(json!({
        "kind": kind,
        "staff": rows,
        "defaults": StaffForm::default(),
        "options": { "roles": ROLES_NO_DOCENTE },
    }))
}

fn staff_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = kind(params)?;
    let form: StaffForm = parse_params(params, Some("form"))?;
    let member = staff::create(backend(state)?, kind, &form)?;
    Ok(json!({ "kind": kind, "member": member }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "staff.list" => Some(guarded(state, req, Screen::Staff, staff_list)),
        "staff.create" => Some(guarded(state, req, Screen::Staff, staff_create)),
        _ => None,
    }
}
