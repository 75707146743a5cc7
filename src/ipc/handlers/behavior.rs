use crate::guard::Screen;
use crate::ipc::helpers::{backend, get_str_or_empty, guarded, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::behavior::{self, IncidentForm, NIVELES, TIPOS};
use serde_json::json;

fn behavior_list(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let incidents = behavior::list(backend(state)?)?;
    Ok(json!({
        "incidents": incidents,
        "defaults": IncidentForm::default(),
        "options": { "tipos": TIPOS, "niveles": NIVELES },
    }))
}

fn behavior_search_students(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let search = get_str_or_empty(params, "search");
    let students = behavior::search_students(backend(state)?, &search)?;
    Ok(json!({ "students": students }))
}

fn behavior_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let form: IncidentForm = parse_params(params, None)?;
    let incident = behavior::create(backend(state)?, &form)?;
    Ok(json!({ "incident": incident }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "behavior.list" => Some(guarded(state, req, Screen::Behavior, behavior_list)),
        "behavior.searchStudents" => {
            Some(guarded(state, req, Screen::Behavior, behavior_search_students))
        }
        "behavior.create" => Some(guarded(state, req, Screen::Behavior, behavior_create)),
        _ => None,
    }
}
