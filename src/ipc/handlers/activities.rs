use crate::guard::Screen;
use crate::ipc::helpers::{backend, get_required_str, guarded, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::activities::{self, ActivityForm, DIAS};
use serde_json::json;

fn activities_list(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let rows = activities::list(backend(state)?)?;
    Ok(json!({
        "activities": rows,
        "defaults": ActivityForm::default(),
        "options": { "dias": DIAS },
    }))
}

fn activities_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let form: ActivityForm = parse_params(params, None)?;
    let activity = activities::create(backend(state)?, &form)?;
    Ok(json!({ "activity": activity }))
}

fn activities_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    activities::delete(backend(state)?, &id)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "activities.list" => Some(guarded(state, req, Screen::Activities, activities_list)),
        "activities.create" => Some(guarded(state, req, Screen::Activities, activities_create)),
        "activities.delete" => Some(guarded(state, req, Screen::Activities, activities_delete)),
        _ => None,
    }
}
