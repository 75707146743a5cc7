use crate::guard::Screen;
use crate::ipc::helpers::{backend, get_required_str, guarded, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::calendar::{self, DateRange, NonWorkingDayForm, ALCANCES};
use serde_json::json;

fn calendar_list(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let range: DateRange = parse_params(params, None)?;
    let rows = calendar::list(backend(state)?, &range)?;
    Ok(json!({
        "days": rows,
        "defaults": NonWorkingDayForm::default(),
        "options": { "alcances": ALCANCES },
    }))
}

fn calendar_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let form: NonWorkingDayForm = parse_params(params, None)?;
    let day = calendar::create(backend(state)?, &form)?;
    Ok(json!({ "day": day }))
}

fn calendar_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    calendar::delete(backend(state)?, &id)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.list" => Some(guarded(state, req, Screen::NonWorkingDays, calendar_list)),
        "calendar.create" => Some(guarded(state, req, Screen::NonWorkingDays, calendar_create)),
        "calendar.delete" => Some(guarded(state, req, Screen::NonWorkingDays, calendar_delete)),
        _ => None,
    }
}
