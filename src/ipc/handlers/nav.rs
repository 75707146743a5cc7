use crate::guard::{self, GuardOutcome, Screen};
use crate::ipc::helpers::{get_required_str, guarded, open, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::dashboard;
use serde_json::json;

/// What the shell should do when navigating to `path`. Never an error for a known
/// path: the outcome itself says whether to render, wait or redirect.
fn route_check(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let path = get_required_str(params, "path")?;
    let Some(outcome) = guard::check_path(&path, &state.auth) else {
        return Err(HandlerErr {
            code: "not_found",
            message: format!("no screen at {path}"),
            details: Some(json!({ "redirect": guard::HOME_PATH })),
        });
    };
    let result = match outcome {
        GuardOutcome::Loading => json!({ "outcome": "loading" }),
        GuardOutcome::Redirect(to) => json!({ "outcome": "redirect", "redirect": to }),
        GuardOutcome::Forbidden => json!({ "outcome": "forbidden" }),
        GuardOutcome::Render(screen) => json!({ "outcome": "render", "screen": screen }),
    };
    Ok(result)
}

fn nav_items(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "items": guard::visible_nav(state.auth.role()) }))
}

fn dashboard_get(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!(dashboard::view(&state.auth)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "route.check" => Some(open(state, req, route_check)),
        "nav.items" => Some(open(state, req, nav_items)),
        "dashboard.get" => Some(guarded(state, req, Screen::Dashboard, dashboard_get)),
        _ => None,
    }
}
