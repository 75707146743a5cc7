use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::prefs::Theme;
use serde_json::json;

fn prefs_result(state: &AppState) -> serde_json::Value {
    json!({
        "theme": state.prefs.theme,
        "path": state.prefs.path().map(|p| p.to_string_lossy().to_string()),
    })
}

fn handle_prefs_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, prefs_result(state))
}

fn handle_prefs_set_theme(state: &mut AppState, req: &Request) -> serde_json::Value {
    let theme: Theme = match req
        .params
        .get("theme")
        .cloned()
        .map(serde_json::from_value)
    {
        Some(Ok(t)) => t,
        _ => {
            return err(
                &req.id,
                "bad_params",
                "theme must be \"light\" or \"dark\"",
                None,
            )
        }
    };
    if let Err(e) = state.prefs.set_theme(theme) {
        log::error!("failed to write prefs: {e:?}");
        return err(&req.id, "prefs_write_failed", format!("{e:?}"), None);
    }
    ok(&req.id, prefs_result(state))
}

fn handle_prefs_toggle_theme(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = state.prefs.toggle_theme() {
        log::error!("failed to write prefs: {e:?}");
        return err(&req.id, "prefs_write_failed", format!("{e:?}"), None);
    }
    ok(&req.id, prefs_result(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "prefs.get" => Some(handle_prefs_get(state, req)),
        "prefs.setTheme" => Some(handle_prefs_set_theme(state, req)),
        "prefs.toggleTheme" => Some(handle_prefs_toggle_theme(state, req)),
        _ => None,
    }
}
