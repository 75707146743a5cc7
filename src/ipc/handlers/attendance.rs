use crate::guard::Screen;
use crate::ipc::helpers::{get_required_str, guarded, no_workspace, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::attendance::{AttendanceStatus, Selection};
use crate::screens::{CURSOS, DIVISIONES};
use serde_json::json;

fn view(state: &AppState) -> serde_json::Value {
    json!(state.attendance.view())
}

fn attendance_open(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let mut result = view(state);
    result["options"] = json!({
        "cursos": CURSOS,
        "divisiones": DIVISIONES,
        "estados": ["PRESENTE", "AUSENTE", "TARDE", "JUSTIFICADA"],
    });
    Ok(result)
}

fn attendance_select(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let selection: Selection = parse_params(params, None)?;
    let AppState {
        backend, attendance, ..
    } = &mut *state;
    attendance.select(backend.as_ref().ok_or_else(no_workspace)?, selection)?;
    Ok(view(state))
}

fn attendance_reload(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let AppState {
        backend, attendance, ..
    } = &mut *state;
    attendance.reload(backend.as_ref().ok_or_else(no_workspace)?)?;
    Ok(view(state))
}

fn attendance_set_status(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let alumno_id = get_required_str(params, "alumnoId")?;
    let estado: AttendanceStatus = parse_params(params, Some("estado"))?;
    state.attendance.set_status(&alumno_id, estado)?;
    Ok(view(state))
}

fn attendance_save(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let AppState {
        backend, attendance, ..
    } = &mut *state;
    let written = attendance.save(backend.as_ref().ok_or_else(no_workspace)?)?;
    let mut result = view(state);
    result["written"] = json!(written);
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(guarded(state, req, Screen::Attendance, attendance_open)),
        "attendance.select" => Some(guarded(state, req, Screen::Attendance, attendance_select)),
        "attendance.reload" => Some(guarded(state, req, Screen::Attendance, attendance_reload)),
        "attendance.setStatus" => {
            Some(guarded(state, req, Screen::Attendance, attendance_set_status))
        }
        "attendance.save" => Some(guarded(state, req, Screen::Attendance, attendance_save)),
        _ => None,
    }
}
