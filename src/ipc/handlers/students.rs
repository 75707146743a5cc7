use crate::guard::Screen;
use crate::ipc::helpers::{backend, get_required_str, guarded, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::students::{self, StudentFilter, StudentForm, ESTADOS};
use crate::screens::{CURSOS, DIVISIONES};
use serde_json::json;

fn students_list(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let filter: StudentFilter = parse_params(params, None)?;
    let list = students::list(backend(state)?, &filter)?;
    Ok(json!(list))
}

fn students_get(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let student = students::fetch(backend(state)?, &id)?;
    Ok(json!({
        "student": &student,
        "form": StudentForm::from(student.clone()),
    }))
}

fn students_new(
    _state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "form": students::new_form(),
        "options": {
            "cursos": CURSOS,
            "divisiones": DIVISIONES,
            "estados": ESTADOS,
        }
    }))
}

fn students_save(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = params
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty() && *s != "nuevo");
    let form: StudentForm = parse_params(params, Some("form"))?;
    let saved_id = students::save(backend(state)?, id, &form)?;
    Ok(json!({ "id": saved_id, "redirect": "/alumnos" }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(guarded(state, req, Screen::Students, students_list)),
        "students.get" => Some(guarded(state, req, Screen::StudentDetail, students_get)),
        "students.new" => Some(guarded(state, req, Screen::StudentNew, students_new)),
        "students.save" => Some(guarded(state, req, Screen::StudentDetail, students_save)),
        _ => None,
    }
}
