use crate::guard::Screen;
use crate::ipc::helpers::{backend, get_str_or_empty, guarded, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::grades::{self, GradeSheet, PERIODOS, TIPOS};
use crate::screens::{CURSOS, DIVISIONES};
use serde_json::json;

fn grades_subjects(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let subjects = grades::subjects(backend(state)?)?;
    Ok(json!({
        "subjects": subjects,
        "defaults": GradeSheet::default(),
        "options": {
            "cursos": CURSOS,
            "divisiones": DIVISIONES,
            "periodos": PERIODOS,
            "tipos": TIPOS,
        }
    }))
}

fn grades_roster(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let curso = get_str_or_empty(params, "curso");
    let division = get_str_or_empty(params, "division");
    let materia_id = get_str_or_empty(params, "materiaId");
    let students = grades::roster(backend(state)?, &curso, &division, &materia_id)?;
    Ok(json!({ "students": students }))
}

fn grades_save(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let sheet: GradeSheet = parse_params(params, None)?;
    let written = grades::save(backend(state)?, &sheet)?;
    Ok(json!({ "written": written, "redirect": "/notas" }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.subjects" => Some(guarded(state, req, Screen::GradesEntry, grades_subjects)),
        "grades.roster" => Some(guarded(state, req, Screen::GradesEntry, grades_roster)),
        "grades.save" => Some(guarded(state, req, Screen::GradesEntry, grades_save)),
        _ => None,
    }
}
