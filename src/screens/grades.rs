use super::{active_roster, today, RosterStudent, ScreenError, ScreenResult};
use crate::backend::{Backend, Row, Select};
use crate::validate::{parse_number, FieldErrors};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

pub const PERIODOS: &[&str] = &["1º Trimestre", "2º Trimestre", "3º Trimestre"];
pub const TIPOS: &[&str] = &["Examen", "Trabajo Práctico", "Oral", "Concepto"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub nombre: String,
}

pub fn subjects(backend: &Backend) -> ScreenResult<Vec<Subject>> {
    backend
        .select_as(&Select::from("materias").order("nombre", true))
        .map_err(ScreenError::query)
}

/// Roster for a grade sheet; empty until course, section and subject are chosen.
pub fn roster(
    backend: &Backend,
    curso: &str,
    division: &str,
    materia_id: &str,
) -> ScreenResult<Vec<RosterStudent>> {
    if curso.is_empty() || division.is_empty() || materia_id.is_empty() {
        return Ok(Vec::new());
    }
    active_roster(backend, curso, division)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeSheet {
    pub materia_id: String,
    pub periodo: String,
    pub tipo: String,
    pub fecha: String,
    /// Student id to the grade as typed. Blank entries are skipped.
    pub grades: BTreeMap<String, String>,
}

impl Default for GradeSheet {
    fn default() -> Self {
        Self {
            materia_id: String::new(),
            periodo: PERIODOS[0].to_string(),
            tipo: TIPOS[0].to_string(),
            fecha: today(),
            grades: BTreeMap::new(),
        }
    }
}

/// Inserts one `notas` row per filled-in grade, all in one batch.
pub fn save(backend: &Backend, sheet: &GradeSheet) -> ScreenResult<usize> {
    let mut errors = FieldErrors::new();
    if sheet.materia_id.trim().is_empty() {
        errors.insert("materia_id".to_string(), "Materia requerida".to_string());
    }
    if !PERIODOS.contains(&sheet.periodo.as_str()) {
        errors.insert("periodo".to_string(), "Periodo inválido".to_string());
    }
    if !TIPOS.contains(&sheet.tipo.as_str()) {
        errors.insert("tipo".to_string(), "Tipo inválido".to_string());
    }

    let mut rows: Vec<Row> = Vec::new();
    for (alumno_id, raw) in &sheet.grades {
        if raw.trim().is_empty() {
            continue;
        }
        let Some(nota) = parse_number(raw) else {
            errors.insert(alumno_id.clone(), "Nota inválida".to_string());
            continue;
        };
        if let Some(row) = json!({
            "alumno_id": alumno_id,
            "materia_id": sheet.materia_id,
            "periodo": sheet.periodo,
            "tipo": sheet.tipo,
            "nota": nota,
            "fecha": sheet.fecha,
            "observacion": "",
        })
        .as_object()
        {
            rows.push(row.clone());
        }
    }
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors));
    }
    if rows.is_empty() {
        return Err(ScreenError::Rejected("No hay notas para guardar".to_string()));
    }

    let inserted = backend.insert("notas", rows).map_err(ScreenError::insert)?;
    log::info!(
        "saved {} grades for materia {} ({})",
        inserted.len(),
        sheet.materia_id,
        sheet.periodo
    );
    Ok(inserted.len())
}
