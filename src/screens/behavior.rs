use super::{now_rfc3339, RosterStudent, ScreenError, ScreenResult};
use crate::backend::{Backend, Row, Select};
use crate::validate::{validate, FieldRule, Rule};
use serde::{Deserialize, Serialize};

pub const TIPOS: &[&str] = &["OBSERVACION", "ADVERTENCIA", "AMONESTACION"];
pub const NIVELES: &[&str] = &["BAJO", "MEDIO", "ALTO"];
pub const PICKER_LIMIT: usize = 5;

/// Incidents, newest first, with the student attached under `alumno`.
pub fn list(backend: &Backend) -> ScreenResult<Vec<Row>> {
    let query = Select::from("conducta_incidentes")
        .embed(
            "alumno",
            "alumnos",
            "alumno_id",
            &["nombre", "apellido", "curso", "division"],
        )
        .order("fecha", false);
    backend.select(&query).map_err(ScreenError::query)
}

/// Student picker: surname contains `search`. Searches of two characters or
/// fewer return nothing without querying.
pub fn search_students(backend: &Backend, search: &str) -> ScreenResult<Vec<RosterStudent>> {
    let search = search.trim();
    if search.chars().count() <= 2 {
        return Ok(Vec::new());
    }
    let query = Select::from("alumnos")
        .columns(&["id", "nombre", "apellido", "dni"])
        .ilike("apellido", &format!("%{search}%"))
        .limit(PICKER_LIMIT);
    backend.select_as(&query).map_err(ScreenError::query)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentForm {
    pub alumno_id: String,
    pub tipo: String,
    pub nivel: String,
    pub descripcion: String,
}

impl Default for IncidentForm {
    fn default() -> Self {
        Self {
            alumno_id: String::new(),
            tipo: TIPOS[0].to_string(),
            nivel: NIVELES[0].to_string(),
            descripcion: String::new(),
        }
    }
}

const INCIDENT_SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: "alumno_id",
        rules: &[Rule::Required("Seleccioná un alumno")],
    },
    FieldRule {
        field: "tipo",
        rules: &[Rule::OneOf(TIPOS, "Tipo inválido")],
    },
    FieldRule {
        field: "nivel",
        rules: &[Rule::OneOf(NIVELES, "Nivel inválido")],
    },
    FieldRule {
        field: "descripcion",
        rules: &[Rule::Required("Descripción requerida")],
    },
];

/// Records an incident dated now.
pub fn create(backend: &Backend, form: &IncidentForm) -> ScreenResult<Row> {
    let mut row = super::into_row(form)?;
    let errors = validate(&row, INCIDENT_SCHEMA);
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors));
    }
    row.insert("fecha".to_string(), now_rfc3339().into());
    let mut inserted = backend
        .insert("conducta_incidentes", vec![row])
        .map_err(ScreenError::insert)?;
    log::info!("recorded {} incident for {}", form.tipo, form.alumno_id);
    inserted
        .pop()
        .ok_or_else(|| ScreenError::Rejected("incident was not stored".to_string()))
}
