//! Screen logic: what each screen reads, how it merges and filters rows, and what
//! it writes back. Everything here goes through the generic table API.

pub mod activities;
pub mod attendance;
pub mod behavior;
pub mod calendar;
pub mod dashboard;
pub mod grades;
pub mod payments;
pub mod staff;
pub mod students;

use crate::backend::{Backend, BackendError, Row, Select};
use crate::validate::FieldErrors;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CURSOS: &[&str] = &["1º", "2º", "3º", "4º", "5º", "6º"];
pub const DIVISIONES: &[&str] = &["A", "B", "C", "D"];

#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("validation failed")]
    Validation(FieldErrors),
    /// Rejected before reaching the backend, with a message for the whole form.
    #[error("{0}")]
    Rejected(String),
    #[error("{source}")]
    Backend {
        code: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("{what} not found")]
    NotFound {
        what: &'static str,
        redirect: &'static str,
    },
}

impl ScreenError {
    fn backend(code: &'static str, source: BackendError) -> Self {
        let code = if source.is_constraint() {
            "db_constraint_failed"
        } else {
            code
        };
        log::error!("{code}: {source}");
        ScreenError::Backend { code, source }
    }

    pub fn query(source: BackendError) -> Self {
        Self::backend("db_query_failed", source)
    }

    pub fn insert(source: BackendError) -> Self {
        Self::backend("db_insert_failed", source)
    }

    pub fn update(source: BackendError) -> Self {
        Self::backend("db_update_failed", source)
    }

    pub fn delete(source: BackendError) -> Self {
        Self::backend("db_delete_failed", source)
    }

    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.to_string());
        ScreenError::Validation(errors)
    }
}

pub type ScreenResult<T> = Result<T, ScreenError>;

/// Case-insensitive substring match of `query` against any of `fields`.
/// An empty query matches everything.
pub fn matches_query(query: &str, fields: &[&str]) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    fields.iter().any(|f| f.to_lowercase().contains(&q))
}

/// Minimal student shape used by rosters and pickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterStudent {
    pub id: String,
    pub nombre: String,
    pub apellido: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legajo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
}

/// Active students of one course section, ordered by surname.
pub fn active_roster(
    backend: &Backend,
    curso: &str,
    division: &str,
) -> ScreenResult<Vec<RosterStudent>> {
    let query = Select::from("alumnos")
        .columns(&["id", "nombre", "apellido", "legajo"])
        .eq("curso", curso)
        .eq("division", division)
        .eq("estado", "ACTIVO")
        .order("apellido", true);
    backend.select_as(&query).map_err(ScreenError::query)
}

pub fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn into_row<T: Serialize>(value: &T) -> ScreenResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(_) => Err(ScreenError::Rejected("expected an object".to_string())),
        Err(e) => Err(ScreenError::Rejected(e.to_string())),
    }
}

/// Empty strings become `None`.
pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
