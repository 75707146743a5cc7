use super::{ScreenError, ScreenResult};
use crate::backend::{Backend, Row, Select};
use crate::validate::{validate, FieldRule, Rule};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const ALCANCES: &[&str] = &["INSTITUCION", "PRIMARIA", "SECUNDARIA"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Non-working days in date order, optionally bounded (inclusive) on either side.
pub fn list(backend: &Backend, range: &DateRange) -> ScreenResult<Vec<Row>> {
    let mut query = Select::from("dias_inhabiles");
    if let Some(from) = range.from.as_deref().filter(|s| !s.is_empty()) {
        check_date("from", from)?;
        query = query.gte("fecha", from);
    }
    if let Some(to) = range.to.as_deref().filter(|s| !s.is_empty()) {
        check_date("to", to)?;
        query = query.lte("fecha", to);
    }
    backend
        .select(&query.order("fecha", true))
        .map_err(ScreenError::query)
}

fn check_date(field: &str, value: &str) -> ScreenResult<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ScreenError::field(field, "Fecha inválida"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NonWorkingDayForm {
    pub fecha: String,
    pub motivo: String,
    pub alcance: String,
}

impl Default for NonWorkingDayForm {
    fn default() -> Self {
        Self {
            fecha: String::new(),
            motivo: String::new(),
            alcance: ALCANCES[0].to_string(),
        }
    }
}

const DAY_SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: "fecha",
        rules: &[Rule::Required("Fecha requerida")],
    },
    FieldRule {
        field: "motivo",
        rules: &[Rule::Required("Motivo requerido")],
    },
    FieldRule {
        field: "alcance",
        rules: &[Rule::OneOf(ALCANCES, "Alcance inválido")],
    },
];

pub fn create(backend: &Backend, form: &NonWorkingDayForm) -> ScreenResult<Row> {
    let row = super::into_row(form)?;
    let mut errors = validate(&row, DAY_SCHEMA);
    if !errors.contains_key("fecha") && check_date("fecha", form.fecha.trim()).is_err() {
        errors.insert("fecha".to_string(), "Fecha inválida".to_string());
    }
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors));
    }
    let mut inserted = backend
        .insert("dias_inhabiles", vec![row])
        .map_err(ScreenError::insert)?;
    log::info!("added non-working day {} ({})", form.fecha, form.alcance);
    inserted
        .pop()
        .ok_or_else(|| ScreenError::Rejected("day was not stored".to_string()))
}

pub fn delete(backend: &Backend, id: &str) -> ScreenResult<()> {
    let removed = backend
        .delete("dias_inhabiles", id)
        .map_err(ScreenError::delete)?;
    if removed == 0 {
        return Err(ScreenError::NotFound {
            what: "non-working day",
            redirect: "/dias-inhabiles",
        });
    }
    Ok(())
}
