use super::{ScreenError, ScreenResult};
use crate::backend::{Backend, Row, Select};
use crate::validate::{validate, FieldRule, Rule};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DIAS: &[&str] = &["Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado"];
pub const DEFAULT_CUPO: i64 = 20;

pub fn list(backend: &Backend) -> ScreenResult<Vec<Row>> {
    backend
        .select(&Select::from("actividades").order("nombre", true))
        .map_err(ScreenError::query)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityForm {
    pub nombre: String,
    pub dia_semana: String,
    pub horario: String,
    pub cupo: Value,
    pub responsable: String,
}

impl Default for ActivityForm {
    fn default() -> Self {
        Self {
            nombre: String::new(),
            dia_semana: DIAS[0].to_string(),
            horario: String::new(),
            cupo: Value::from(DEFAULT_CUPO),
            responsable: String::new(),
        }
    }
}

const ACTIVITY_SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: "nombre",
        rules: &[Rule::Required("Nombre requerido")],
    },
    FieldRule {
        field: "dia_semana",
        rules: &[Rule::OneOf(DIAS, "Día inválido")],
    },
    FieldRule {
        field: "horario",
        rules: &[Rule::Required("Horario requerido")],
    },
    FieldRule {
        field: "cupo",
        rules: &[Rule::Required("Cupo requerido"), Rule::Number("Cupo inválido")],
    },
    FieldRule {
        field: "responsable",
        rules: &[Rule::Required("Responsable requerido")],
    },
];

fn parse_cupo(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn create(backend: &Backend, form: &ActivityForm) -> ScreenResult<Row> {
    let mut row = super::into_row(form)?;
    let mut errors = validate(&row, ACTIVITY_SCHEMA);
    let cupo = parse_cupo(&form.cupo);
    if !errors.contains_key("cupo") && !matches!(cupo, Some(n) if n > 0) {
        errors.insert("cupo".to_string(), "Cupo inválido".to_string());
    }
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors));
    }
    row.insert("cupo".to_string(), Value::from(cupo.unwrap_or(DEFAULT_CUPO)));
    let mut inserted = backend
        .insert("actividades", vec![row])
        .map_err(ScreenError::insert)?;
    log::info!("created activity {}", form.nombre);
    inserted
        .pop()
        .ok_or_else(|| ScreenError::Rejected("activity was not stored".to_string()))
}

pub fn delete(backend: &Backend, id: &str) -> ScreenResult<()> {
    let removed = backend
        .delete("actividades", id)
        .map_err(ScreenError::delete)?;
    if removed == 0 {
        return Err(ScreenError::NotFound {
            what: "activity",
            redirect: "/actividades",
        });
    }
    log::info!("deleted activity {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_util::backend;
    use super::*;
    use serde_json::json;

    fn form(nombre: &str) -> ActivityForm {
        ActivityForm {
            nombre: nombre.to_string(),
            horario: "14:00 - 15:30".to_string(),
            responsable: "Prof. Ríos".to_string(),
            ..ActivityForm::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_list_sorts_by_name() {
        let b = backend();
        create(&b, &form("Teatro")).expect("create");
        let coro = create(&b, &form("Coro")).expect("create");
        assert_eq!(coro["dia_semana"], json!("Lunes"));
        assert_eq!(coro["cupo"], json!(20));
        let names: Vec<String> = list(&b)
            .expect("list")
            .iter()
            .map(|r| r["nombre"].as_str().unwrap_or("").to_string())
            .collect();
        assert_eq!(names, vec!["Coro", "Teatro"]);
    }

    #[test]
    fn cupo_accepts_text_and_rejects_zero() {
        let b = backend();
        let ok = create(
            &b,
            &ActivityForm {
                cupo: json!("15"),
                ..form("Ajedrez")
            },
        )
        .expect("create");
        assert_eq!(ok["cupo"], json!(15));
        match create(&b, &ActivityForm { cupo: json!(0), ..form("Robótica") }) {
            Err(ScreenError::Validation(errors)) => assert!(errors.contains_key("cupo")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn delete_removes_once() {
        let b = backend();
        let row = create(&b, &form("Coro")).expect("create");
        let id = row["id"].as_str().expect("id").to_string();
        delete(&b, &id).expect("delete");
        assert!(list(&b).expect("list").is_empty());
        assert!(matches!(delete(&b, &id), Err(ScreenError::NotFound { .. })));
    }
}
