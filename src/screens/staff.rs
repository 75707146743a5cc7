use super::{ScreenError, ScreenResult};
use crate::backend::{Backend, Row, Select};
use crate::validate::{validate, FieldRule, Rule};
use serde::{Deserialize, Serialize};

pub const ROLES_NO_DOCENTE: &[&str] = &["Preceptor", "Tesoreria", "Secretaria", "Maestranza"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffKind {
    Docentes,
    NoDocentes,
}

impl StaffKind {
    pub fn table(self) -> &'static str {
        match self {
            StaffKind::Docentes => "personal_docentes",
            StaffKind::NoDocentes => "personal_no_docentes",
        }
    }
}

pub fn list(backend: &Backend, kind: StaffKind) -> ScreenResult<Vec<Row>> {
    backend
        .select(&Select::from(kind.table()).order("apellido", true))
        .map_err(ScreenError::query)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffForm {
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    pub telefono: String,
    pub rol: String,
}

impl Default for StaffForm {
    fn default() -> Self {
        Self {
            nombre: String::new(),
            apellido: String::new(),
            dni: String::new(),
            email: String::new(),
            telefono: String::new(),
            rol: ROLES_NO_DOCENTE[0].to_string(),
        }
    }
}

const STAFF_SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: "nombre",
        rules: &[Rule::Required("Nombre requerido")],
    },
    FieldRule {
        field: "apellido",
        rules: &[Rule::Required("Apellido requerido")],
    },
    FieldRule {
        field: "dni",
        rules: &[Rule::Required("DNI requerido")],
    },
    FieldRule {
        field: "email",
        rules: &[Rule::Email("Email inválido")],
    },
];

const ROL_RULE: &[FieldRule] = &[FieldRule {
    field: "rol",
    rules: &[Rule::OneOf(ROLES_NO_DOCENTE, "Rol inválido")],
}];

/// Adds a staff member to the chosen tab. Teaching staff carry no `rol`.
pub fn create(backend: &Backend, kind: StaffKind, form: &StaffForm) -> ScreenResult<Row> {
    let mut row = super::into_row(form)?;
    let mut errors = validate(&row, STAFF_SCHEMA);
    match kind {
        StaffKind::Docentes => {
            row.remove("rol");
        }
        StaffKind::NoDocentes => errors.extend(validate(&row, ROL_RULE)),
    }
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors));
    }
    let mut inserted = backend
        .insert(kind.table(), vec![row])
        .map_err(ScreenError::insert)?;
    log::info!("added {} {}", kind.table(), form.apellido);
    inserted
        .pop()
        .ok_or_else(|| ScreenError::Rejected("staff member was not stored".to_string()))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::backend;
    use super::*;
    use serde_json::json;

    fn form(apellido: &str) -> StaffForm {
        StaffForm {
            nombre: "Laura".to_string(),
            apellido: apellido.to_string(),
            dni: "30111222".to_string(),
            ..StaffForm::default()
        }
    }

    #[test]
    fn teaching_staff_drop_rol_and_others_default_to_preceptor() {
        let b = backend();
        let docente = create(&b, StaffKind::Docentes, &form("Suárez")).expect("docente");
        assert!(docente.get("rol").is_none());
        let otro = create(&b, StaffKind::NoDocentes, &form("Ibarra")).expect("no docente");
        assert_eq!(otro["rol"], json!("Preceptor"));
    }

    #[test]
    fn tabs_are_separate_and_sorted_by_surname() {
        let b = backend();
        create(&b, StaffKind::Docentes, &form("Suárez")).expect("create");
        create(&b, StaffKind::Docentes, &form("Benítez")).expect("create");
        create(&b, StaffKind::NoDocentes, &form("Ibarra")).expect("create");
        let docentes = list(&b, StaffKind::Docentes).expect("list");
        let names: Vec<&str> = docentes
            .iter()
            .map(|r| r["apellido"].as_str().unwrap_or(""))
            .collect();
        assert_eq!(names, vec!["Benítez", "Suárez"]);
        assert_eq!(list(&b, StaffKind::NoDocentes).expect("list").len(), 1);
    }

    #[test]
    fn unknown_rol_is_rejected_for_non_teaching_staff() {
        let b = backend();
        let bad = StaffForm {
            rol: "Director".to_string(),
            ..form("Ibarra")
        };
        match create(&b, StaffKind::NoDocentes, &bad) {
            Err(ScreenError::Validation(errors)) => assert!(errors.contains_key("rol")),
            other => panic!("expected validation error, got {other:?}"),
        }
        create(&b, StaffKind::Docentes, &bad).expect("rol ignored for docentes");
    }
}
