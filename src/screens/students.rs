use super::{into_row, matches_query, ScreenError, ScreenResult, CURSOS, DIVISIONES};
use crate::backend::{Backend, Select};
use crate::validate::{validate, FieldRule, Rule};
use serde::{Deserialize, Serialize};

pub const ESTADOS: &[&str] = &["ACTIVO", "INACTIVO"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub legajo: String,
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    #[serde(default)]
    pub fecha_nacimiento: Option<String>,
    pub curso: String,
    pub division: String,
    pub estado: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub tutor_nombre: Option<String>,
    #[serde(default)]
    pub tutor_telefono: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentFilter {
    pub search: String,
    /// Empty means every course.
    pub curso: String,
}

#[derive(Debug, Serialize)]
pub struct StudentList {
    pub students: Vec<Student>,
    /// Distinct courses among all students, sorted, for the course dropdown.
    pub cursos: Vec<String>,
    pub total: usize,
}

pub fn fetch_all(backend: &Backend) -> ScreenResult<Vec<Student>> {
    backend
        .select_as(&Select::from("alumnos").order("apellido", true))
        .map_err(ScreenError::query)
}

pub fn filter_students(students: &[Student], filter: &StudentFilter) -> Vec<Student> {
    students
        .iter()
        .filter(|s| {
            matches_query(
                &filter.search,
                &[
                    s.nombre.as_str(),
                    s.apellido.as_str(),
                    s.dni.as_str(),
                    s.legajo.as_str(),
                ],
            )
        })
        .filter(|s| filter.curso.is_empty() || s.curso == filter.curso)
        .cloned()
        .collect()
}

pub fn distinct_cursos(students: &[Student]) -> Vec<String> {
    let mut cursos: Vec<String> = students.iter().map(|s| s.curso.clone()).collect();
    cursos.sort();
    cursos.dedup();
    cursos
}

pub fn list(backend: &Backend, filter: &StudentFilter) -> ScreenResult<StudentList> {
    let all = fetch_all(backend)?;
    let students = filter_students(&all, filter);
    Ok(StudentList {
        cursos: distinct_cursos(&all),
        total: all.len(),
        students,
    })
}

pub fn fetch(backend: &Backend, id: &str) -> ScreenResult<Student> {
    let query = Select::from("alumnos").eq("id", id);
    let row = backend.select_maybe_single(&query).map_err(ScreenError::query)?;
    let Some(row) = row else {
        log::warn!("student {id} not found");
        return Err(ScreenError::NotFound {
            what: "student",
            redirect: "/alumnos",
        });
    };
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| ScreenError::query(e.into()))
}

/// Editable fields of the student form. Optional text fields travel as empty
/// strings, the way the form holds them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentForm {
    pub legajo: String,
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub fecha_nacimiento: String,
    pub curso: String,
    pub division: String,
    pub email: String,
    pub telefono: String,
    pub direccion: String,
    pub tutor_nombre: String,
    pub tutor_telefono: String,
    pub estado: String,
    pub observaciones: String,
}

impl Default for StudentForm {
    fn default() -> Self {
        Self {
            legajo: String::new(),
            nombre: String::new(),
            apellido: String::new(),
            dni: String::new(),
            fecha_nacimiento: String::new(),
            curso: CURSOS[0].to_string(),
            division: DIVISIONES[0].to_string(),
            email: String::new(),
            telefono: String::new(),
            direccion: String::new(),
            tutor_nombre: String::new(),
            tutor_telefono: String::new(),
            estado: ESTADOS[0].to_string(),
            observaciones: String::new(),
        }
    }
}

impl From<Student> for StudentForm {
    fn from(s: Student) -> Self {
        Self {
            legajo: s.legajo,
            nombre: s.nombre,
            apellido: s.apellido,
            dni: s.dni,
            fecha_nacimiento: s.fecha_nacimiento.unwrap_or_default(),
            curso: s.curso,
            division: s.division,
            email: s.email.unwrap_or_default(),
            telefono: s.telefono.unwrap_or_default(),
            direccion: s.direccion.unwrap_or_default(),
            tutor_nombre: s.tutor_nombre.unwrap_or_default(),
            tutor_telefono: s.tutor_telefono.unwrap_or_default(),
            estado: s.estado,
            observaciones: s.observaciones.unwrap_or_default(),
        }
    }
}

pub const STUDENT_SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: "legajo",
        rules: &[Rule::Required("Legajo requerido")],
    },
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
        rules: &[Rule::MinLen(7, "DNI inválido")],
    },
    FieldRule {
        field: "curso",
        rules: &[Rule::Required("Curso requerido")],
    },
    FieldRule {
        field: "division",
        rules: &[Rule::Required("División requerida")],
    },
    FieldRule {
        field: "email",
        rules: &[Rule::Email("Email inválido")],
    },
    FieldRule {
        field: "estado",
        rules: &[Rule::OneOf(ESTADOS, "Estado inválido")],
    },
];

pub fn new_form() -> StudentForm {
    StudentForm::default()
}

/// Validates and writes the form: insert when `id` is `None`, update otherwise.
/// Returns the id of the saved student.
pub fn save(backend: &Backend, id: Option<&str>, form: &StudentForm) -> ScreenResult<String> {
    let row = into_row(form)?;
    let errors = validate(&row, STUDENT_SCHEMA);
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors));
    }
    match id {
        Some(id) => {
            let changed = backend
                .update("alumnos", id, row)
                .map_err(ScreenError::update)?;
            if changed == 0 {
                return Err(ScreenError::NotFound {
                    what: "student",
                    redirect: "/alumnos",
                });
            }
            log::info!("updated student {id}");
            Ok(id.to_string())
        }
        None => {
            let inserted = backend
                .insert("alumnos", vec![row])
                .map_err(ScreenError::insert)?;
            let id = inserted
                .first()
                .and_then(|r| r.get("id"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            log::info!("created student {id}");
            Ok(id)
        }
    }
}
