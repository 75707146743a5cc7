use super::BackendError;

/// Shape of a table reachable through the generic table API.
///
/// Every identifier that ends up in generated SQL is taken from here, never from the
/// caller, so callers can only name tables and columns that exist.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Result<&'static str, BackendError> {
        self.columns
            .iter()
            .copied()
            .find(|c| *c == name)
            .ok_or_else(|| BackendError::UnknownColumn {
                table: self.name.to_string(),
                column: name.to_string(),
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(&name)
    }
}

const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "profiles",
        columns: &["id", "role"],
    },
    TableSpec {
        name: "alumnos",
        columns: &[
            "id",
            "legajo",
            "nombre",
            "apellido",
            "dni",
            "fecha_nacimiento",
            "curso",
            "division",
            "estado",
            "email",
            "telefono",
            "direccion",
            "tutor_nombre",
            "tutor_telefono",
            "observaciones",
            "created_at",
        ],
    },
    TableSpec {
        name: "asistencias",
        columns: &["id", "alumno_id", "fecha", "estado", "created_at"],
    },
    TableSpec {
        name: "materias",
        columns: &["id", "nombre"],
    },
    TableSpec {
        name: "notas",
        columns: &[
            "id",
            "alumno_id",
            "materia_id",
            "periodo",
            "tipo",
            "nota",
            "fecha",
            "observacion",
            "created_at",
        ],
    },
    TableSpec {
        name: "pagos",
        columns: &[
            "id",
            "alumno_id",
            "periodo",
            "monto",
            "estado",
            "fecha_pago",
            "medio_pago",
            "observacion",
            "created_at",
        ],
    },
    TableSpec {
        name: "conducta_incidentes",
        columns: &[
            "id",
            "alumno_id",
            "fecha",
            "tipo",
            "nivel",
            "descripcion",
            "created_at",
        ],
    },
    TableSpec {
        name: "personal_docentes",
        columns: &["id", "nombre", "apellido", "dni", "email", "telefono", "created_at"],
    },
    TableSpec {
        name: "personal_no_docentes",
        columns: &[
            "id",
            "nombre",
            "apellido",
            "dni",
            "email",
            "telefono",
            "rol",
            "created_at",
        ],
    },
    TableSpec {
        name: "actividades",
        columns: &[
            "id",
            "nombre",
            "dia_semana",
            "horario",
            "cupo",
            "responsable",
            "created_at",
        ],
    },
    TableSpec {
        name: "dias_inhabiles",
        columns: &["id", "fecha", "motivo", "alcance", "created_at"],
    },
];

pub fn table(name: &str) -> Result<&'static TableSpec, BackendError> {
    TABLES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| BackendError::UnknownTable(name.to_string()))
}
