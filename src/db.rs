use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "agora.sqlite3";

const DEFAULT_SUBJECTS: &[&str] = &[
    "Matemática",
    "Lengua y Literatura",
    "Historia",
    "Geografía",
    "Biología",
    "Física",
    "Química",
    "Inglés",
    "Educación Física",
    "Educación Artística",
];

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    register_fold_case(&conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_users(
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_salt TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            password_iterations INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_sessions(
            access_token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            revoked_at TEXT,
            FOREIGN KEY(user_id) REFERENCES auth_users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles(
            id TEXT PRIMARY KEY,
            role TEXT,
            FOREIGN KEY(id) REFERENCES auth_users(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS alumnos(
            id TEXT PRIMARY KEY,
            legajo TEXT NOT NULL,
            nombre TEXT NOT NULL,
            apellido TEXT NOT NULL,
            dni TEXT NOT NULL,
            fecha_nacimiento TEXT,
            curso TEXT NOT NULL,
            division TEXT NOT NULL,
            estado TEXT NOT NULL DEFAULT 'ACTIVO',
            email TEXT,
            telefono TEXT,
            direccion TEXT,
            tutor_nombre TEXT,
            tutor_telefono TEXT,
            observaciones TEXT,
            created_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_alumnos_curso_division ON alumnos(curso, division)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_alumnos_dni ON alumnos(dni)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS asistencias(
            id TEXT PRIMARY KEY,
            alumno_id TEXT NOT NULL,
            fecha TEXT NOT NULL,
            estado TEXT NOT NULL,
            created_at TEXT,
            FOREIGN KEY(alumno_id) REFERENCES alumnos(id),
            UNIQUE(alumno_id, fecha)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_asistencias_fecha ON asistencias(fecha)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS materias(
            id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL UNIQUE
        )",
        [],
    )?;
    seed_materias(&conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notas(
            id TEXT PRIMARY KEY,
            alumno_id TEXT NOT NULL,
            materia_id TEXT NOT NULL,
            periodo TEXT NOT NULL,
            tipo TEXT NOT NULL,
            nota REAL NOT NULL,
            fecha TEXT NOT NULL,
            observacion TEXT,
            created_at TEXT,
            FOREIGN KEY(alumno_id) REFERENCES alumnos(id),
            FOREIGN KEY(materia_id) REFERENCES materias(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notas_alumno ON notas(alumno_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notas_materia ON notas(materia_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS pagos(
            id TEXT PRIMARY KEY,
            alumno_id TEXT NOT NULL,
            periodo TEXT NOT NULL,
            monto REAL NOT NULL,
            estado TEXT NOT NULL DEFAULT 'PENDIENTE',
            fecha_pago TEXT,
            medio_pago TEXT,
            observacion TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(alumno_id) REFERENCES alumnos(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pagos_alumno ON pagos(alumno_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pagos_created ON pagos(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS conducta_incidentes(
            id TEXT PRIMARY KEY,
            alumno_id TEXT NOT NULL,
            fecha TEXT NOT NULL,
            tipo TEXT NOT NULL,
            nivel TEXT NOT NULL,
            descripcion TEXT NOT NULL,
            created_at TEXT,
            FOREIGN KEY(alumno_id) REFERENCES alumnos(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_conducta_alumno ON conducta_incidentes(alumno_id)",
        [],
    )?;

    for table in ["personal_docentes", "personal_no_docentes"] {
        let role_column = if table == "personal_no_docentes" {
            ",\n            rol TEXT"
        } else {
            ""
        };
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table}(
            id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL,
            apellido TEXT NOT NULL,
            dni TEXT NOT NULL,
            email TEXT,
            telefono TEXT{role_column},
            created_at TEXT
        )"
            ),
            [],
        )?;
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS actividades(
            id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL,
            dia_semana TEXT NOT NULL,
            horario TEXT NOT NULL,
            cupo INTEGER NOT NULL,
            responsable TEXT NOT NULL,
            created_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS dias_inhabiles(
            id TEXT PRIMARY KEY,
            fecha TEXT NOT NULL,
            motivo TEXT NOT NULL,
            alcance TEXT NOT NULL DEFAULT 'INSTITUCION',
            created_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_dias_inhabiles_fecha ON dias_inhabiles(fecha)",
        [],
    )?;

    Ok(conn)
}

fn seed_materias(conn: &Connection) -> anyhow::Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM materias", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }
    let mut stmt = conn.prepare("INSERT INTO materias(id, nombre) VALUES(?, ?)")?;
    for name in DEFAULT_SUBJECTS {
        stmt.execute((uuid::Uuid::new_v4().to_string(), name))?;
    }
    Ok(())
}

/// `fold_case(x)`: Unicode lowercase. SQLite's own `lower()` only folds ASCII.
fn register_fold_case(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Text(t) => Some(String::from_utf8_lossy(t).to_lowercase()),
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(f) => Some(f.to_string()),
                ValueRef::Null | ValueRef::Blob(_) => None,
            })
        },
    )
}
