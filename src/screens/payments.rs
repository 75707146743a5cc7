use super::{
    into_row, matches_query, non_empty, now_rfc3339, RosterStudent, ScreenError, ScreenResult,
};
use crate::backend::{Backend, BackendError, Row, Select};
use crate::validate::{parse_number, FieldErrors};
use serde::{Deserialize, Serialize};

pub const RECENT_LIMIT: usize = 50;
pub const MEDIOS_PAGO: &[&str] = &["EFECTIVO", "TRANSFERENCIA", "TARJETA"];
pub const ESTADOS_PAGO: &[&str] = &["PAGADO", "PENDIENTE"];
/// Shorter DNIs are not looked up.
pub const MIN_LOOKUP_DNI_LEN: usize = 6;

/// Latest payments, newest first, each with the paying student attached under
/// `alumno`.
pub fn recent(backend: &Backend) -> ScreenResult<Vec<Row>> {
    let query = Select::from("pagos")
        .embed("alumno", "alumnos", "alumno_id", &["nombre", "apellido", "dni"])
        .order("created_at", false)
        .limit(RECENT_LIMIT);
    backend.select(&query).map_err(ScreenError::query)
}

fn embedded<'a>(row: &'a Row, key: &str) -> &'a str {
    row.get("alumno")
        .and_then(|a| a.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

/// Keeps payments whose student surname or DNI contains `search`.
pub fn filter_payments(rows: Vec<Row>, search: &str) -> Vec<Row> {
    rows.into_iter()
        .filter(|r| matches_query(search, &[embedded(r, "apellido"), embedded(r, "dni")]))
        .collect()
}

pub fn list(backend: &Backend, search: &str) -> ScreenResult<Vec<Row>> {
    Ok(filter_payments(recent(backend)?, search))
}

/// Finds the student with exactly this DNI. `None` when the DNI is too short to
/// bother, when nobody matches, or when the match is ambiguous.
pub fn lookup_student(backend: &Backend, dni: &str) -> ScreenResult<Option<RosterStudent>> {
    let dni = dni.trim();
    if dni.chars().count() < MIN_LOOKUP_DNI_LEN {
        return Ok(None);
    }
    let query = Select::from("alumnos")
        .columns(&["id", "nombre", "apellido", "dni"])
        .eq("dni", dni);
    let row = match backend.select_maybe_single(&query) {
        Ok(row) => row,
        Err(BackendError::NotSingle(_)) => {
            log::warn!("dni {dni} matches more than one student");
            None
        }
        Err(e) => return Err(ScreenError::query(e)),
    };
    row.map(|r| serde_json::from_value(serde_json::Value::Object(r)))
        .transpose()
        .map_err(|e| ScreenError::query(e.into()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentForm {
    pub alumno_id: String,
    /// `YYYY-MM`
    pub periodo: String,
    pub monto: String,
    pub medio_pago: String,
    pub estado: String,
    pub observacion: String,
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self {
            alumno_id: String::new(),
            periodo: chrono::Local::now().format("%Y-%m").to_string(),
            monto: String::new(),
            medio_pago: MEDIOS_PAGO[0].to_string(),
            estado: ESTADOS_PAGO[0].to_string(),
            observacion: String::new(),
        }
    }
}

#[derive(Serialize)]
struct NewPayment<'a> {
    alumno_id: &'a str,
    periodo: &'a str,
    monto: f64,
    estado: &'a str,
    fecha_pago: Option<String>,
    medio_pago: &'a str,
    observacion: Option<String>,
}

pub fn create(backend: &Backend, form: &PaymentForm) -> ScreenResult<Row> {
    let mut errors = FieldErrors::new();
    if form.alumno_id.trim().is_empty() {
        errors.insert("alumno_id".to_string(), "Seleccioná un alumno".to_string());
    }
    let first_day = format!("{}-01", form.periodo.trim());
    if chrono::NaiveDate::parse_from_str(&first_day, "%Y-%m-%d").is_err() {
        errors.insert("periodo".to_string(), "Periodo inválido".to_string());
    }
    let monto = parse_number(&form.monto);
    match monto {
        None => {
            errors.insert("monto".to_string(), "Monto requerido".to_string());
        }
        Some(m) if m <= 0.0 => {
            errors.insert("monto".to_string(), "Monto inválido".to_string());
        }
        Some(_) => {}
    }
    if !MEDIOS_PAGO.contains(&form.medio_pago.as_str()) {
        errors.insert("medio_pago".to_string(), "Medio de pago inválido".to_string());
    }
    if !ESTADOS_PAGO.contains(&form.estado.as_str()) {
        errors.insert("estado".to_string(), "Estado inválido".to_string());
    }
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors));
    }

    let paid = form.estado == "PAGADO";
    let row = into_row(&NewPayment {
        alumno_id: form.alumno_id.trim(),
        periodo: form.periodo.trim(),
        monto: monto.unwrap_or_default(),
        estado: &form.estado,
        fecha_pago: paid.then(now_rfc3339),
        medio_pago: &form.medio_pago,
        observacion: non_empty(Some(form.observacion.clone())),
    })?;
    let mut inserted = backend
        .insert("pagos", vec![row])
        .map_err(ScreenError::insert)?;
    log::info!("registered payment for {} ({})", form.alumno_id, form.periodo);
    inserted
        .pop()
        .ok_or_else(|| ScreenError::Rejected("payment was not stored".to_string()))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{add_student, backend};
    use super::*;
    use serde_json::json;

    fn pay(b: &Backend, alumno_id: &str, periodo: &str) -> Row {
        create(
            b,
            &PaymentForm {
                alumno_id: alumno_id.to_string(),
                periodo: periodo.to_string(),
                monto: "1500".to_string(),
                ..PaymentForm::default()
            },
        )
        .expect("payment")
    }

    #[test]
    fn create_defaults_to_paid_in_cash_with_timestamp() {
        let b = backend();
        let a = add_student(&b, "Acosta", "1º", "A", "ACTIVO");
        let row = pay(&b, &a, "2024-03");
        assert_eq!(row["estado"], json!("PAGADO"));
        assert_eq!(row["medio_pago"], json!("EFECTIVO"));
        assert!(row["fecha_pago"].as_str().is_some());
    }

    #[test]
    fn missing_amount_and_student_are_field_errors() {
        let b = backend();
        match create(&b, &PaymentForm::default()) {
            Err(ScreenError::Validation(errors)) => {
                assert!(errors.contains_key("monto"));
                assert!(errors.contains_key("alumno_id"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn list_is_newest_first_and_searchable() {
        let b = backend();
        let a = add_student(&b, "Acosta", "1º", "A", "ACTIVO");
        let z = add_student(&b, "Zárate", "1º", "A", "ACTIVO");
        pay(&b, &a, "2024-03");
        pay(&b, &z, "2024-04");
        let all = list(&b, "").expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["alumno"]["apellido"], json!("Zárate"));
        let hit = list(&b, "ACOS").expect("list");
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0]["alumno_id"], json!(a));
    }

    #[test]
    fn lookup_requires_six_digits_and_exact_match() {
        let b = backend();
        let a = add_student(&b, "Acosta", "1º", "A", "ACTIVO");
        let dni = b
            .select(&Select::from("alumnos").eq("id", a.as_str()))
            .expect("student")[0]["dni"]
            .as_str()
            .expect("dni")
            .to_string();
        assert_eq!(lookup_student(&b, &dni[..5]).expect("short"), None);
        let found = lookup_student(&b, &dni).expect("lookup").expect("found");
        assert_eq!(found.id, a);
        assert_eq!(lookup_student(&b, "99999999").expect("lookup"), None);
    }
}
