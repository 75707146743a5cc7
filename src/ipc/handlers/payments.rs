use crate::guard::Screen;
use crate::ipc::helpers::{backend, get_str_or_empty, guarded, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::screens::payments::{self, PaymentForm, ESTADOS_PAGO, MEDIOS_PAGO};
use serde_json::json;

fn payments_list(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let search = get_str_or_empty(params, "search");
    let rows = payments::list(backend(state)?, &search)?;
    Ok(json!({
        "payments": rows,
        "defaults": PaymentForm::default(),
        "options": { "mediosPago": MEDIOS_PAGO, "estados": ESTADOS_PAGO },
    }))
}

fn payments_lookup_student(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let dni = get_str_or_empty(params, "dni");
    let student = payments::lookup_student(backend(state)?, &dni)?;
    Ok(json!({ "student": student }))
}

fn payments_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let form: PaymentForm = parse_params(params, None)?;
    let payment = payments::create(backend(state)?, &form)?;
    Ok(json!({ "payment": payment }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "payments.list" => Some(guarded(state, req, Screen::Payments, payments_list)),
        "payments.lookupStudent" => {
            Some(guarded(state, req, Screen::Payments, payments_lookup_student))
        }
        "payments.create" => Some(guarded(state, req, Screen::Payments, payments_create)),
        _ => None,
    }
}
