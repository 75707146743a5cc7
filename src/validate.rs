//! Declarative field checks for form submissions.
//!
//! A form is described as a list of [`FieldRule`]s. Validation collects at most one
//! message per field (the first rule that fails) and never touches the backend.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Required(&'static str),
    /// Minimum length in characters, after trimming.
    MinLen(usize, &'static str),
    /// Email format; an empty value passes.
    Email(&'static str),
    OneOf(&'static [&'static str], &'static str),
    /// Parses as a number; an empty value passes.
    Number(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"))
}

/// Text of a field as the form would show it. Numbers are rendered, null and
/// missing values are empty.
pub fn field_text(values: &Map<String, Value>, field: &str) -> String {
    match values.get(field) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn check(rule: &Rule, text: &str) -> Option<&'static str> {
    match *rule {
        Rule::Required(msg) => text.is_empty().then_some(msg),
        Rule::MinLen(n, msg) => (text.chars().count() < n).then_some(msg),
        Rule::Email(msg) => (!text.is_empty() && !email_re().is_match(text)).then_some(msg),
        Rule::OneOf(allowed, msg) => (!allowed.contains(&text)).then_some(msg),
        Rule::Number(msg) => {
            (!text.is_empty() && parse_number(text).is_none()).then_some(msg)
        }
    }
}

pub fn validate(values: &Map<String, Value>, schema: &[FieldRule]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in schema {
        let text = field_text(values, field.field);
        if let Some(msg) = field.rules.iter().find_map(|r| check(r, &text)) {
            errors.insert(field.field.to_string(), msg.to_string());
        }
    }
    errors
}

/// Accepts a comma as decimal separator.
pub fn parse_number(text: &str) -> Option<f64> {
    let n: f64 = text.trim().replace(',', ".").parse().ok()?;
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &[FieldRule] = &[
        FieldRule {
            field: "nombre",
            rules: &[Rule::Required("Nombre requerido")],
        },
        FieldRule {
            field: "dni",
            rules: &[Rule::MinLen(7, "DNI inválido")],
        },
        FieldRule {
            field: "email",
            rules: &[Rule::Email("Email inválido")],
        },
        FieldRule {
            field: "estado",
            rules: &[Rule::OneOf(&["ACTIVO", "INACTIVO"], "Estado inválido")],
        },
    ];

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn collects_one_message_per_field() {
        let errors = validate(
            &obj(json!({ "nombre": "  ", "dni": "12345", "email": "no-at", "estado": "X" })),
            SCHEMA,
        );
        assert_eq!(errors.get("nombre").map(String::as_str), Some("Nombre requerido"));
        assert_eq!(errors.get("dni").map(String::as_str), Some("DNI inválido"));
        assert_eq!(errors.get("email").map(String::as_str), Some("Email inválido"));
        assert_eq!(errors.get("estado").map(String::as_str), Some("Estado inválido"));
    }

    #[test]
    fn empty_email_and_numeric_dni_pass() {
        let errors = validate(
            &obj(json!({ "nombre": "Ana", "dni": 40111222, "email": "", "estado": "ACTIVO" })),
            SCHEMA,
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn numbers_accept_comma_decimals() {
        assert_eq!(parse_number("7,5"), Some(7.5));
        assert_eq!(parse_number(" 10 "), Some(10.0));
        assert_eq!(parse_number("diez"), None);
        assert_eq!(parse_number("NaN"), None);
    }
}
