mod test_support;

use serde_json::json;
use test_support::{
    add_student, open_as_admin, request_err, request_ok, spawn_sidecar, switch_to_role, temp_dir,
};

fn estados(view: &serde_json::Value) -> Vec<(String, String, bool)> {
    view["roster"]
        .as_array()
        .expect("roster")
        .iter()
        .map(|e| {
            (
                e["student"]["apellido"].as_str().unwrap_or("").to_string(),
                e["estado"].as_str().unwrap_or("").to_string(),
                e["recorded"].as_bool().unwrap_or(false),
            )
        })
        .collect()
}

#[test]
fn take_attendance_save_and_reload() {
    let workspace = temp_dir("agora-attendance");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_as_admin(&mut stdin, &mut reader, &workspace);

    let a = add_student(&mut stdin, &mut reader, "1001", "Acosta", "1º", "A");
    let _b = add_student(&mut stdin, &mut reader, "1002", "Benítez", "1º", "A");
    add_student(&mut stdin, &mut reader, "1003", "Otro", "2º", "A");

    let open = request_ok(&mut stdin, &mut reader, "1", "attendance.open", json!({}));
    assert_eq!(open["phase"], "idle");
    assert!(open["options"]["estados"].is_array());

    let selection = json!({ "curso": "1º", "division": "A", "fecha": "2025-03-10" });
    let view = request_ok(&mut stdin, &mut reader, "2", "attendance.select", selection.clone());
    assert_eq!(view["phase"], "ready");
    assert_eq!(
        estados(&view),
        vec![
            ("Acosta".to_string(), "PRESENTE".to_string(), false),
            ("Benítez".to_string(), "PRESENTE".to_string(), false),
        ]
    );

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.setStatus",
        json!({ "alumnoId": a, "estado": "AUSENTE" }),
    );
    assert_eq!(estados(&view)[0].1, "AUSENTE");

    let saved = request_ok(&mut stdin, &mut reader, "4", "attendance.save", json!({}));
    assert_eq!(saved["written"], 2);
    assert_eq!(saved["phase"], "saved");
    assert_eq!(saved["saved"], true);

    // Saving again overwrites rather than duplicating.
    let again = request_ok(&mut stdin, &mut reader, "5", "attendance.save", json!({}));
    assert_eq!(again["written"], 2);

    let reloaded = request_ok(&mut stdin, &mut reader, "6", "attendance.reload", json!({}));
    assert_eq!(
        estados(&reloaded),
        vec![
            ("Acosta".to_string(), "AUSENTE".to_string(), true),
            ("Benítez".to_string(), "PRESENTE".to_string(), true),
        ]
    );

    // Another date starts from defaults again.
    let other_day = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.select",
        json!({ "curso": "1º", "division": "A", "fecha": "2025-03-11" }),
    );
    assert!(estados(&other_day).iter().all(|(_, e, r)| e == "PRESENTE" && !r));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn attendance_rejects_saves_without_a_roster() {
    let workspace = temp_dir("agora-attendance-empty");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_as_admin(&mut stdin, &mut reader, &workspace);

    let (code, _) = request_err(&mut stdin, &mut reader, "1", "attendance.save", json!({}));
    assert_eq!(code, "validation_failed");

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.select",
        json!({ "curso": "6º", "division": "D", "fecha": "2025-03-10" }),
    );
    let (code, error) = request_err(&mut stdin, &mut reader, "3", "attendance.save", json!({}));
    assert_eq!(code, "validation_failed");
    assert_eq!(error["message"], "No hay alumnos para guardar");

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.select",
        json!({ "curso": "1º", "division": "A", "fecha": "10/03/2025" }),
    );
    assert_eq!(code, "validation_failed");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unsaved_roster_does_not_carry_over_to_the_next_user() {
    let workspace = temp_dir("agora-attendance-handover");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_as_admin(&mut stdin, &mut reader, &workspace);
    let a = add_student(&mut stdin, &mut reader, "1101", "Acosta", "1º", "A");

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.select",
        json!({ "curso": "1º", "division": "A", "fecha": "2025-03-10" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.setStatus",
        json!({ "alumnoId": a, "estado": "AUSENTE" }),
    );

    switch_to_role(&mut stdin, &mut reader, "PRECEPTOR");

    let view = request_ok(&mut stdin, &mut reader, "3", "attendance.open", json!({}));
    assert_eq!(view["phase"], "idle");
    assert_eq!(view["roster"].as_array().map(|r| r.len()), Some(0));

    let (code, _) = request_err(&mut stdin, &mut reader, "4", "attendance.save", json!({}));
    assert_eq!(code, "validation_failed");

    drop(stdin);
    let _ = child.wait();
}
