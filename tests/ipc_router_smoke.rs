mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{request, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn router_answers_health_and_rejects_unknown_methods() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health["version"].is_string());
    assert!(health["workspacePath"].is_null());

    let (code, _) = request_err(&mut stdin, &mut reader, "2", "grades.frobnicate", json!({}));
    assert_eq!(code, "not_implemented");

    // Screen methods need a workspace before anything else.
    let (code, _) = request_err(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(code, "no_workspace");

    let session = request_ok(&mut stdin, &mut reader, "4", "auth.session", json!({}));
    assert!(session["session"].is_null());

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json reply");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("reply is json");
    assert_eq!(value["error"]["code"], "bad_json");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn every_screen_family_is_routed() {
    let workspace = temp_dir("agora-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    test_support::open_as_admin(&mut stdin, &mut reader, &workspace);

    let methods = [
        ("dashboard.get", json!({})),
        ("nav.items", json!({})),
        ("route.check", json!({ "path": "/alumnos" })),
        ("students.list", json!({})),
        ("students.new", json!({})),
        ("attendance.open", json!({})),
        ("grades.subjects", json!({})),
        ("grades.roster", json!({})),
        ("payments.list", json!({})),
        ("behavior.list", json!({})),
        ("staff.list", json!({ "kind": "docentes" })),
        ("activities.list", json!({})),
        ("calendar.list", json!({})),
        ("prefs.get", json!({})),
    ];
    for (i, (method, params)) in methods.into_iter().enumerate() {
        let resp = request(&mut stdin, &mut reader, &format!("m{i}"), method, params);
        assert_eq!(resp["ok"], true, "{} failed: {}", method, resp);
    }

    drop(stdin);
    let _ = child.wait();
}
