#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub const ADMIN_EMAIL: &str = "admin@escuela.test";
pub const PASSWORD: &str = "secreta123";

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_agorad");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn agorad");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

/// Asserts the call failed and returns its error code.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> (String, serde_json::Value) {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    let error = value.get("error").cloned().unwrap_or_else(|| json!({}));
    let code = error
        .get("code")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    (code, error)
}

/// Opens `workspace`, creates the first (ADMIN) account and signs it in.
pub fn open_as_admin(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &Path,
) {
    request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(
        stdin,
        reader,
        "bootstrap",
        "auth.createUser",
        json!({ "email": ADMIN_EMAIL, "password": PASSWORD }),
    );
    request_ok(
        stdin,
        reader,
        "signin-admin",
        "auth.signIn",
        json!({ "email": ADMIN_EMAIL, "password": PASSWORD }),
    );
}

/// From an ADMIN session, creates a user with `role` and switches to it.
pub fn switch_to_role(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    role: &str,
) -> String {
    let email = format!("{}@escuela.test", role.to_lowercase());
    request_ok(
        stdin,
        reader,
        "create-role",
        "auth.createUser",
        json!({ "email": email, "password": PASSWORD, "role": role }),
    );
    request_ok(stdin, reader, "signout", "auth.signOut", json!({}));
    request_ok(
        stdin,
        reader,
        "signin-role",
        "auth.signIn",
        json!({ "email": email, "password": PASSWORD }),
    );
    email
}

pub fn add_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    legajo: &str,
    apellido: &str,
    curso: &str,
    division: &str,
) -> String {
    let res = request_ok(
        stdin,
        reader,
        "add-student",
        "students.save",
        json!({
            "form": {
                "legajo": legajo,
                "nombre": "Alumno",
                "apellido": apellido,
                "dni": format!("4000{}", legajo),
                "curso": curso,
                "division": division,
                "estado": "ACTIVO"
            }
        }),
    );
    res["id"].as_str().expect("student id").to_string()
}
