mod test_support;

use serde_json::json;
use test_support::{
    open_as_admin, request_err, request_ok, spawn_sidecar, switch_to_role, temp_dir, ADMIN_EMAIL,
    PASSWORD,
};

#[test]
fn signed_out_requests_redirect_to_login() {
    let workspace = temp_dir("agora-auth-redirect");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let route = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "route.check",
        json!({ "path": "/alumnos" }),
    );
    assert_eq!(route["outcome"], "redirect");
    assert_eq!(route["redirect"], "/login");

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "route.check",
        json!({ "path": "/login" }),
    );
    assert_eq!(login["outcome"], "render");

    let (code, error) = request_err(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(code, "unauthenticated");
    assert_eq!(error["details"]["redirect"], "/login");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn sign_in_sign_out_and_bad_credentials() {
    let workspace = temp_dir("agora-auth-cycle");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_as_admin(&mut stdin, &mut reader, &workspace);

    let session = request_ok(&mut stdin, &mut reader, "1", "auth.session", json!({}));
    assert_eq!(session["user"]["email"], ADMIN_EMAIL);
    assert_eq!(session["role"], "ADMIN");

    let dash = request_ok(&mut stdin, &mut reader, "2", "dashboard.get", json!({}));
    assert_eq!(dash["initials"], "AD");
    assert_eq!(dash["nav"].as_array().map(|a| a.len()), Some(9));

    let out = request_ok(&mut stdin, &mut reader, "3", "auth.signOut", json!({}));
    assert_eq!(out["redirect"], "/login");
    assert!(out["session"].is_null());

    let (code, _) = request_err(&mut stdin, &mut reader, "4", "dashboard.get", json!({}));
    assert_eq!(code, "unauthenticated");

    let (code, error) = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "auth.signIn",
        json!({ "email": ADMIN_EMAIL, "password": "incorrecta" }),
    );
    assert_eq!(code, "auth_failed");
    assert_eq!(error["message"], "Invalid login credentials");

    let (code, error) = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "auth.signIn",
        json!({ "email": "sin-arroba", "password": "" }),
    );
    assert_eq!(code, "validation_failed");
    assert_eq!(error["details"]["fields"]["email"], "Email inválido");
    assert_eq!(error["details"]["fields"]["password"], "Contraseña requerida");

    let back = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "auth.signIn",
        json!({ "email": ADMIN_EMAIL, "password": PASSWORD }),
    );
    assert_eq!(back["redirect"], "/dashboard");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn session_survives_a_restart() {
    let workspace = temp_dir("agora-auth-restart");
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        open_as_admin(&mut stdin, &mut reader, &workspace);
        drop(stdin);
        let _ = child.wait();
    }
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["signedIn"], true);
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn roles_limit_screens_and_navigation() {
    let workspace = temp_dir("agora-auth-roles");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_as_admin(&mut stdin, &mut reader, &workspace);
    switch_to_role(&mut stdin, &mut reader, "TESORERIA");

    let route = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "route.check",
        json!({ "path": "/asistencias" }),
    );
    assert_eq!(route["outcome"], "forbidden");

    let (code, _) = request_err(&mut stdin, &mut reader, "2", "attendance.open", json!({}));
    assert_eq!(code, "forbidden");

    request_ok(&mut stdin, &mut reader, "3", "payments.list", json!({}));

    let nav = request_ok(&mut stdin, &mut reader, "4", "nav.items", json!({}));
    let paths: Vec<&str> = nav["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|i| i["path"].as_str())
        .collect();
    assert_eq!(paths, vec!["/dashboard", "/alumnos", "/pagos"]);

    // Only ADMIN provisions users once the first one exists.
    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "auth.createUser",
        json!({ "email": "otro@escuela.test", "password": PASSWORD, "role": "ADMIN" }),
    );
    assert_eq!(code, "forbidden");

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "route.check",
        json!({ "path": "/no-existe" }),
    );
    assert_eq!(code, "not_found");

    drop(stdin);
    let _ = child.wait();
}
