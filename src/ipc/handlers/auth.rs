use crate::guard::HOME_PATH;
use crate::ipc::helpers::{
    auth_err, backend, get_required_str, get_str_or_empty, no_workspace, open, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::screens::ScreenError;
use crate::session::Role;
use crate::validate::{validate, FieldRule, Rule};
use serde_json::json;

const CREDENTIALS_SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: "email",
        rules: &[Rule::Required("Email requerido"), Rule::Email("Email inválido")],
    },
    FieldRule {
        field: "password",
        rules: &[Rule::Required("Contraseña requerida")],
    },
];

fn session_result(state: &AppState) -> serde_json::Value {
    json!({
        "loading": state.auth.is_loading(),
        "session": state.auth.session(),
        "user": state.auth.user(),
        "role": state.auth.role(),
    })
}

fn check_credentials(params: &serde_json::Value) -> Result<(String, String), HandlerErr> {
    let values = params.as_object().cloned().unwrap_or_default();
    let errors = validate(&values, CREDENTIALS_SCHEMA);
    if !errors.is_empty() {
        return Err(ScreenError::Validation(errors).into());
    }
    Ok((
        get_required_str(params, "email")?,
        get_required_str(params, "password")?,
    ))
}

fn auth_session(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(session_result(state))
}

fn auth_sign_in(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let (email, password) = check_credentials(params)?;
    let before = state.user_id();
    let Some(backend) = state.backend.as_mut() else {
        return Err(no_workspace());
    };
    backend
        .sign_in_with_password(&email, &password)
        .map_err(auth_err)?;
    state.auth.sync(backend);
    state.forget_screens_unless(before);
    let mut result = session_result(state);
    result["redirect"] = json!(HOME_PATH);
    Ok(result)
}

fn auth_sign_out(
    state: &mut AppState,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let before = state.user_id();
    let Some(backend) = state.backend.as_mut() else {
        return Err(no_workspace());
    };
    state.auth.sign_out(backend).map_err(auth_err)?;
    state.forget_screens_unless(before);
    let mut result = session_result(state);
    result["redirect"] = json!("/login");
    Ok(result)
}

/// Provisions a login. Open to anyone while the workspace has no users, so the
/// first account can be made; after that only ADMIN may add users.
fn auth_create_user(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let (email, password) = check_credentials(params)?;
    let role_raw = get_str_or_empty(params, "role");
    let role = if role_raw.is_empty() {
        None
    } else {
        Some(Role::parse(&role_raw).ok_or_else(|| {
            HandlerErr::new("bad_params", format!("unknown role {role_raw}"))
        })?)
    };

    let b = backend(state)?;
    let existing = b
        .user_count()
        .map_err(|e| HandlerErr::from(ScreenError::query(e)))?;
    let bootstrap = existing == 0;
    if !bootstrap && state.auth.role() != Some(Role::Admin) {
        return Err(HandlerErr::new(
            "forbidden",
            "only ADMIN can create users",
        ));
    }
    let role = role.or(bootstrap.then_some(Role::Admin));

    let user = b.create_user(&email, &password).map_err(auth_err)?;
    if let Some(role) = role {
        let profile = json!({ "id": user.id, "role": role.as_str() });
        b.insert("profiles", vec![profile.as_object().cloned().unwrap_or_default()])
            .map_err(|e| HandlerErr::from(ScreenError::insert(e)))?;
    }
    Ok(json!({ "user": user, "role": role }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.session" => Some(open(state, req, auth_session)),
        "auth.signIn" => Some(open(state, req, auth_sign_in)),
        "auth.signOut" => Some(open(state, req, auth_sign_out)),
        "auth.createUser" => Some(open(state, req, auth_create_user)),
        _ => None,
    }
}
