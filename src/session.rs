use crate::backend::{AuthEvent, Backend, BackendError, Select, Session, User};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{Receiver, TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Secretaria,
    Docente,
    Preceptor,
    Tesoreria,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Secretaria,
        Role::Docente,
        Role::Preceptor,
        Role::Tesoreria,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Secretaria => "SECRETARIA",
            Role::Docente => "DOCENTE",
            Role::Preceptor => "PRECEPTOR",
            Role::Tesoreria => "TESORERIA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

/// Who is signed in and with which role.
///
/// Built once per open workspace and handed to every request handler. It never
/// sets session state on its own: sign-in and sign-out go through the backend and
/// come back as [`AuthEvent`]s, which [`AuthContext::sync`] applies.
pub struct AuthContext {
    session: Option<Session>,
    role: Option<Role>,
    loading: bool,
    events: Option<Receiver<AuthEvent>>,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext {
    pub fn new() -> Self {
        Self {
            session: None,
            role: None,
            loading: true,
            events: None,
        }
    }

    pub fn init(&mut self, backend: &mut Backend) {
        self.events = Some(backend.on_auth_state_change());
        match backend.get_session() {
            Ok(session) => self.apply(backend, session),
            Err(e) => {
                log::error!("session lookup failed: {e}");
                self.session = None;
                self.role = None;
                self.loading = false;
            }
        }
        // get_session may have queued a sign-out for an expired session that is
        // already reflected above.
        self.sync(backend);
    }

    /// Applies every auth change the backend reported since the last call.
    pub fn sync(&mut self, backend: &Backend) {
        loop {
            let event = match self.events.as_ref().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                Some(Err(TryRecvError::Empty)) | None => break,
                Some(Err(TryRecvError::Disconnected)) => {
                    self.events = None;
                    break;
                }
            };
            match event {
                AuthEvent::SignedIn(session) => self.apply(backend, Some(session)),
                AuthEvent::SignedOut => self.apply(backend, None),
            }
        }
    }

    pub fn sign_out(&mut self, backend: &mut Backend) -> Result<(), BackendError> {
        backend.sign_out()?;
        self.sync(backend);
        Ok(())
    }

    pub fn teardown(&mut self) {
        *self = Self::new();
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn apply(&mut self, backend: &Backend, session: Option<Session>) {
        self.role = match &session {
            Some(s) => fetch_role(backend, &s.user.id),
            None => None,
        };
        self.session = session;
        self.loading = false;
    }
}

fn fetch_role(backend: &Backend, user_id: &str) -> Option<Role> {
    let query = Select::from("profiles").columns(&["role"]).eq("id", user_id);
    let row = match backend.select_single(&query) {
        Ok(row) => row,
        Err(e) => {
            log::error!("role lookup for {user_id} failed: {e}");
            return None;
        }
    };
    let raw = row.get("role").and_then(|v| v.as_str()).unwrap_or("");
    let role = Role::parse(raw);
    if role.is_none() {
        log::warn!("user {user_id} has unrecognised role {raw:?}");
    }
    role
}
