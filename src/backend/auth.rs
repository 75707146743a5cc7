use super::{Backend, BackendError};
use base64::engine::general_purpose::{STANDARD as B64, URL_SAFE_NO_PAD};
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use rusqlite::OptionalExtension;
use serde::Serialize;
use sha2::Sha256;
use std::sync::mpsc::{self, Receiver};

const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub expires_at: String,
    pub user: User,
}

impl Session {
    fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        chrono::DateTime::parse_from_rfc3339(&self.expires_at)
            .map(|t| t.with_timezone(&chrono::Utc) <= now)
            .unwrap_or(true)
    }
}

/// Pushed to every subscriber whenever the current session changes.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

fn verify_password(password: &str, salt_b64: &str, hash_b64: &str, iterations: u32) -> bool {
    let Ok(salt) = B64.decode(salt_b64) else {
        return false;
    };
    let key = derive_key(password, &salt, iterations.max(1));
    B64.encode(key) == hash_b64
}

fn new_access_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl Backend {
    pub fn user_count(&self) -> Result<i64, BackendError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM auth_users", [], |r| r.get(0))?)
    }

    pub fn create_user(&self, email: &str, password: &str) -> Result<User, BackendError> {
        let email = normalize_email(email);
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::WeakPassword(MIN_PASSWORD_LEN));
        }
        let exists = self
            .conn
            .query_row("SELECT 1 FROM auth_users WHERE email = ?", [&email], |r| {
                r.get::<_, i64>(0)
            })
            .optional()?
            .is_some();
        if exists {
            return Err(BackendError::UserExists);
        }

        let mut salt = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        let key = derive_key(password, &salt, DEFAULT_PBKDF2_ITERATIONS);
        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO auth_users(id, email, password_salt, password_hash, password_iterations, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &id,
                &email,
                B64.encode(salt),
                B64.encode(key),
                DEFAULT_PBKDF2_ITERATIONS,
                chrono::Utc::now().to_rfc3339(),
            ),
        )?;
        log::info!("created user {email}");
        Ok(User { id, email })
    }

    pub fn sign_in_with_password(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let email = normalize_email(email);
        let record: Option<(String, String, String, u32)> = self
            .conn
            .query_row(
                "SELECT id, password_salt, password_hash, password_iterations
                 FROM auth_users WHERE email = ?",
                [&email],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .optional()?;
        let Some((user_id, salt, hash, iterations)) = record else {
            log::warn!("sign-in rejected for unknown user {email}");
            return Err(BackendError::InvalidCredentials);
        };
        if !verify_password(password, &salt, &hash, iterations) {
            log::warn!("sign-in rejected for {email}");
            return Err(BackendError::InvalidCredentials);
        }

        if let Some(previous) = self.session.take() {
            self.revoke(&previous.access_token)?;
        }
        let now = chrono::Utc::now();
        let session = Session {
            access_token: new_access_token(),
            expires_at: (now + self.session_ttl).to_rfc3339(),
            user: User { id: user_id, email },
        };
        self.conn.execute(
            "INSERT INTO auth_sessions(access_token, user_id, created_at, expires_at)
             VALUES(?, ?, ?, ?)",
            (
                &session.access_token,
                &session.user.id,
                now.to_rfc3339(),
                &session.expires_at,
            ),
        )?;
        self.session = Some(session.clone());
        log::info!("signed in {}", session.user.email);
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    pub fn sign_out(&mut self) -> Result<(), BackendError> {
        let Some(session) = self.session.take() else {
            return Err(BackendError::NoSession);
        };
        self.revoke(&session.access_token)?;
        log::info!("signed out {}", session.user.email);
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    /// Current session, if one exists and has not expired. An expired session is
    /// dropped and reported to subscribers as a sign-out.
    pub fn get_session(&mut self) -> Result<Option<Session>, BackendError> {
        let expired = self
            .session
            .as_ref()
            .map(|s| s.is_expired(chrono::Utc::now()))
            .unwrap_or(false);
        if expired {
            if let Some(s) = self.session.take() {
                self.revoke(&s.access_token)?;
                log::info!("session for {} expired", s.user.email);
            }
            self.emit(AuthEvent::SignedOut);
        }
        Ok(self.session.clone())
    }

    pub fn on_auth_state_change(&mut self) -> Receiver<AuthEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    pub(super) fn restore_session(&self) -> Result<Option<Session>, BackendError> {
        let row: Option<(String, String, String, String)> = self
            .conn
            .query_row(
                "SELECT s.access_token, s.expires_at, u.id, u.email
                 FROM auth_sessions s
                 JOIN auth_users u ON u.id = s.user_id
                 WHERE s.revoked_at IS NULL
                 ORDER BY s.created_at DESC
                 LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .optional()?;
        let Some((access_token, expires_at, id, email)) = row else {
            return Ok(None);
        };
        let session = Session {
            access_token,
            expires_at,
            user: User { id, email },
        };
        if session.is_expired(chrono::Utc::now()) {
            return Ok(None);
        }
        Ok(Some(session))
    }

    fn revoke(&self, access_token: &str) -> Result<(), BackendError> {
        self.conn.execute(
            "UPDATE auth_sessions SET revoked_at = ? WHERE access_token = ?",
            (chrono::Utc::now().to_rfc3339(), access_token),
        )?;
        Ok(())
    }

    fn emit(&mut self, event: AuthEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
