//! Data and auth service the screens talk to.
//!
//! The screens only see generic table operations (`select`, `insert`, `update`,
//! `upsert`, `delete`) and a session API; SQL stays inside this module.

mod auth;
mod catalog;
mod error;
mod query;

use crate::config::MAX_SESSION_TTL_HOURS;
use crate::db;
use rusqlite::Connection;
use std::path::Path;
use std::sync::mpsc::Sender;

pub use auth::{AuthEvent, Session, User};
pub use error::BackendError;
pub use query::{Row, Select};

pub struct Backend {
    conn: Connection,
    session: Option<Session>,
    session_ttl: chrono::Duration,
    listeners: Vec<Sender<AuthEvent>>,
}

impl Backend {
    pub fn open(workspace: &Path, session_ttl_hours: i64) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)?;
        let mut backend = Self {
            conn,
            session: None,
            session_ttl: chrono::Duration::hours(session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS)),
            listeners: Vec::new(),
        };
        backend.session = backend.restore_session()?;
        Ok(backend)
    }
}
