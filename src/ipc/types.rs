use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::backend::Backend;
use crate::config::Args;
use crate::prefs::Prefs;
use crate::screens::attendance::AttendanceScreen;
use crate::session::AuthContext;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Args,
    pub workspace: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub auth: AuthContext,
    pub attendance: AttendanceScreen,
    pub prefs: Prefs,
}

impl AppState {
    pub fn new(config: Args) -> Self {
        let prefs = Prefs::load(&config.prefs_path(None));
        Self {
            config,
            workspace: None,
            backend: None,
            auth: AuthContext::new(),
            attendance: AttendanceScreen::new(),
            prefs,
        }
    }

    /// Opens (creating if needed) the workspace database, restores any live
    /// session and loads the workspace's theme preference.
    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let mut backend = Backend::open(path, self.config.session_ttl_hours)?;
        self.close_workspace();
        self.auth.init(&mut backend);
        self.prefs = Prefs::load(&self.config.prefs_path(Some(path)));
        self.workspace = Some(path.to_path_buf());
        self.backend = Some(backend);
        log::info!("opened workspace {}", path.display());
        Ok(())
    }

    pub fn close_workspace(&mut self) {
        if let Some(ws) = self.workspace.take() {
            log::info!("closed workspace {}", ws.display());
        }
        self.auth.teardown();
        self.attendance = AttendanceScreen::new();
        self.backend = None;
    }

    /// Brings the auth context up to date with whatever the backend reported.
    pub fn sync_auth(&mut self) {
        let before = self.user_id();
        if let Some(backend) = self.backend.as_mut() {
            // An expired session is noticed here and reported as a sign-out.
            if let Err(e) = backend.get_session() {
                log::error!("session check failed: {e}");
            }
            self.auth.sync(backend);
        }
        self.forget_screens_unless(before);
    }

    pub fn user_id(&self) -> Option<String> {
        self.auth.user().map(|u| u.id.clone())
    }

    /// Per-user screen state never outlives the session that built it.
    pub fn forget_screens_unless(&mut self, user_id: Option<String>) {
        if self.user_id() != user_id {
            log::debug!("session changed, resetting screen state");
            self.attendance = AttendanceScreen::new();
        }
    }
}
