use clap::Parser;
use std::path::{Path, PathBuf};

use crate::prefs::PREFS_FILE;

/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// School management sidecar speaking line-delimited JSON over stdio.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Workspace directory to open at startup
    #[arg(long, env = "AGORA_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Theme preference file (defaults to agora.prefs.json in the workspace)
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    /// Lifetime of a sign-in session
    #[arg(
        long,
        default_value_t = 12,
        value_parser = clap::value_parser!(i64).range(1..=MAX_SESSION_TTL_HOURS)
    )]
    pub session_ttl_hours: i64,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            workspace: None,
            prefs: None,
            session_ttl_hours: 12,
        }
    }
}

impl Args {
    /// Preference file for the given workspace, or the explicit override.
    /// Without either, prefs live in the working directory.
    pub fn prefs_path(&self, workspace: Option<&Path>) -> PathBuf {
        if let Some(p) = &self.prefs {
            return p.clone();
        }
        match workspace {
            Some(ws) => ws.join(PREFS_FILE),
            None => PathBuf::from(PREFS_FILE),
        }
    }
}
