use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PREFS_FILE: &str = "agora.prefs.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(default)]
    pub theme: Theme,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Prefs {
    /// Reads the preference file. A missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let mut prefs = match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str::<Prefs>(&text).unwrap_or_else(|e| {
                log::warn!("ignoring malformed prefs {}: {e}", path.display());
                Prefs::default()
            }),
            Err(_) => Prefs::default(),
        };
        prefs.path = Some(path.to_path_buf());
        prefs
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the new theme first; memory only changes once the file does.
    pub fn set_theme(&mut self, theme: Theme) -> anyhow::Result<()> {
        let next = Prefs {
            theme,
            path: self.path.clone(),
        };
        next.save()?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> anyhow::Result<Theme> {
        self.set_theme(self.theme.toggled())?;
        Ok(self.theme)
    }

    fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
