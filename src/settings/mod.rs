use chrono::{ DateTime, Utc };
use log::{ info, warn };
use serde::{ Serialize, Deserialize };
use std::fs;
use std::io;
use std::path::Path;

/// Plain user preferences. Last write wins, nothing here carries an
/// invariant beyond that.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default = "default_sidebar_theme")]
    pub sidebar_theme: String,
    #[serde(default)]
    pub speak_replies: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_accent_color() -> String {
    "blue".to_string()
}

fn default_sidebar_theme() -> String {
    "light".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            accent_color: default_accent_color(),
            sidebar_theme: default_sidebar_theme(),
            speak_replies: false,
            updated_at: None,
        }
    }
}

impl Settings {
    /// Loads settings from disk. A missing file means defaults; a corrupt
    /// file is logged and also falls back to defaults rather than blocking
    /// startup.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No settings file at {}, using defaults", path.display());
                return Settings::default();
            }
            Err(e) => {
                warn!("Could not read settings file {}: {}", path.display(), e);
                return Settings::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Malformed settings file {}: {}", path.display(), e);
                Settings::default()
            }
        }
    }

    pub fn save(&mut self, path: &Path) -> Result<(), io::Error> {
        self.updated_at = Some(Utc::now());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.dark_mode = true;
        settings.accent_color = "purple".to_string();
        settings.speak_replies = true;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert!(loaded.dark_mode);
        assert_eq!(loaded.accent_color, "purple");
        assert!(loaded.speak_replies);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut first = Settings::default();
        first.accent_color = "green".to_string();
        first.save(&path).unwrap();

        let mut second = Settings::default();
        second.accent_color = "orange".to_string();
        second.save(&path).unwrap();

        assert_eq!(Settings::load(&path).accent_color, "orange");
    }
}
