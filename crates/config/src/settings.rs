// Application settings
// Loaded from ~/.config/commentbank/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of rows shown by the preview pass
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Upload
    #[serde(rename = "upload.previewRows")]
    pub preview_rows: usize,

    /// Encoding label for uploaded files ("auto" = UTF-8 with Windows-1252 fallback)
    #[serde(rename = "upload.encoding")]
    pub encoding: String,

    /// comma, semicolon, colon, tab or auto
    #[serde(rename = "upload.delimiter")]
    pub delimiter: String,

    // Store
    #[serde(rename = "store.path")]
    pub store_path: Option<PathBuf>,  // None = data dir default

    // Import handles
    #[serde(rename = "import.tempDir")]
    pub temp_dir: Option<PathBuf>,  // None = state dir default

    // Authorship
    #[serde(rename = "user.id")]
    pub user_id: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            encoding: "UTF-8".to_string(),
            delimiter: "comma".to_string(),
            store_path: None,
            temp_dir: None,
            user_id: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("commentbank")
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file is created with commented
    /// defaults; an unreadable or malformed one yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(path);
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Save current settings to `path`
    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Database file, from settings or `<data dir>/commentbank/commentbank.db`
    pub fn effective_store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("commentbank")
                .join("commentbank.db")
        })
    }

    /// Root for stored uploads, from settings or the platform state dir
    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join("commentbank")
        })
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Upload defaults
    "upload.previewRows": 10,
    // Encoding label, or "auto" (UTF-8, falling back to Windows-1252)
    "upload.encoding": "UTF-8",
    // comma, semicolon, colon, tab or auto
    "upload.delimiter": "comma",

    // SQLite database (null = platform data directory)
    "store.path": null,

    // Where uploads wait between preview and commit (null = platform state directory)
    "import.tempDir": null,

    // Author stamped on committed comments
    "user.id": null
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("error writing default settings.json: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_creates_commented_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        // The generated file must parse back to the same defaults
        let reloaded = Settings::load_from(&path);
        assert_eq!(reloaded, Settings::default());
    }

    #[test]
    fn test_parse_partial_with_comments() {
        let json = r#"{
            // bigger sample
            "upload.previewRows": 100,
            "user.id": 5
        }"#;
        let settings = Settings::parse(json).unwrap();
        assert_eq!(settings.preview_rows, 100);
        assert_eq!(settings.user_id, Some(5));
        assert_eq!(settings.encoding, "UTF-8");
        assert_eq!(settings.delimiter, "comma");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            preview_rows: 20,
            store_path: Some(dir.path().join("bank.db")),
            user_id: Some(2),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_effective_paths_prefer_settings() {
        let settings = Settings {
            store_path: Some(PathBuf::from("/srv/bank.db")),
            temp_dir: Some(PathBuf::from("/srv/tmp")),
            ..Settings::default()
        };
        assert_eq!(settings.effective_store_path(), PathBuf::from("/srv/bank.db"));
        assert_eq!(settings.effective_temp_dir(), PathBuf::from("/srv/tmp"));
    }
}
