//! Application configuration
//!
//! Loaded from a JSON file under the XDG config directory
//! (`~/.config/codelib/config.json`), with every field defaulting
//! individually so a partial file keeps working across versions. Secrets can
//! be overridden through environment variables so they never have to live on
//! disk.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable overriding the shared confirmation secret.
pub const SECRET_ENV: &str = "CODELIB_SECRET";
/// Environment variable overriding the generator API key.
pub const GENERATOR_KEY_ENV: &str = "CODELIB_GENERATOR_KEY";
/// Environment variable overriding the image host API key.
pub const IMAGE_HOST_KEY_ENV: &str = "CODELIB_IMGBB_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interface language tag ("ka", "en", "es")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Shared secret required before save / save-as / delete. A single
    /// static passphrase is the entire trust boundary; it deters accidental
    /// misuse, nothing more.
    #[serde(default)]
    pub secret: String,

    /// Quiescence window in milliseconds before an edited draft is pushed to
    /// the preview.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Where the local snippet store lives. Defaults to the XDG data dir.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// AI generation collaborator settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Image hosting collaborator settings (template thumbnails)
    #[serde(default)]
    pub images: ImageHostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Base URL of the generation API
    #[serde(default = "default_generator_endpoint")]
    pub endpoint: String,

    /// Model name passed through to the API
    #[serde(default = "default_generator_model")]
    pub model: String,

    /// API key; prefer setting CODELIB_GENERATOR_KEY instead
    #[serde(default)]
    pub api_key: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generator_endpoint(),
            model: default_generator_model(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHostConfig {
    /// Upload endpoint
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,

    /// API key; prefer setting CODELIB_IMGBB_KEY instead
    #[serde(default)]
    pub api_key: String,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_endpoint(),
            api_key: String::new(),
        }
    }
}

fn default_locale() -> String {
    "ka".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_generator_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_generator_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_endpoint() -> String {
    "https://api.imgbb.com/1/upload".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            secret: String::new(),
            debounce_ms: default_debounce_ms(),
            storage_path: None,
            generator: GeneratorConfig::default(),
            images: ImageHostConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location: `$XDG_CONFIG_HOME/codelib/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("codelib").join("config.json"))
    }

    /// Default store location: `$XDG_DATA_HOME/codelib/snippets.json`
    pub fn default_storage_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("codelib").join("snippets.json"))
    }

    /// Load the configuration from `path`, falling back to defaults if the
    /// file does not exist. A malformed file is an error; silently ignoring
    /// it would mask typos in the secret.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let mut config: Config = serde_json::from_str(&contents)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                config.apply_env_overrides();
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                let mut config = Config::default();
                config.apply_env_overrides();
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// Atomic save: write to a temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            let contents = serde_json::to_string_pretty(self)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            self.secret = secret;
        }
        if let Ok(key) = std::env::var(GENERATOR_KEY_ENV) {
            self.generator.api_key = key;
        }
        if let Ok(key) = std::env::var(IMAGE_HOST_KEY_ENV) {
            self.images.api_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_serde_defaults() {
        let config = Config::default();
        assert_eq!(config.locale, "ka");
        assert_eq!(config.debounce_ms, 500);
        assert!(config.secret.is_empty());
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = serde_json::from_str(r#"{"secret":"s3cret"}"#).unwrap();
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.generator.model, "gemini-2.5-flash");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.debounce_ms = 250;
        config.locale = "en".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.debounce_ms, 250);
        assert_eq!(loaded.locale, "en");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.debounce_ms, 500);
    }
}
