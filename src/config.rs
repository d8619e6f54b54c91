//! Runtime settings. Read once at startup from `config.yaml` inside the data
//! directory, then overridden by a few environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use tracing::info;

use crate::i18n::Lang;
use crate::media::MediaRoot;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".memorial-manager";
const CONFIG_FILE_NAME: &str = "config.yaml";
const DB_FILE_NAME: &str = "memorial.sqlite";
const LOG_FILE_NAME: &str = "memorial.log";
const MEDIA_DIR_NAME: &str = "media";

const DEFAULT_CATALOG_URL: &str = "https://mp3quran.net/api/v3";
const DEFAULT_SITEMAP_HOST: &str = "https://example.org";

const ENV_LANG: &str = "MEMORIAL_LANG";
const ENV_CATALOG_URL: &str = "MEMORIAL_CATALOG_URL";
const ENV_DB: &str = "MEMORIAL_DB";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: Lang,
    pub catalog_url: String,
    pub request_timeout_secs: u64,
    pub database_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    /// Accounts granted the admin role whenever they sign up or sign in.
    pub admin_emails: Vec<String>,
    pub sitemap_host: String,
    /// Folder holding recordings referenced by site paths such as
    /// `/audio/doaa.mp3`. Defaults to `media/` in the data directory.
    pub media_dir: Option<PathBuf>,
    /// When set, site paths are fetched from this host instead.
    pub media_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Lang::Ar,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            request_timeout_secs: 10,
            database_path: None,
            log_file: None,
            log_level: "info".to_string(),
            admin_emails: Vec::new(),
            sitemap_host: DEFAULT_SITEMAP_HOST.to_string(),
            media_dir: None,
            media_base_url: None,
        }
    }
}

impl Settings {
    /// Load `config.yaml` from the data directory (defaults when it does not
    /// exist) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let dir = data_dir()?;
        let mut settings = Self::load_from(&dir.join(CONFIG_FILE_NAME))?;
        settings.apply_env(|key| env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse a settings file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings = Self::from_yaml(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("invalid settings")
    }

    /// Apply overrides looked up through `lookup`, which stands in for
    /// `env::var` so tests do not touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lang) = lookup(ENV_LANG) {
            self.language = lang.parse::<Lang>().map_err(|err| anyhow!(err))?;
        }
        if let Some(url) = lookup(ENV_CATALOG_URL) {
            self.catalog_url = url;
        }
        if let Some(path) = lookup(ENV_DB) {
            self.database_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(DB_FILE_NAME)),
        }
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(LOG_FILE_NAME)),
        }
    }

    pub fn media_root(&self) -> Result<MediaRoot> {
        let dir = match &self.media_dir {
            Some(path) => path.clone(),
            None => data_dir()?.join(MEDIA_DIR_NAME),
        };
        Ok(MediaRoot::new(dir, self.media_base_url.clone()))
    }
}

/// Resolve the application data directory inside the user's home.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml("language: en\nadmin_emails: [a@b.c]\n").unwrap();
        assert_eq!(settings.language, Lang::En);
        assert_eq!(settings.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(settings.request_timeout_secs, 10);
        assert_eq!(settings.admin_emails, vec!["a@b.c".to_string()]);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut settings = Settings::default();
        settings
            .apply_env(|key| match key {
                ENV_LANG => Some("en".into()),
                ENV_DB => Some("/tmp/m.sqlite".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(settings.language, Lang::En);
        assert_eq!(settings.database_path().unwrap(), PathBuf::from("/tmp/m.sqlite"));
    }

    #[test]
    fn media_settings_build_the_media_root() {
        let settings = Settings::from_yaml(
            "media_dir: /srv/memorial\nmedia_base_url: https://memorial.example.org\n",
        )
        .unwrap();
        let root = settings.media_root().unwrap();
        assert_eq!(root.dir(), Path::new("/srv/memorial"));
        assert_eq!(
            root.resolve("/audio/doaa.mp3").unwrap(),
            "https://memorial.example.org/audio/doaa.mp3"
        );
    }

    #[test]
    fn bad_language_override_is_an_error() {
        let mut settings = Settings::default();
        assert!(settings.apply_env(|_| Some("xx".into())).is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let settings = Settings::load_from(Path::new("/nonexistent/config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
