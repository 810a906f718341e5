use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::net::{DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_LOOKUP_URL};
use crate::surface::PrivacySettings;

const CONFIG_DIR: &str = ".tabshell";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "tabshell.log";
const DEFAULT_WIKI_BASE: &str = "https://es.wikipedia.org";
const DEFAULT_CONSOLE_WIDTH: u16 = 48;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Overrides the `newtab.html` next to the executable.
    pub(crate) home_uri: Option<String>,
    pub(crate) privacy: PrivacySettings,
    pub(crate) lookup_url: String,
    pub(crate) lookup_timeout_secs: u64,
    pub(crate) wiki_base: String,
    pub(crate) dark_mode: bool,
    pub(crate) console_width: u16,
    pub(crate) log_level: String,
    pub(crate) log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_uri: None,
            privacy: PrivacySettings::default(),
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            wiki_base: DEFAULT_WIKI_BASE.to_string(),
            dark_mode: false,
            console_width: DEFAULT_CONSOLE_WIDTH,
            log_level: "info".to_string(),
            log_file: Some(config_dir().join(LOG_FILE)),
        }
    }
}

impl Config {
    /// Config file (if any) with `TABSHELL_*` environment overrides applied.
    pub(crate) fn load() -> Result<Self> {
        let path = config_dir().join(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(home) = non_empty("TABSHELL_HOME_URI") {
            self.home_uri = Some(home);
        }
        if let Some(proxy) = non_empty("TABSHELL_PROXY") {
            self.privacy.proxy_uri = proxy;
        }
        if let Some(url) = non_empty("TABSHELL_LOOKUP_URL") {
            self.lookup_url = url;
        }
        if let Some(level) = non_empty("TABSHELL_LOG") {
            self.log_level = level;
        }
        if let Some(file) = non_empty("TABSHELL_LOG_FILE") {
            self.log_file = match file.to_ascii_lowercase().as_str() {
                "off" | "none" | "0" => None,
                _ => Some(PathBuf::from(file)),
            };
        }
        if let Some(width) = non_empty("TABSHELL_CONSOLE_WIDTH") {
            if let Ok(parsed) = width.parse::<u16>() {
                self.console_width = parsed.clamp(24, 160);
            }
        }
    }

    /// `file://<executable dir>/newtab.html` unless overridden.
    pub(crate) fn home_uri(&self) -> String {
        if let Some(home) = &self.home_uri {
            return home.clone();
        }
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        format!("file://{}/newtab.html", dir.display())
    }
}

fn config_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(CONFIG_DIR)
    } else {
        PathBuf::from(CONFIG_DIR)
    }
}
