use std::path::Path;

use serde::Deserialize;

use super::catalog::CatalogApp;

pub(super) const CONFIG_FILE: &str = "spring_config.json";
const DEFAULT_FAVICON_PATH: &str = "/favicon.ico";

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct AppConfig {
    /// Replaces the built-in launcher catalog used by bootstrap.
    #[serde(default)]
    pub(super) default_apps: Option<Vec<CatalogApp>>,
    #[serde(default)]
    pub(super) favicon_path: Option<String>,
    /// Skip seeding default pins (tests, kiosk builds).
    #[serde(default)]
    pub(super) disable_bootstrap: Option<bool>,
}

impl AppConfig {
    pub(super) fn favicon_path(&self) -> &str {
        self.favicon_path
            .as_deref()
            .map(str::trim)
            .filter(|p| p.starts_with('/'))
            .unwrap_or(DEFAULT_FAVICON_PATH)
    }

    pub(super) fn bootstrap_enabled(&self) -> bool {
        self.disable_bootstrap != Some(true)
    }
}

pub(super) fn load_app_config(data_dir: &str) -> AppConfig {
    let path = Path::new(data_dir).join(CONFIG_FILE);
    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppConfig::default(),
        Err(e) => {
            tracing::warn!(%e, path = %path.display(), "failed to read app config");
            return AppConfig::default();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(%e, path = %path.display(), "malformed app config, using defaults");
            AppConfig::default()
        }
    }
}
