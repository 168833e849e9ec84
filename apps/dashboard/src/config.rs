use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::ControllerSettings;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub report_dir: PathBuf,
    pub controller: ControllerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000/".into(),
            report_dir: PathBuf::from("./reports"),
            controller: ControllerSettings::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    report_dir: Option<PathBuf>,
    controller: Option<ControllerSettings>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new("dashboard.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        if let Some(v) = file_cfg.backend_url {
            settings.backend_url = v;
        }
        if let Some(v) = file_cfg.report_dir {
            settings.report_dir = v;
        }
        if let Some(v) = file_cfg.controller {
            settings.controller = v;
        }
    }

    if let Some(v) = env("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = env("REPORT_DIR") {
        settings.report_dir = PathBuf::from(v);
    }
    if let Some(v) = env("APP__REPORT_DIR") {
        settings.report_dir = PathBuf::from(v);
    }

    if let Some(v) = env("APP__OPTIMIZE_MIN_DURATION_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.controller.optimize_min_duration_ms = parsed;
        }
    }
    if let Some(v) = env("APP__REVEAL_DURATION_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.controller.reveal_duration_ms = parsed;
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
