use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MAX_RECENT_PROJECTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub render_width: u32,
    pub render_height: u32,
    #[serde(default)]
    pub recent_projects: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            render_width: 1280,
            render_height: 720,
            recent_projects: Vec::new(),
        }
    }
}

pub fn config_file() -> PathBuf {
    if let Ok(dir) = std::env::var("APP__CONFIG_DIR") {
        return PathBuf::from(dir).join("console.toml");
    }
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("scoreflow")
        .join("console.toml")
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_file()) {
        match toml::from_str::<Settings>(&raw) {
            Ok(file_cfg) => settings = file_cfg,
            Err(err) => warn!(%err, "ignoring malformed console.toml"),
        }
    }

    if let Ok(v) = std::env::var("APP__RENDER_WIDTH") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.render_width = parsed;
        }
    }
    if let Ok(v) = std::env::var("APP__RENDER_HEIGHT") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.render_height = parsed;
        }
    }

    settings
}

pub fn save_settings(settings: &Settings) -> anyhow::Result<()> {
    let path = config_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config dir '{}'", parent.display()))?;
    }
    let raw = toml::to_string_pretty(settings)?;
    fs::write(&path, raw)
        .with_context(|| format!("failed to write config '{}'", path.display()))?;
    Ok(())
}

/// Records a project at the front of the recent list: POSIX-normalized,
/// case-insensitively deduplicated, capped.
pub fn remember_recent_project(settings: &mut Settings, path: &Path) {
    let normalized = path.to_string_lossy().replace('\\', "/");
    settings
        .recent_projects
        .retain(|p| !p.eq_ignore_ascii_case(&normalized));
    settings.recent_projects.insert(0, normalized);
    settings.recent_projects.truncate(MAX_RECENT_PROJECTS);
}
