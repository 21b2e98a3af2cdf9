use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use callpilot_engine::{AtomicFileWriter, LlmSettings};
use pilot_logging::{pilot_info, pilot_warn};
use serde::{Deserialize, Serialize};

const SETTINGS_DIR: &str = "callpilot";
const SETTINGS_FILENAME: &str = "settings.ron";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct PersistedSettings {
    endpoint: String,
    token: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    client_tag: Option<String>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

/// `<config dir>/callpilot/settings.ron`.
pub(crate) fn default_settings_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or_else(|| anyhow!("no configuration directory; pass --config"))?;
    Ok(base.join(SETTINGS_DIR).join(SETTINGS_FILENAME))
}

/// Missing or unreadable settings load as unconfigured defaults.
pub(crate) fn load_settings(path: &Path) -> LlmSettings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return LlmSettings::default();
        }
        Err(err) => {
            pilot_warn!("Failed to read settings from {:?}: {}", path, err);
            return LlmSettings::default();
        }
    };

    let persisted: PersistedSettings = match ron::from_str(&content) {
        Ok(persisted) => persisted,
        Err(err) => {
            pilot_warn!("Failed to parse settings from {:?}: {}", path, err);
            return LlmSettings::default();
        }
    };

    let defaults = LlmSettings::default();
    pilot_info!("Loaded settings from {:?}", path);
    LlmSettings {
        endpoint: persisted.endpoint.trim().to_string(),
        token: persisted.token.trim().to_string(),
        model: persisted.model.unwrap_or(defaults.model),
        client_tag: persisted.client_tag.unwrap_or(defaults.client_tag),
        request_timeout: persisted
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout),
        connect_timeout: defaults.connect_timeout,
    }
}

pub(crate) fn save_settings(path: &Path, settings: &LlmSettings) -> Result<PathBuf> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("settings path {:?} has no file name", path))?;

    let defaults = LlmSettings::default();
    let persisted = PersistedSettings {
        endpoint: settings.endpoint.clone(),
        token: settings.token.clone(),
        model: (settings.model != defaults.model).then(|| settings.model.clone()),
        client_tag: (settings.client_tag != defaults.client_tag)
            .then(|| settings.client_tag.clone()),
        request_timeout_secs: (settings.request_timeout != defaults.request_timeout)
            .then(|| settings.request_timeout.as_secs()),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(&persisted, pretty).context("serializing settings")?;
    let written = AtomicFileWriter::new(dir)
        .write(file_name, &content)
        .with_context(|| format!("writing settings to {}", path.display()))?;
    pilot_info!("Saved settings to {:?}", written);
    Ok(written)
}
