use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::label::{Canvas, DEFAULT_CANVAS_WIDTH};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const API_KEY_ENV: &str = "API_KEY";
const DEFAULT_CALLER: &str = "default";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub canvas_width: u32,
    pub font_path: Option<String>,
    pub font_family: Option<String>,
    /// Caller name to API key.
    pub api_keys: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            font_path: None,
            font_family: None,
            api_keys: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    canvas: Option<CanvasSettings>,
    font: Option<FontSettings>,
    api_keys: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CanvasSettings {
    width: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    path: Option<String>,
    family: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    if let Ok(raw) = std::env::var(API_KEY_ENV) {
        settings.merge_api_key_env(&raw);
    }

    Ok(settings)
}

impl Settings {
    pub fn canvas(&self) -> Canvas {
        Canvas::from_width(self.canvas_width)
    }

    /// Returns the caller that owns `key`. Blank keys never match.
    pub fn caller_for_key(&self, key: &str) -> Option<&str> {
        if key.trim().is_empty() {
            return None;
        }
        self.api_keys
            .iter()
            .find(|(_, value)| value.as_str() == key)
            .map(|(caller, _)| caller.as_str())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr;
                }
            }
        }
        if let Some(canvas) = incoming.canvas {
            if let Some(width) = canvas.width {
                if width > 0 {
                    self.canvas_width = width;
                }
            }
        }
        if let Some(font) = incoming.font {
            if let Some(path) = font.path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(family) = font.family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
        }
        if let Some(keys) = incoming.api_keys {
            self.merge_api_keys(keys);
        }
    }

    /// `API_KEY` holds either a JSON object of caller to key, or one key
    /// that is registered for the `default` caller.
    pub(crate) fn merge_api_key_env(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match serde_json::from_str::<BTreeMap<String, String>>(raw) {
            Ok(keys) => self.merge_api_keys(keys),
            Err(_) => {
                self.api_keys
                    .insert(DEFAULT_CALLER.to_string(), raw.to_string());
            }
        }
    }

    fn merge_api_keys(&mut self, keys: BTreeMap<String, String>) {
        for (caller, key) in keys {
            if !key.trim().is_empty() {
                self.api_keys.insert(caller, key);
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".credit-overlay"))
        }
    })
}
