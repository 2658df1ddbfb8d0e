use anyhow::{Context, Result, bail};
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Location of the user overlay, relative to `$HOME`.
const USER_CONFIG: &str = ".config/wish/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shell: ShellSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct ShellSettings {
    /// Printed before each line in interactive mode.
    #[serde(default)]
    pub prompt: String,
    /// Initial search path.
    #[serde(default)]
    pub search_path: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: LevelFilter,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> LevelFilter {
    LevelFilter::Off
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    shell: ShellOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct ShellOverlay {
    prompt: Option<String>,
    search_path: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<LevelFilter>,
    file: Option<PathBuf>,
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Apply the user overlay from ~/.config/wish/config.toml (if it exists)
    ///
    /// Every value present in the overlay replaces the default outright; the
    /// search path is not merged entry by entry.
    pub fn load() -> Result<Self> {
        let mut config = Self::default_config();
        let Some(home) = std::env::var_os("HOME") else {
            return Ok(config);
        };
        let path = Path::new(&home).join(USER_CONFIG);
        if path.is_file() {
            config
                .apply_overlay(Self::read_overlay(&path)?)
                .with_context(|| format!("applying {}", path.display()))?;
        }
        Ok(config)
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// An empty entry in `search_path` is an error; an empty list is not.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) -> Result<()> {
        if let Some(prompt) = overlay.shell.prompt {
            self.shell.prompt = prompt;
        }
        if let Some(search_path) = overlay.shell.search_path {
            if search_path.iter().any(String::is_empty) {
                bail!("search_path entries must not be empty");
            }
            self.shell.search_path = search_path;
        }
        if let Some(level) = overlay.logging.level {
            self.logging.level = level;
        }
        if overlay.logging.file.is_some() {
            self.logging.file = overlay.logging.file;
        }
        Ok(())
    }
}
