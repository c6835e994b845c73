use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::device::DeviceClass;
use crate::score::Difficulty;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Forced device class; `None` derives it from the terminal width
    pub device: Option<DeviceClass>,
    pub default_song: String,
    /// Overrides the difficulty the song declares
    pub difficulty: Option<Difficulty>,
    pub log_level: String,
    pub save_results: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            default_song: "alphabet".to_string(),
            difficulty: None,
            log_level: "info".to_string(),
            save_results: true,
        }
    }
}

impl Config {
    /// The configured device class, else one derived from the terminal
    /// width, else the desktop layout.
    pub fn resolve_device(&self, terminal_columns: Option<u16>) -> DeviceClass {
        match (self.device, terminal_columns) {
            (Some(device), _) => device,
            (None, Some(columns)) => DeviceClass::from_terminal_columns(columns),
            (None, None) => DeviceClass::Pc,
        }
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "signbeat") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("signbeat_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
