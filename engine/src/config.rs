use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::CameraPreset;
use crate::renderer::RenderSettings;

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    IOError(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "Config file {} does not exist", path.display()),
            ConfigError::IOError(e) => write!(f, "Failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::NotFound(_) => None,
            ConfigError::IOError(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IOError(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Viewer settings, read from a JSON file. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub backbuffer_count: u32,
    /// No trace means the built-in cube is shown.
    pub trace: Option<PathBuf>,
    /// Frames rendered after the load finished or failed.
    pub frames: u32,
    pub render: RenderSettings,
    pub camera_presets: Vec<CameraPreset>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            backbuffer_count: 2,
            trace: None,
            frames: 60,
            render: RenderSettings::default(),
            camera_presets: Vec::new(),
        }
    }
}

impl ViewerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IOError(e)
            }
        })?;
        let mut config: ViewerConfig = serde_json::from_reader(BufReader::new(file))?;
        config.render = config.render.clamped();
        Ok(config)
    }
}
