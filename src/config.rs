use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Fallback chain description. Fonts are listed in priority order.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub face: FaceSettings,
    #[serde(default, rename = "font")]
    pub fonts: Vec<FontEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FaceSettings {
    /// Size in points for outline fonts.
    pub size: Option<f32>,
    pub dpi: Option<f32>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FontEntry {
    pub path: PathBuf,
    pub format: Option<FontFormat>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontFormat {
    Outline,
    Bitmap,
}

impl Default for FaceSettings {
    fn default() -> Self {
        Self {
            size: None,
            dpi: None,
        }
    }
}

impl FaceSettings {
    pub fn size_pt(&self) -> f32 {
        self.size.unwrap_or(12.0)
    }

    pub fn dpi(&self) -> f32 {
        self.dpi.unwrap_or(72.0)
    }
}

impl FontEntry {
    /// Explicit format, else `.bdf` files are bitmap fonts and everything
    /// else is an outline font.
    pub fn format(&self) -> FontFormat {
        if let Some(format) = self.format {
            return format;
        }
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bdf") => FontFormat::Bitmap,
            _ => FontFormat::Outline,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads an explicitly requested config file. Errors are reported.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Loads the user config file, falling back to an empty chain.
    pub fn load_default() -> Self {
        let config_path = match config_file_path() {
            Some(path) => path,
            None => return Config::default(),
        };

        if !config_path.exists() {
            return Config::default();
        }

        match Self::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}", e);
                Config::default()
            }
        }
    }

    /// Makes relative font paths relative to `dir`.
    fn resolve_paths(&mut self, dir: &Path) {
        for font in &mut self.fonts {
            if font.path.is_relative() {
                font.path = dir.join(&font.path);
            }
        }
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
        Some(
            PathBuf::from(config_dir)
                .join("multiface")
                .join("chain.toml"),
        )
    } else if let Some(home) = std::env::var_os("HOME") {
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("multiface")
                .join("chain.toml"),
        )
    } else {
        None
    }
}
