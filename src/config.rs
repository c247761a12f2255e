//! Configuration file support for cdtag.
//!
//! The configuration names the three directories of a batch, the naming
//! tags that pair files across them, the change classes and a few user
//! preferences. It is stored as versioned JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_A_TAG, DEFAULT_B_TAG, DEFAULT_CLASSES, DEFAULT_OUT_TAG, DEFAULT_PANEL_SIZE,
};
use crate::model::{ClassPalette, PaletteError};
use crate::scheduler::{NamingTags, PairDirs};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub directories: DirectoryConfig,

    #[serde(default)]
    pub tags: TagConfig,

    /// Change classes in display order
    #[serde(default = "default_class_configs")]
    pub classes: Vec<ClassConfig>,

    #[serde(default)]
    pub preferences: UserPreferences,
}

fn default_class_configs() -> Vec<ClassConfig> {
    DEFAULT_CLASSES
        .iter()
        .map(|(tag, color)| ClassConfig {
            tag: (*tag).to_string(),
            color: (*color).to_string(),
        })
        .collect()
}

/// Directories of one annotation batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Reference (earlier) images
    #[serde(default)]
    pub reference_dir: PathBuf,
    /// Target (later) images
    #[serde(default)]
    pub target_dir: PathBuf,
    /// Result records
    #[serde(default)]
    pub output_dir: PathBuf,
}

/// Naming tags pairing files across the batch directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConfig {
    #[serde(default = "default_a_tag")]
    pub a_tag: String,
    #[serde(default = "default_b_tag")]
    pub b_tag: String,
    #[serde(default = "default_out_tag")]
    pub out_tag: String,
}

fn default_a_tag() -> String {
    DEFAULT_A_TAG.to_string()
}

fn default_b_tag() -> String {
    DEFAULT_B_TAG.to_string()
}

fn default_out_tag() -> String {
    DEFAULT_OUT_TAG.to_string()
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            a_tag: default_a_tag(),
            b_tag: default_b_tag(),
            out_tag: default_out_tag(),
        }
    }
}

/// A change class as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub tag: String,
    /// Color name or `#rrggbb`
    pub color: String,
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Load the next pending pair after every save or skip
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,

    /// Side length of the square annotation panel in pixels
    #[serde(default = "default_panel_size")]
    pub panel_size: u32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_auto_advance() -> bool {
    true
}

fn default_panel_size() -> u32 {
    DEFAULT_PANEL_SIZE
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            auto_advance: default_auto_advance(),
            panel_size: default_panel_size(),
            log_level: LogLevel::default(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            directories: DirectoryConfig::default(),
            tags: TagConfig::default(),
            classes: default_class_configs(),
            preferences: UserPreferences::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "config.json"
    }

    /// Default config file location, falling back to `~/.config`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("cdtag").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join("cdtag")
                    .join(Self::default_filename())
            })
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from `path`, or the default path when `None`.
    ///
    /// A missing file yields the defaults; an unreadable one is an error.
    pub fn load_or_new(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::new());
        };

        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Ok(Self::new());
        }
        Self::load(&path)
    }

    /// Write the configuration, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Resolve the configured classes into a palette.
    pub fn palette(&self) -> Result<ClassPalette, ConfigError> {
        let pairs = self
            .classes
            .iter()
            .map(|c| (c.tag.as_str(), c.color.as_str()));
        Ok(ClassPalette::from_pairs(pairs)?)
    }

    pub fn naming_tags(&self) -> NamingTags {
        NamingTags::new(&self.tags.a_tag, &self.tags.b_tag, &self.tags.out_tag)
    }

    pub fn pair_dirs(&self) -> PairDirs {
        PairDirs::new(
            &self.directories.reference_dir,
            &self.directories.target_dir,
            &self.directories.output_dir,
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid class definitions: {0}")]
    InvalidClasses(#[from] PaletteError),
}
