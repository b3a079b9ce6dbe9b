use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

use crate::{error::StaveError, history::MAX_HISTORY_SIZE, properties::ModelTier};

pub const DEFAULT_PREAMBLE: &str =
    "You are ChatGPT, a large language model trained by OpenAI. Answer as concisely as possible.";

/// User-facing generation settings. Consumed by the core, owned and persisted by the caller.
///
/// Field aliases accept the camelCase names used by earlier saved settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(alias = "defaultPreamble")]
    pub default_preamble: String,
    #[serde(alias = "autoZoom")]
    pub auto_zoom: bool,
    pub model: String,
    #[serde(alias = "temp")]
    pub temperature: f64,
    #[serde(alias = "n")]
    pub completion_count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_preamble: DEFAULT_PREAMBLE.to_string(),
            auto_zoom: true,
            model: "gpt-4".to_string(),
            temperature: 1.2,
            completion_count: 3,
        }
    }
}

impl Settings {
    pub fn model_tier(&self) -> Option<ModelTier> {
        ModelTier::from_model(&self.model)
    }
}

/// Placement constants for freshly created nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal gap between a new tree and the rightmost existing node.
    pub new_tree_x_offset: f64,
    /// Upper bound (exclusive) of the random vertical offset given to new child nodes.
    pub overlap_randomness_max: f64,
    /// x of the first tree in an empty graph.
    pub first_tree_x: f64,
    pub tree_root_y: f64,
    pub child_y_offset: f64,
    /// Horizontal gap between a new child and its rightmost existing sibling.
    pub sibling_x_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            new_tree_x_offset: 600.0,
            overlap_randomness_max: 20.0,
            first_tree_x: 0.0,
            tree_root_y: 500.0,
            child_y_offset: 100.0,
            sibling_x_offset: 180.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_history: usize,
    /// Seed for the placement jitter. `None` seeds from system entropy.
    pub jitter_seed: Option<u64>,
    pub layout: LayoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_history: MAX_HISTORY_SIZE,
            jitter_seed: None,
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaveConfig {
    pub settings: Settings,
    pub engine: EngineConfig,
}

impl StaveConfig {
    pub fn validate(&self) -> Result<(), StaveError> {
        if !(0.0..=2.0).contains(&self.settings.temperature) {
            return Err(StaveError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.settings.temperature
            )));
        }
        if self.settings.completion_count == 0 {
            return Err(StaveError::Config(
                "completion_count must be at least 1".to_string(),
            ));
        }
        if self.engine.max_history == 0 {
            return Err(StaveError::Config(
                "max_history must be at least 1".to_string(),
            ));
        }
        if self.engine.layout.overlap_randomness_max < 0.0 {
            return Err(StaveError::Config(
                "overlap_randomness_max must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

pub trait ConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<StaveConfig, StaveError>;
    fn set_config(&self, config: &StaveConfig) -> Result<(), StaveError>;

    fn get_settings(&self) -> Result<Settings, StaveError> {
        Ok(self.get_config()?.settings)
    }

    fn set_settings(&self, settings: Settings) -> Result<(), StaveError> {
        let mut config = self.get_config()?;
        config.settings = settings;
        self.set_config(&config)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<StaveConfig, StaveError> {
        tracing::debug!("Attempting to read config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(StaveConfig::default());
        }
        let content = read_to_string(&self.path)?;
        let config: StaveConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn set_config(&self, config: &StaveConfig) -> Result<(), StaveError> {
        tracing::debug!("Attempting to write config to: {:?}", &self.path);
        config.validate()?;
        let toml_string = toml::to_string(config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}
