//! Configuration for the redact command
//!
//! Every section and field is optional; a missing file behaves like an
//! empty one.
//!
//! ```toml
//! [render]
//! scale = 1.5
//!
//! [history]
//! limit = 50
//!
//! [text]
//! font_size = 12.0
//! color = "#B3B3B3"
//!
//! [stroke]
//! color = "#000000"
//! width = 2.0
//! opacity = 1.0
//! ```

use anyhow::Context;
use redact_core::{RedactError, StoreOptions, StrokeStyle, TextStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub history: HistoryConfig,
    /// Style of text stamps added by scripts that don't set their own
    pub text: TextStyle,
    /// Pen for strokes added by scripts that don't set their own
    pub stroke: StrokeStyle,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let scale = self.render.scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RedactError::InvalidScale(scale)).context("Invalid [render] section");
        }
        Ok(())
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            history_limit: match self.history.limit {
                0 => None,
                limit => Some(limit),
            },
        }
    }
}

/// How screen coordinates in scripts were produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render scale of the page the coordinates were taken from (default: 1.5)
    pub scale: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { scale: 1.5 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo steps kept, 0 for no limit
    pub limit: usize,
}
