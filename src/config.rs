//! Explorer configuration.
//!
//! Settings are read from an optional JSON file. Every field has a default,
//! so a partial file (or none at all) is valid.
//!
//! ```json
//! {
//!   "layout": { "fixed_step": 320.0 },
//!   "query": { "categories": ["package", "manage"] },
//!   "style": { "links": { "Hard": [255, 255, 255] } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::asset::{DependencyCategory, DEFAULT_QUERY_CATEGORIES};
use crate::graph::{LayoutConfig, LinkKind, NodeKind};

/// Errors that can occur while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the file from disk
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content
    #[error("Failed to parse config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// An RGB color, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Hex form, e.g. `#ECFCE3`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Which dependency categories the adapter asks the index for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Categories passed to every referencer query
    pub categories: Vec<DependencyCategory>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_QUERY_CATEGORIES.to_vec(),
        }
    }
}

/// Colors used by renderers and exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Wire color per link kind, keyed by kind name
    pub links: BTreeMap<String, Rgb>,
    /// Title color of the root node
    pub root_title: Rgb,
    /// Title color of package nodes
    pub package_title: Rgb,
    /// Title color of every other node
    pub other_title: Rgb,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let links = [
            (LinkKind::Hard, Rgb(236, 252, 227)),
            (LinkKind::HardEditorOnly, Rgb(118, 126, 114)),
            (LinkKind::Soft, Rgb(145, 66, 117)),
            (LinkKind::SoftEditorOnly, Rgb(73, 33, 58)),
            (LinkKind::Passive, Rgb(128, 128, 128)),
        ]
        .into_iter()
        .map(|(kind, color)| (kind.name().to_string(), color))
        .collect();

        Self {
            links,
            root_title: Rgb(51, 204, 51),
            package_title: Rgb(140, 140, 140),
            other_title: Rgb(0, 140, 158),
        }
    }
}

impl StyleConfig {
    /// Color of a link kind. Kinds missing from the map fall back to the passive color.
    pub fn link_color(&self, kind: LinkKind) -> Rgb {
        self.links
            .get(kind.name())
            .or_else(|| self.links.get(LinkKind::Passive.name()))
            .copied()
            .unwrap_or(Rgb(128, 128, 128))
    }

    /// Title color of a node.
    pub fn title_color(&self, kind: NodeKind, is_root: bool) -> Rgb {
        if is_root {
            return self.root_title;
        }
        match kind {
            NodeKind::Package => self.package_title,
            _ => self.other_title,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Layout settings
    pub layout: LayoutConfig,
    /// Index query settings
    pub query: QueryConfig,
    /// Colors
    pub style: StyleConfig,
}

impl ExplorerConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parses and validates configuration from a JSON string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use refscope::config::ExplorerConfig;
    ///
    /// let config = ExplorerConfig::parse_str(r#"{ "layout": { "fixed_step": 250.0 } }"#).unwrap();
    /// assert_eq!(config.layout.fixed_step, 250.0);
    /// assert_eq!(config.query.categories.len(), 2);
    /// ```
    pub fn parse_str(content: &str) -> ConfigResult<Self> {
        let config: ExplorerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.layout.fixed_step.is_finite() && self.layout.fixed_step > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "layout.fixed_step must be a positive number, got {}",
                self.layout.fixed_step
            )));
        }
        if let Some(name) = self
            .style
            .links
            .keys()
            .find(|name| LinkKind::from_name(name).is_none())
        {
            return Err(ConfigError::InvalidValue(format!(
                "style.links has unknown link kind '{}'",
                name
            )));
        }
        if self.query.categories.is_empty() {
            return Err(ConfigError::InvalidValue(
                "query.categories must name at least one category".to_string(),
            ));
        }
        Ok(())
    }
}
