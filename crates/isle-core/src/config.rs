//! Runtime configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Error type for invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IsleConfig {
    /// Client-side navigation.
    #[serde(default)]
    pub router: RouterConfig,

    /// Lazy module activation.
    #[serde(default)]
    pub islands: IslandConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LogConfig,
}

impl IsleConfig {
    /// Load config from a TOML or JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))?
        } else {
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.router.origin_url()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// What to do when a newer navigation overtakes one still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupersedePolicy {
    /// Only the most recently requested navigation may swap the tree.
    #[default]
    LatestRequested,
    /// Whichever fetch settles last wins, even if it was requested earlier.
    LastResolved,
}

/// Navigation controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Origin navigation targets are resolved against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Reset scroll to the top after a navigation commits.
    #[serde(default = "default_true")]
    pub scroll_to_top: bool,

    /// Handling of superseded navigations.
    #[serde(default)]
    pub supersede: SupersedePolicy,
}

fn default_origin() -> String {
    "http://localhost".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            scroll_to_top: true,
            supersede: SupersedePolicy::default(),
        }
    }
}

impl RouterConfig {
    /// Create a router configuration for an origin.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Default::default()
        }
    }

    /// Set the supersede policy.
    pub fn with_supersede(mut self, policy: SupersedePolicy) -> Self {
        self.supersede = policy;
        self
    }

    /// Parse the configured origin.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::InvalidOrigin {
            origin: self.origin.clone(),
            reason: e.to_string(),
        })
    }
}

/// Island activation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IslandConfig {
    /// Distance outside the viewport at which a module counts as near.
    #[serde(default = "default_lead_margin")]
    pub lead_margin_px: u32,

    /// Module types that are always lazily activated.
    #[serde(default = "default_lazy_types")]
    pub lazy_types: Vec<String>,

    /// Number of leading modules rendered eagerly.
    #[serde(default = "default_eager_count")]
    pub eager_count: usize,
}

fn default_lead_margin() -> u32 {
    200
}

fn default_lazy_types() -> Vec<String> {
    ["Gallery", "Comments", "VideoPlayer", "Map", "Chart"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_eager_count() -> usize {
    3
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            lead_margin_px: default_lead_margin(),
            lazy_types: default_lazy_types(),
            eager_count: default_eager_count(),
        }
    }
}

impl IslandConfig {
    /// Check if the module at `index` with type `module_type` is lazy.
    pub fn is_lazy(&self, module_type: &str, index: usize) -> bool {
        index >= self.eager_count || self.lazy_types.iter().any(|t| t == module_type)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format (for development).
    #[default]
    Human,
    /// JSON format (for log aggregation).
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive (e.g. "info", "isle_router=debug").
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::InvalidLogLevel(self.level.clone()));
        }
        Ok(())
    }
}
