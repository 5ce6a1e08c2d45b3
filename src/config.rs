//! Engine configuration.
//!
//! All tunable values the tools consult are collected in [`EngineConfig`]
//! and threaded into the editor at construction. The configuration can be
//! exported to and imported from JSON so an installation can adjust, for
//! example, the polygon simplification tolerance.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;

/// Log level setting for the engine.
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
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Convert to log crate's LevelFilter.
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

/// Engine configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Ramer-Douglas-Peucker tolerance applied to committed polygons and
    /// brush results, in image pixels. Zero disables simplification.
    #[serde(default = "default_simplify_epsilon")]
    pub simplify_epsilon: f64,

    /// Screen-space radius around the first vertex that closes a polygon
    #[serde(default = "default_closing_threshold")]
    pub closing_threshold_px: f64,

    /// Points closer than this to the previous one are ignored (image pixels)
    #[serde(default = "default_min_vertex_distance")]
    pub min_vertex_distance: f64,

    /// Spacing of the points inserted between polygon vertices before
    /// simplification (image pixels)
    #[serde(default = "default_interpolation_step")]
    pub interpolation_step: f64,

    /// Screen-space radius for vertex picking
    #[serde(default = "default_vertex_hit_threshold")]
    pub vertex_hit_threshold_px: f64,

    /// Screen-space distance for edge picking (point insertion)
    #[serde(default = "default_edge_hit_threshold")]
    pub edge_hit_threshold_px: f64,

    /// Brush size settings
    #[serde(default)]
    pub brush: BrushConfig,

    /// Maximum number of undoable operations kept
    #[serde(default = "default_max_undo_history")]
    pub max_undo_history: usize,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_simplify_epsilon() -> f64 {
    constants::DEFAULT_SIMPLIFY_EPSILON
}

fn default_closing_threshold() -> f64 {
    constants::CLOSING_THRESHOLD_PX
}

fn default_min_vertex_distance() -> f64 {
    constants::MIN_VERTEX_DISTANCE
}

fn default_interpolation_step() -> f64 {
    constants::INTERPOLATION_STEP
}

fn default_vertex_hit_threshold() -> f64 {
    constants::VERTEX_HIT_THRESHOLD_PX
}

fn default_edge_hit_threshold() -> f64 {
    constants::EDGE_HIT_THRESHOLD_PX
}

fn default_max_undo_history() -> usize {
    100
}

/// Brush sizing section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushConfig {
    /// Diameter of a freshly activated brush
    #[serde(default = "default_brush_size")]
    pub default_size: f64,

    /// Largest diameter `grow` can reach
    #[serde(default = "default_max_brush_size")]
    pub max_size: f64,

    /// Multiplier applied by `grow` and divisor applied by `shrink`
    #[serde(default = "default_brush_scaling_factor")]
    pub scaling_factor: f64,
}

fn default_brush_size() -> f64 {
    constants::DEFAULT_BRUSH_SIZE
}

fn default_max_brush_size() -> f64 {
    constants::MAX_BRUSH_SIZE
}

fn default_brush_scaling_factor() -> f64 {
    constants::BRUSH_SCALING_FACTOR
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            default_size: default_brush_size(),
            max_size: default_max_brush_size(),
            scaling_factor: default_brush_scaling_factor(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            simplify_epsilon: default_simplify_epsilon(),
            closing_threshold_px: default_closing_threshold(),
            min_vertex_distance: default_min_vertex_distance(),
            interpolation_step: default_interpolation_step(),
            vertex_hit_threshold_px: default_vertex_hit_threshold(),
            edge_hit_threshold_px: default_edge_hit_threshold(),
            brush: BrushConfig::default(),
            max_undo_history: default_max_undo_history(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable by the tools.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [("simplify_epsilon", self.simplify_epsilon)];
        let positive = [
            ("closing_threshold_px", self.closing_threshold_px),
            ("min_vertex_distance", self.min_vertex_distance),
            ("interpolation_step", self.interpolation_step),
            ("vertex_hit_threshold_px", self.vertex_hit_threshold_px),
            ("edge_hit_threshold_px", self.edge_hit_threshold_px),
            ("brush.default_size", self.brush.default_size),
            ("brush.max_size", self.brush.max_size),
        ];

        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, "must be a finite value >= 0"));
            }
        }
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(field, "must be a finite value > 0"));
            }
        }
        if self.brush.default_size > self.brush.max_size {
            return Err(ConfigError::invalid("brush.default_size", "exceeds brush.max_size"));
        }
        if !self.brush.scaling_factor.is_finite() || self.brush.scaling_factor <= 1.0 {
            return Err(ConfigError::invalid("brush.scaling_factor", "must be greater than 1"));
        }
        if self.max_undo_history == 0 {
            return Err(ConfigError::invalid("max_undo_history", "must be at least 1"));
        }
        Ok(())
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "annovec-config.json"
    }

    /// Load configuration from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a JSON file, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A value is out of range
    #[error("Invalid configuration value '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}
