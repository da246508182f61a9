use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for the zoom and paging engine. Every field is optional in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub zoom_enabled: bool,
    pub double_tap_zoom: bool,
    pub long_press_enabled: bool,
    pub long_press_threshold_ms: u64,
    pub double_click_interval_ms: u64,
    /// Largest displacement, in pixels, that still counts as a tap.
    pub tap_slop: f64,
    /// Largest distance between the two taps of a double tap.
    pub double_tap_slop: f64,
    pub max_over_scroll_distance: f64,
    /// Downward drag, in pixels, that turns a page swipe into a swipe-down.
    pub swipe_down_threshold: Option<f64>,
    /// Pixels per millisecond.
    pub min_fling_velocity: f64,
    pub page_settle_duration_ms: u64,
    pub bounce_duration_ms: u64,
    /// Pixels per second squared.
    pub fling_deceleration: f64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 2.5,
            zoom_enabled: true,
            double_tap_zoom: true,
            long_press_enabled: false,
            long_press_threshold_ms: 2500,
            double_click_interval_ms: 250,
            tap_slop: 10.0,
            double_tap_slop: 40.0,
            max_over_scroll_distance: 20.0,
            swipe_down_threshold: None,
            min_fling_velocity: 0.5,
            page_settle_duration_ms: 400,
            bounce_duration_ms: 250,
            fling_deceleration: 2000.0,
        }
    }
}

impl GalleryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`GalleryConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("net", "gallery", "gallery")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_scale must be positive, got {}",
                self.min_scale
            )));
        }
        if !self.max_scale.is_finite() || self.max_scale < self.min_scale {
            return Err(ConfigError::Invalid(format!(
                "max_scale ({}) must not be below min_scale ({})",
                self.max_scale, self.min_scale
            )));
        }
        let non_negative = [
            ("tap_slop", self.tap_slop),
            ("double_tap_slop", self.double_tap_slop),
            ("max_over_scroll_distance", self.max_over_scroll_distance),
            ("min_fling_velocity", self.min_fling_velocity),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !(self.fling_deceleration.is_finite() && self.fling_deceleration > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fling_deceleration must be positive, got {}",
                self.fling_deceleration
            )));
        }
        if let Some(threshold) = self.swipe_down_threshold {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "swipe_down_threshold must be positive, got {threshold}"
                )));
            }
        }
        Ok(())
    }

    pub fn long_press_threshold(&self) -> Duration {
        Duration::from_millis(self.long_press_threshold_ms)
    }

    pub fn double_click_interval(&self) -> Duration {
        Duration::from_millis(self.double_click_interval_ms)
    }

    pub fn page_settle_duration(&self) -> Duration {
        Duration::from_millis(self.page_settle_duration_ms)
    }

    pub fn bounce_duration(&self) -> Duration {
        Duration::from_millis(self.bounce_duration_ms)
    }
}
