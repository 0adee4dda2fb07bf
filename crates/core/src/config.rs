//! Editor configuration
//!
//! Centralizes every tunable constant of the placement engine: snapping,
//! history depth, box minimums, paste offset, and the defaults used for new
//! annotations. Configuration can be loaded from a JSON file, environment
//! variables, or created programmatically.

use crate::annotation::Color;
use crate::export::BASELINE_RATIO;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Configuration for the annotation placement engine.
///
/// All lengths are in document units unless the field says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum distance at which a box edge or centre snaps to a guide
    pub snap_threshold: f32,
    /// Number of snapshots kept by the undo history
    pub history_capacity: usize,
    /// Smallest width an annotation box may have
    pub min_width: f32,
    /// Smallest height an annotation box may have
    pub min_height: f32,
    /// Offset applied on both axes when pasting a copied annotation
    pub paste_offset: f32,
    /// Font size used until the user picks another one
    pub default_font_size: f32,
    /// Text color used until the user picks another one
    pub default_color: Color,
    /// Default box width as a multiple of font size
    pub width_per_font_size: f32,
    /// Default box height as a multiple of font size
    pub height_per_font_size: f32,
    /// Ascender approximation, as a fraction of font size
    pub baseline_ratio: f32,
    /// Line advance for multi-line text, as a fraction of font size
    pub line_height_ratio: f32,
    /// Hit radius of the corner resize handles
    pub handle_radius: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: 5.0,
            history_capacity: 50,
            min_width: 20.0,
            min_height: 10.0,
            paste_offset: 20.0,
            default_font_size: 16.0,
            default_color: Color::BLACK,
            width_per_font_size: 7.5,
            height_per_font_size: 2.0,
            baseline_ratio: BASELINE_RATIO,
            line_height_ratio: 1.2,
            handle_radius: 6.0,
            min_zoom: 0.25,
            max_zoom: 4.0,
            zoom_step: 0.25,
        }
    }
}

impl EditorConfig {
    /// Sets the snap threshold.
    pub fn with_snap_threshold(mut self, threshold: f32) -> Self {
        self.snap_threshold = threshold;
        self
    }

    /// Sets the number of history entries kept.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Sets the paste offset.
    pub fn with_paste_offset(mut self, offset: f32) -> Self {
        self.paste_offset = offset;
        self
    }

    /// Sets the default font size for new annotations.
    pub fn with_default_font_size(mut self, font_size: f32) -> Self {
        self.default_font_size = font_size;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDF_OVERLAY_SNAP_THRESHOLD`: snap threshold in units (default: 5)
    /// - `PDF_OVERLAY_HISTORY_CAPACITY`: undo depth (default: 50)
    /// - `PDF_OVERLAY_PASTE_OFFSET`: paste offset in units (default: 20)
    /// - `PDF_OVERLAY_FONT_SIZE`: default font size (default: 16)
    /// - `PDF_OVERLAY_COLOR`: default color as `#rrggbb` (default: `#000000`)
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("PDF_OVERLAY_SNAP_THRESHOLD") {
            config.snap_threshold = parse_var("PDF_OVERLAY_SNAP_THRESHOLD", &val)?;
        }

        if let Some(val) = lookup("PDF_OVERLAY_HISTORY_CAPACITY") {
            config.history_capacity = parse_var("PDF_OVERLAY_HISTORY_CAPACITY", &val)?;
        }

        if let Some(val) = lookup("PDF_OVERLAY_PASTE_OFFSET") {
            config.paste_offset = parse_var("PDF_OVERLAY_PASTE_OFFSET", &val)?;
        }

        if let Some(val) = lookup("PDF_OVERLAY_FONT_SIZE") {
            config.default_font_size = parse_var("PDF_OVERLAY_FONT_SIZE", &val)?;
        }

        if let Some(val) = lookup("PDF_OVERLAY_COLOR") {
            config.default_color = Color::from_hex(&val)
                .ok_or_else(|| ConfigError::InvalidValue("PDF_OVERLAY_COLOR".to_string()))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    ///
    /// Keys missing from the file keep their default values:
    /// ```json
    /// { "snap_threshold": 8.0, "history_capacity": 100 }
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or holds invalid values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Parses configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configured values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidValue("history_capacity".to_string()));
        }
        if self.min_width <= 0.0 {
            return Err(ConfigError::InvalidValue("min_width".to_string()));
        }
        if self.min_height <= 0.0 {
            return Err(ConfigError::InvalidValue("min_height".to_string()));
        }
        if self.default_font_size <= 0.0 {
            return Err(ConfigError::InvalidValue("default_font_size".to_string()));
        }
        if self.snap_threshold < 0.0 {
            return Err(ConfigError::InvalidValue("snap_threshold".to_string()));
        }
        if self.baseline_ratio <= 0.0 || self.baseline_ratio > 1.0 {
            return Err(ConfigError::InvalidValue("baseline_ratio".to_string()));
        }
        if self.line_height_ratio <= 0.0 {
            return Err(ConfigError::InvalidValue("line_height_ratio".to_string()));
        }
        if self.min_zoom <= 0.0 || self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvalidValue("min_zoom".to_string()));
        }
        Ok(())
    }

    /// Default box size for a new annotation at the given font size.
    pub fn default_box_size(&self, font_size: f32) -> (f32, f32) {
        (
            (font_size * self.width_per_font_size).max(self.min_width),
            (font_size * self.height_per_font_size).max(self.min_height),
        )
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.snap_threshold, 5.0);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.min_width, 20.0);
        assert_eq!(config.min_height, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_box_size_follows_font_size() {
        let config = EditorConfig::default();
        assert_eq!(config.default_box_size(16.0), (120.0, 32.0));
        // Tiny fonts still produce a box at least as large as the minimums
        assert_eq!(config.default_box_size(1.0), (20.0, 10.0));
    }

    #[test]
    fn test_builder_methods() {
        let config = EditorConfig::default()
            .with_snap_threshold(8.0)
            .with_history_capacity(10)
            .with_paste_offset(12.0)
            .with_default_font_size(24.0);

        assert_eq!(config.snap_threshold, 8.0);
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.paste_offset, 12.0);
        assert_eq!(config.default_font_size, 24.0);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PDF_OVERLAY_SNAP_THRESHOLD", "7.5"),
            ("PDF_OVERLAY_HISTORY_CAPACITY", "3"),
            ("PDF_OVERLAY_COLOR", "#ff0000"),
        ]
        .into_iter()
        .collect();

        let config =
            EditorConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.snap_threshold, 7.5);
        assert_eq!(config.history_capacity, 3);
        assert_eq!(config.default_color, Color::RED);
        assert_eq!(config.paste_offset, 20.0);
    }

    #[test]
    fn test_from_lookup_invalid_value() {
        let result = EditorConfig::from_lookup(|key| {
            (key == "PDF_OVERLAY_HISTORY_CAPACITY").then(|| "lots".to_string())
        });

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(key)) if key == "PDF_OVERLAY_HISTORY_CAPACITY"
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EditorConfig::from_json(r#"{ "snap_threshold": 8.0 }"#).unwrap();
        assert_eq!(config.snap_threshold, 8.0);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.default_color, Color::BLACK);
    }

    #[test]
    fn test_from_json_rejects_zero_capacity() {
        let result = EditorConfig::from_json(r#"{ "history_capacity": 0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_from_json_rejects_bad_text_ratios() {
        let result = EditorConfig::from_json(r#"{ "baseline_ratio": 0.0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "baseline_ratio"));

        let result = EditorConfig::from_json(r#"{ "baseline_ratio": 1.5 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "baseline_ratio"));

        let result = EditorConfig::from_json(r#"{ "line_height_ratio": -1.0 }"#);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(key)) if key == "line_height_ratio"
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.json");
        fs::write(&path, r##"{ "paste_offset": 4.0, "default_color": "#0000ff" }"##).unwrap();

        let config = EditorConfig::from_file(&path).unwrap();
        assert_eq!(config.paste_offset, 4.0);
        assert_eq!(config.default_color, Color::BLUE);
    }

    #[test]
    fn test_from_file_missing() {
        let result = EditorConfig::from_file("/nonexistent/overlay.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
