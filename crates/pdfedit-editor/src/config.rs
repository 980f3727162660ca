//! Editor configuration
//!
//! Thresholds and defaults for gesture handling. The drag thresholds and
//! minimum sizes keep imprecise pointer input from creating accidental
//! annotations; they are behavior, not tuning knobs to zero out.

use crate::error::EditorError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Whiteout/blackout drags must reach this size on both axes (px)
    #[serde(default = "default_whiteout_min_drag")]
    pub whiteout_min_drag: f64,
    /// Text box drags must reach this size on either axis (px)
    #[serde(default = "default_textbox_min_drag")]
    pub textbox_min_drag: f64,
    #[serde(default = "default_textbox_min_width")]
    pub textbox_min_width: f64,
    #[serde(default = "default_textbox_min_height")]
    pub textbox_min_height: f64,
    #[serde(default = "default_textbox_default_width")]
    pub textbox_default_width: f64,
    #[serde(default = "default_textbox_default_height")]
    pub textbox_default_height: f64,
    /// Smallest size a committed text annotation can be resized to (px)
    #[serde(default = "default_free_text_min_size")]
    pub free_text_min_size: f64,
    /// Edge length of resize handles (px)
    #[serde(default = "default_handle_size")]
    pub handle_size: f64,
    /// Padding around replaced text runs (points)
    #[serde(default = "default_replace_padding")]
    pub replace_padding: f64,
    #[serde(default = "default_font_size")]
    pub default_font_size: f64,
    #[serde(default = "default_font_family")]
    pub default_font_family: String,
    #[serde(default = "default_text_color")]
    pub default_text_color: String,
    #[serde(default = "default_whiteout_color")]
    pub whiteout_color: String,
    #[serde(default = "default_blackout_color")]
    pub blackout_color: String,
    /// How long notifications stay visible
    #[serde(default = "default_notification_ms")]
    pub notification_ms: f64,
}

fn default_whiteout_min_drag() -> f64 {
    5.0
}

fn default_textbox_min_drag() -> f64 {
    10.0
}

fn default_textbox_min_width() -> f64 {
    100.0
}

fn default_textbox_min_height() -> f64 {
    44.0
}

fn default_textbox_default_width() -> f64 {
    200.0
}

fn default_textbox_default_height() -> f64 {
    44.0
}

fn default_free_text_min_size() -> f64 {
    10.0
}

fn default_handle_size() -> f64 {
    10.0
}

fn default_replace_padding() -> f64 {
    1.5
}

fn default_font_size() -> f64 {
    12.0
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

fn default_text_color() -> String {
    "#000000".to_string()
}

fn default_whiteout_color() -> String {
    "#FFFFFF".to_string()
}

fn default_blackout_color() -> String {
    "#000000".to_string()
}

fn default_notification_ms() -> f64 {
    5000.0
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            whiteout_min_drag: default_whiteout_min_drag(),
            textbox_min_drag: default_textbox_min_drag(),
            textbox_min_width: default_textbox_min_width(),
            textbox_min_height: default_textbox_min_height(),
            textbox_default_width: default_textbox_default_width(),
            textbox_default_height: default_textbox_default_height(),
            free_text_min_size: default_free_text_min_size(),
            handle_size: default_handle_size(),
            replace_padding: default_replace_padding(),
            default_font_size: default_font_size(),
            default_font_family: default_font_family(),
            default_text_color: default_text_color(),
            whiteout_color: default_whiteout_color(),
            blackout_color: default_blackout_color(),
            notification_ms: default_notification_ms(),
        }
    }
}

impl EditorConfig {
    /// Parse configuration from a TOML string. Missing keys take defaults.
    ///
    /// ```
    /// use pdfedit_editor::config::EditorConfig;
    ///
    /// let config = EditorConfig::from_toml_str("textbox_default_width = 240.0").unwrap();
    /// assert_eq!(config.textbox_default_width, 240.0);
    /// assert_eq!(config.whiteout_min_drag, 5.0);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, EditorError> {
        toml::from_str(s).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Base text style for new annotations.
    pub fn default_text_style(&self) -> pdfedit_core::TextStyle {
        pdfedit_core::TextStyle {
            font_size: self.default_font_size,
            color: self.default_text_color.clone(),
            font_name: Some(self.default_font_family.clone()),
            is_italic: false,
            is_bold: false,
        }
    }
}
