use crate::constants::{
    DEFAULT_EXPLODING_SPEED, DEFAULT_LABEL_FONT_SIZE, SCREENSHOT_FILE_NAME,
};
use serde::{Deserialize, Serialize};

/// Viewer settings carried by the scene document. Every field falls back to
/// the crate constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Suffix the export appended to every page element id.
    pub output_id: String,
    pub exploding_speed: f64,
    pub rotation_speed: f64,
    pub label_font_size: u32,
    pub screenshot_file_name: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            output_id: String::new(),
            exploding_speed: DEFAULT_EXPLODING_SPEED,
            rotation_speed: 1.0,
            label_font_size: DEFAULT_LABEL_FONT_SIZE,
            screenshot_file_name: SCREENSHOT_FILE_NAME.to_string(),
        }
    }
}

impl ViewerConfig {
    /// Page id of the element with base name `base`.
    pub fn element_id(&self, base: &str) -> String {
        if self.output_id.is_empty() {
            base.to_string()
        } else {
            format!("{base}_{}", self.output_id)
        }
    }
}
