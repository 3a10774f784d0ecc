//! Tuning constants shared by the controllers.
//!
//! Explosion periods are in milliseconds because they feed host timers
//! directly.

use glam::DVec3;

// Explosion
pub const EXPLODE_MAX: f64 = 6.0; // upper bound reached by automatic exploding
pub const EXPLODE_MIN: f64 = 0.0; // lower bound reached by automatic imploding
pub const EXPLODE_INITIAL_FACTOR: f64 = 0.000001; // applied once at start-up
pub const EXPLODE_TICK_MS: u32 = 25; // period of the animation interval
pub const EXPLODE_HOLD_MS: u32 = 3000; // pause at either bound before reversing
pub const DEFAULT_EXPLODING_SPEED: f64 = 0.05; // factor step per tick

// Scene rotation
pub const ROTATION_STEP: f64 = 0.02; // radians per frame at speed factor 1

// Labels
pub const LABEL_TEXTURE_SIZE: u32 = 512; // square sprite canvas in pixels
pub const DEFAULT_LABEL_FONT_SIZE: u32 = 15; // scaled by LABEL_FONT_SCALE
pub const LABEL_FONT_SCALE: u32 = 10;

// Arrowheads, relative to the visible edge length
pub const ARROW_RADIUS_DIVISOR: f64 = 25.0;
pub const ARROW_HEIGHT_DIVISOR: f64 = 5.0;

// Camera defaults used when the export declares none
pub const DEFAULT_CAMERA_POSITION: DVec3 = DVec3::new(0.0, 0.0, 5.0);
pub const DEFAULT_CAMERA_FOV_DEGREES: f64 = 75.0;
pub const DEFAULT_CAMERA_NEAR: f64 = 0.1;
pub const DEFAULT_CAMERA_FAR: f64 = 1000.0;

// Fold sliders
pub const FOLD_SLIDER_STEP: f64 = 0.001;

// Screenshot
pub const SCREENSHOT_FILE_NAME: &str = "screenshot.svg";

// Element carrying the exported scene document
pub const SCENE_DATA_ELEMENT: &str = "scene-data";

/// Base names of the page elements; the export appends `_<output id>`.
pub mod ids {
    pub const SETTINGS: &str = "settings";
    pub const SHOW_SETTINGS_BUTTON: &str = "showSettingsButton";
    pub const HIDE_SETTINGS_BUTTON: &str = "hideSettingsButton";
    pub const CAMERA_TYPE: &str = "cameraType";
    pub const TRANSPARENCY_RANGE: &str = "transparencyRange";
    pub const ROTATION_X: &str = "changeRotationX";
    pub const ROTATION_Y: &str = "changeRotationY";
    pub const ROTATION_Z: &str = "changeRotationZ";
    pub const ROTATION_SPEED_RANGE: &str = "rotationSpeedRange";
    pub const RESET_BUTTON: &str = "resetButton";
    pub const TAKE_SCREENSHOT: &str = "takeScreenshot";
    pub const SCREENSHOT_IN_TAB: &str = "tab";
    pub const EXPLODE_RANGE: &str = "explodeRange";
    pub const EXPLODE_CHECKBOX: &str = "explodeCheckbox";
    pub const EXPLODING_SPEED_RANGE: &str = "explodingSpeedRange";
    pub const SHOWN_OBJECT_TYPES: &str = "shownObjectTypesList";
    pub const SHOWN_OBJECTS: &str = "shownObjectsList";
    pub const FOLD_GROUP: &str = "fold";
    pub const CANVAS_CONTAINER: &str = "three";
}
