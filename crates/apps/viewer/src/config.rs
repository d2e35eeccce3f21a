//! Viewer configuration.
//!
//! Every field is optional in JSON; missing ones fall back to the demo page
//! layout (a full-page first-person view with a 300x300 minimap in the
//! top-left corner).

use std::fs;
use std::path::Path;

use camera::{ControllerOptions, ViewportState};
use foundation::Aabb2;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FRAME_RATE_HZ: f64 = 60.0;
pub const DEFAULT_PAGE_SIZE: [f64; 2] = [1280.0, 800.0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config read error: {msg}"),
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Page-space rectangle in pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::from_origin_size([self.x, self.y], [self.width, self.height])
    }

    fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// `[width, height]` of the page in pixels.
    pub page: [f64; 2],
    /// Full page when unset.
    pub main_rect: Option<Rect>,
    pub minimap_rect: Rect,
    /// Fields missing from a partially specified state take the
    /// [`ViewportState`] defaults, not the demo page values.
    pub main_state: ViewportState,
    pub minimap_state: ViewportState,
    pub main_options: ControllerOptions,
    pub minimap_options: ControllerOptions,
    pub frame_rate_hz: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_SIZE,
            main_rect: None,
            minimap_rect: Rect {
                x: 5.0,
                y: 5.0,
                width: 300.0,
                height: 300.0,
            },
            main_state: initial_main_state(),
            minimap_state: initial_minimap_state(),
            main_options: ControllerOptions::default(),
            minimap_options: ControllerOptions::default(),
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }
}

pub fn initial_main_state() -> ViewportState {
    ViewportState {
        longitude: -100.0,
        latitude: 40.0,
        position: [0.0, 0.0, 100.0],
        bearing: 0.0,
        pitch: 25.0,
        min_pitch: -90.0,
        max_pitch: 90.0,
        zoom: 20.0,
        ..ViewportState::default()
    }
}

pub fn initial_minimap_state() -> ViewportState {
    ViewportState {
        longitude: -100.0,
        latitude: 40.0,
        position: [0.0, 0.0, 100.0],
        pitch: 0.0,
        min_pitch: 0.0,
        max_pitch: 80.0,
        zoom: 15.0,
        ..ViewportState::default()
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn main_rect(&self) -> Rect {
        self.main_rect.unwrap_or(Rect {
            x: 0.0,
            y: 0.0,
            width: self.page[0],
            height: self.page[1],
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [w, h] = self.page;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ConfigError::Invalid(format!("page size {w}x{h}")));
        }
        if !self.main_rect().is_valid() {
            return Err(ConfigError::Invalid("main_rect must have a positive size".into()));
        }
        if !self.minimap_rect.is_valid() {
            return Err(ConfigError::Invalid(
                "minimap_rect must have a positive size".into(),
            ));
        }
        if !(self.frame_rate_hz.is_finite() && self.frame_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame_rate_hz {}",
                self.frame_rate_hz
            )));
        }
        for (name, state) in [("main_state", &self.main_state), ("minimap_state", &self.minimap_state)] {
            if !state.position.iter().all(|v| v.is_finite()) {
                return Err(ConfigError::Invalid(format!("{name}.position is not finite")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig};
    use camera::DragMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_matches_demo_page() {
        let config = ViewerConfig::from_json("{}").expect("parse");
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.main_state.position, [0.0, 0.0, 100.0]);
        assert_eq!(config.main_state.pitch, 25.0);
        assert_eq!(config.minimap_state.zoom, 15.0);
        assert_eq!(config.minimap_state.max_pitch, 80.0);
        assert_eq!(config.main_rect().width, 1280.0);
    }

    #[test]
    fn partial_sections_override_defaults() {
        let config = ViewerConfig::from_json(
            r#"{
                "page": [1024, 768],
                "main_options": {"drag_mode": "pan", "inertia_ms": 0},
                "minimap_rect": {"x": 0, "y": 0, "width": 200, "height": 150}
            }"#,
        )
        .expect("parse");
        assert_eq!(config.main_rect().height, 768.0);
        assert_eq!(config.main_options.drag_mode, DragMode::Pan);
        assert_eq!(config.main_options.inertia_ms, 0.0);
        assert_eq!(config.minimap_rect.bounds().max, [200.0, 150.0]);
        assert_eq!(config.frame_rate_hz, 60.0);
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(
            ViewerConfig::from_json("{\"page\": 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json(r#"{"page": [0, 600]}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json(r#"{"frame_rate_hz": -1}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ViewerConfig::load(std::path::Path::new("/nonexistent/viewer.json"))
            .expect_err("missing");
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().contains("viewer.json"));
    }
}
