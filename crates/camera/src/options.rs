use foundation::Aabb2;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INERTIA_MS: f64 = 200.0;
pub const DEFAULT_PAN_SPEED: f64 = 4.0;
pub const DEFAULT_ZOOM_SPEED: f64 = 4.0;
pub const DEFAULT_BLOCK_MS: f64 = 100.0;
pub const DEFAULT_TRANSITION_MS: f64 = 300.0;
pub const DEFAULT_SCROLL_SPEED: f64 = 0.01;

/// Wheel transition length with `smooth` scrolling.
pub const SMOOTH_WHEEL_MS: f64 = 250.0;
/// Wheel transition length otherwise; effectively an immediate jump.
pub const INSTANT_WHEEL_MS: f64 = 1.0;

/// Which drag the *alternate* gesture (modifier key or right button) selects.
///
/// With `Rotate` a plain drag pans and the alternate drag rotates; `Pan`
/// swaps the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    Pan,
    #[default]
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSettings {
    #[serde(default = "default_scroll_speed")]
    pub speed: f64,
    #[serde(default)]
    pub smooth: bool,
}

fn default_scroll_speed() -> f64 {
    DEFAULT_SCROLL_SPEED
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SCROLL_SPEED,
            smooth: false,
        }
    }
}

/// `true`/`false`, or an object with explicit settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrollZoom {
    Enabled(bool),
    Tuned(ScrollSettings),
}

impl ScrollZoom {
    pub fn settings(&self) -> Option<ScrollSettings> {
        match *self {
            ScrollZoom::Enabled(true) => Some(ScrollSettings::default()),
            ScrollZoom::Enabled(false) => None,
            ScrollZoom::Tuned(s) => Some(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardSpeeds {
    /// Meters per arrow key press.
    pub move_speed: f64,
    /// Zoom scale per `-`/`=` press.
    pub zoom_speed: f64,
    /// Degrees of bearing per press.
    pub rotate_speed_x: f64,
    /// Degrees of pitch per press.
    pub rotate_speed_y: f64,
}

impl Default for KeyboardSpeeds {
    fn default() -> Self {
        Self {
            move_speed: 20.0,
            zoom_speed: 2.0,
            rotate_speed_x: 2.0,
            rotate_speed_y: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Keyboard {
    Enabled(bool),
    Tuned(KeyboardSpeeds),
}

impl Keyboard {
    pub fn speeds(&self) -> Option<KeyboardSpeeds> {
        match *self {
            Keyboard::Enabled(true) => Some(KeyboardSpeeds::default()),
            Keyboard::Enabled(false) => None,
            Keyboard::Tuned(s) => Some(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerOptions {
    pub drag_pan: bool,
    pub drag_rotate: bool,
    pub drag_mode: DragMode,
    pub invert_pan: bool,
    pub scroll_zoom: ScrollZoom,
    pub double_click_zoom: bool,
    pub keyboard: Keyboard,
    pub inertia_ms: f64,
    pub pan_speed: f64,
    pub zoom_speed: f64,
    /// Cooldown after a double-tap during which taps and drag starts are ignored.
    pub block_ms: f64,
    /// Duration of the default (double-tap, keyboard) transition.
    pub transition_ms: f64,
    /// Interactive area in view pixels as `[[min_x, min_y], [max_x, max_y]]`;
    /// the full viewport when unset.
    #[serde(with = "bounds_serde")]
    pub bounds: Option<Aabb2>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            drag_pan: true,
            drag_rotate: true,
            drag_mode: DragMode::default(),
            invert_pan: false,
            scroll_zoom: ScrollZoom::Enabled(true),
            double_click_zoom: true,
            keyboard: Keyboard::Enabled(true),
            inertia_ms: DEFAULT_INERTIA_MS,
            pan_speed: DEFAULT_PAN_SPEED,
            zoom_speed: DEFAULT_ZOOM_SPEED,
            block_ms: DEFAULT_BLOCK_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
            bounds: None,
        }
    }
}

mod bounds_serde {
    use foundation::Aabb2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bounds: &Option<Aabb2>, s: S) -> Result<S::Ok, S::Error> {
        bounds.map(|b| [b.min, b.max]).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Aabb2>, D::Error> {
        let corners = Option::<[[f64; 2]; 2]>::deserialize(d)?;
        Ok(corners.map(|[min, max]| Aabb2::new(min, max)))
    }
}
