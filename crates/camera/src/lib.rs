pub mod controller;
pub mod event;
pub mod options;
pub mod state;
pub mod transition;
pub mod viewport;

pub use controller::{CAMERA_SCREEN_DEPTH, CameraController, wheel_scale};
pub use event::{EventKind, EventType, InputEvent, Key, Modifiers};
pub use options::{ControllerOptions, DragMode, Keyboard, KeyboardSpeeds, ScrollSettings, ScrollZoom};
pub use state::{ControllerState, MIN_CONTROLLER_ALTITUDE, ViewportState};
pub use transition::{Easing, InteractionFlags, SCREEN_SCALE_FACTOR, TransitionSpec, ViewportSink, ViewportUpdate};
pub use viewport::{DistanceScales, FirstPersonViewport, Viewport};
