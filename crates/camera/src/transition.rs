//! What the controller hands to the host after each handled event.

use serde::{Deserialize, Serialize};

use crate::state::ViewportState;

/// Scale hosts should apply to screen-sized overlays (labels, icons).
pub const SCREEN_SCALE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// `1 - (1 - t)^2`; decelerates into the target.
    EaseOutQuad,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub duration_ms: f64,
    pub easing: Easing,
    /// Screen pivot the animation is anchored on (zoom gestures).
    pub around: Option<[f64; 2]>,
}

impl TransitionSpec {
    pub fn linear(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            easing: Easing::Linear,
            around: None,
        }
    }

    pub fn inertia(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            easing: Easing::EaseOutQuad,
            around: None,
        }
    }

    pub fn around(mut self, pos: [f64; 2]) -> Self {
        self.around = Some(pos);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionFlags {
    pub is_dragging: bool,
    pub is_panning: bool,
    pub is_rotating: bool,
    pub is_zooming: bool,
}

impl InteractionFlags {
    pub const IDLE: Self = Self {
        is_dragging: false,
        is_panning: false,
        is_rotating: false,
        is_zooming: false,
    };

    pub fn dragging() -> Self {
        Self {
            is_dragging: true,
            ..Self::IDLE
        }
    }

    pub fn panning(mut self) -> Self {
        self.is_panning = true;
        self
    }

    pub fn rotating(mut self) -> Self {
        self.is_rotating = true;
        self
    }

    pub fn zooming(mut self) -> Self {
        self.is_zooming = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportUpdate {
    pub state: ViewportState,
    /// `None` applies the state immediately.
    pub transition: Option<TransitionSpec>,
    pub interaction: InteractionFlags,
    pub screen_scale_factor: f64,
}

/// Receiver of controller output, normally the render host.
pub trait ViewportSink {
    fn update_viewport(&mut self, update: ViewportUpdate);

    /// Suppress the platform default action of the event being handled
    /// (page scrolling for wheel input).
    fn suppress_default(&mut self) {}
}

impl ViewportSink for Vec<ViewportUpdate> {
    fn update_viewport(&mut self, update: ViewportUpdate) {
        self.push(update);
    }
}
