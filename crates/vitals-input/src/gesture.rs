// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Gesture vocabulary: configuration, live state and emitted events.

use serde::{Deserialize, Serialize};
use vitals_core::input::TouchPoint;
use vitals_core::sanitize;

/// Most trailing points a release velocity is computed from.
pub const MAX_VELOCITY_WINDOW: usize = 10;

/// Thresholds for gesture classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Whether touch sequences are interpreted at all.
    pub enabled: bool,
    /// Minimum travel for a swipe, in pixels.
    pub swipe_threshold: f64,
    /// Minimum release speed for a swipe, in pixels per millisecond.
    pub velocity_threshold: f64,
    /// Minimum `|scale - 1|` for a pinch.
    pub pinch_threshold: f64,
    /// Whether a held single contact becomes a long-press.
    pub long_press_enabled: bool,
    /// How long a contact must be held, in milliseconds.
    pub long_press_delay_ms: f64,
    /// Travel that cancels a pending long-press, in pixels.
    pub long_press_cancel_radius: f64,
    /// Number of trailing points used for velocity.
    pub velocity_window: usize,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            swipe_threshold: 50.0,
            velocity_threshold: 0.3,
            pinch_threshold: 0.1,
            long_press_enabled: true,
            long_press_delay_ms: 500.0,
            long_press_cancel_radius: 10.0,
            velocity_window: 10,
        }
    }
}

impl GestureConfig {
    /// Replaces invalid values with their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let velocity_window =
            sanitize::capacity("gesture.velocity_window", self.velocity_window, d.velocity_window);
        // One point cannot carry a velocity.
        let velocity_window = if (2..=MAX_VELOCITY_WINDOW).contains(&velocity_window) {
            velocity_window
        } else {
            log::warn!(
                "Config: `gesture.velocity_window` must be within 2..={MAX_VELOCITY_WINDOW}, \
                 got {velocity_window}"
            );
            velocity_window.clamp(2, MAX_VELOCITY_WINDOW)
        };
        Self {
            enabled: self.enabled,
            swipe_threshold: sanitize::positive(
                "gesture.swipe_threshold",
                self.swipe_threshold,
                d.swipe_threshold,
            ),
            velocity_threshold: sanitize::non_negative(
                "gesture.velocity_threshold",
                self.velocity_threshold,
                d.velocity_threshold,
            ),
            pinch_threshold: sanitize::non_negative(
                "gesture.pinch_threshold",
                self.pinch_threshold,
                d.pinch_threshold,
            ),
            long_press_enabled: self.long_press_enabled,
            long_press_delay_ms: sanitize::positive(
                "gesture.long_press_delay_ms",
                self.long_press_delay_ms,
                d.long_press_delay_ms,
            ),
            long_press_cancel_radius: sanitize::non_negative(
                "gesture.long_press_cancel_radius",
                self.long_press_cancel_radius,
                d.long_press_cancel_radius,
            ),
            velocity_window,
        }
    }
}

/// Dominant axis of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// Travel below the swipe threshold, or equal on both axes.
    #[default]
    None,
}

impl Direction {
    /// Classifies a displacement. Screen coordinates: `y` grows downwards.
    pub fn classify(dx: f64, dy: f64, distance: f64, threshold: f64) -> Self {
        if distance < threshold {
            return Direction::None;
        }
        let (ax, ay) = (dx.abs(), dy.abs());
        if ax > ay {
            if dx > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if ay > ax {
            if dy > 0.0 {
                Direction::Down
            } else {
                Direction::Up
            }
        } else {
            Direction::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::None => "none",
        }
    }
}

/// A velocity in pixels per millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    /// Average velocity between two points. Zero if no time elapsed.
    pub fn between(from: &TouchPoint, to: &TouchPoint) -> Self {
        let dt = to.timestamp - from.timestamp;
        if dt <= 0.0 || !dt.is_finite() {
            return Self::default();
        }
        Self {
            x: (to.x - from.x) / dt,
            y: (to.y - from.y) / dt,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Lifecycle of the current contact sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    #[default]
    Idle,
    Active,
    /// A pinch or long-press has been recognized; no swipe will follow.
    Recognized,
    Cancelled,
}

/// The live state of the contact sequence being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureState {
    pub phase: GesturePhase,
    pub start_point: Option<TouchPoint>,
    pub current_point: Option<TouchPoint>,
    pub velocity: Velocity,
    /// Straight-line travel from the start point, in pixels.
    pub distance: f64,
    pub direction: Direction,
    /// Time since the start point, in milliseconds.
    pub duration: f64,
}

/// A recognized gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    Swipe {
        direction: Direction,
        velocity: Velocity,
        distance: f64,
        duration: f64,
    },
    Pinch {
        /// Current contact spread relative to the spread at touch-start.
        scale: f64,
        /// Midpoint between the two contacts.
        center: (f64, f64),
        /// Change in scale per millisecond since the previous pinch move.
        velocity: f64,
    },
    LongPress {
        point: TouchPoint,
    },
}

impl GestureEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GestureEvent::Swipe { .. } => "swipe",
            GestureEvent::Pinch { .. } => "pinch",
            GestureEvent::LongPress { .. } => "long_press",
        }
    }
}
