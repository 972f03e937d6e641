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

//! Backend-agnostic representation of raw pointer and scroll input.
//!
//! Hosts translate their native touch and scroll events into these types and
//! push them into the engine. Nothing here interprets the input; that is the
//! job of the gesture recognizer and the latency trackers.

use serde::{Deserialize, Serialize};

/// The input streams the engine can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Touch or pointer contacts.
    Touch,
    /// Scroll position changes.
    Scroll,
}

/// Options passed when subscribing to an input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerOptions {
    /// The listener never blocks default handling of the event.
    pub passive: bool,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self { passive: true }
    }
}

/// A single contact point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels.
    pub y: f64,
    /// When the point was sampled, in milliseconds.
    pub timestamp: f64,
}

impl TouchPoint {
    /// Creates a new touch point.
    pub fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self { x, y, timestamp }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &TouchPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Midpoint between this point and another.
    pub fn midpoint(&self, other: &TouchPoint) -> (f64, f64) {
        ((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Where in its lifecycle a touch event sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    /// A contact sequence begins, or a contact is added.
    Start,
    /// One or more contacts moved.
    Move,
    /// The sequence ended normally.
    End,
    /// The platform aborted the sequence.
    Cancel,
}

/// A raw touch event with every active contact point.
///
/// For `End` events the points carry the final contact positions, if known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Lifecycle phase.
    pub phase: TouchPhase,
    /// Active contact points, primary contact first.
    pub points: Vec<TouchPoint>,
    /// When the platform produced the event, in milliseconds.
    pub timestamp: f64,
}

impl TouchEvent {
    /// Creates an event from its phase and contacts, timestamped by the first contact
    /// (zero when there are none; such events carry no latency).
    pub fn new(phase: TouchPhase, points: Vec<TouchPoint>) -> Self {
        let timestamp = points.first().map(|p| p.timestamp).unwrap_or_default();
        Self {
            phase,
            points,
            timestamp,
        }
    }

    /// A single-contact event at `(x, y, t)`.
    pub fn single(phase: TouchPhase, x: f64, y: f64, timestamp: f64) -> Self {
        Self {
            phase,
            points: vec![TouchPoint::new(x, y, timestamp)],
            timestamp,
        }
    }

    /// The primary contact point.
    pub fn primary(&self) -> Option<&TouchPoint> {
        self.points.first()
    }
}

/// An engine-internal representation of a raw input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// A touch contact changed.
    Touch(TouchEvent),
    /// The content scrolled.
    Scroll {
        /// When the scroll event was produced, in milliseconds.
        timestamp: f64,
    },
}

impl InputEvent {
    /// The stream this event belongs to.
    pub fn kind(&self) -> InputKind {
        match self {
            InputEvent::Touch(_) => InputKind::Touch,
            InputEvent::Scroll { .. } => InputKind::Scroll,
        }
    }

    /// When the platform produced the event.
    pub fn timestamp(&self) -> f64 {
        match self {
            InputEvent::Touch(event) => event.timestamp,
            InputEvent::Scroll { timestamp } => *timestamp,
        }
    }
}
