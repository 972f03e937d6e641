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

//! # Vitals Input
//!
//! Turns raw touch sequences into swipe, pinch and long-press gestures.
//!
//! The [`GestureRecognizer`] is a small state machine driven by
//! [`vitals_core::input::TouchEvent`]s. It arms its long-press timer through an
//! injected [`vitals_core::Scheduler`] and is told when that timer fires, so it
//! never reads a clock of its own.

pub mod gesture;
pub mod recognizer;

pub use gesture::{
    Direction, GestureConfig, GestureEvent, GesturePhase, GestureState, Velocity,
    MAX_VELOCITY_WINDOW,
};
pub use recognizer::GestureRecognizer;
