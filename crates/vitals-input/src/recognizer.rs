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

//! The gesture state machine.
//!
//! ```text
//! Idle --start--> Active --move (pinch)--> Recognized
//!                   |  \--long-press timer--> Recognized
//!                   |
//!          end / cancel (from Active or Recognized) --> Idle
//! ```
//!
//! A swipe is only evaluated when the sequence ends while still `Active`.

use std::collections::VecDeque;

use vitals_core::input::{TouchEvent, TouchPhase, TouchPoint};
use vitals_core::{Scheduler, TimerHandle};

use crate::gesture::{Direction, GestureConfig, GestureEvent, GesturePhase, GestureState, Velocity};

/// Interprets one contact sequence at a time.
#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: GestureState,
    /// Trailing primary-contact points for velocity.
    recent: VecDeque<TouchPoint>,
    pinch_start_distance: Option<f64>,
    /// Scale and timestamp of the previous two-contact move.
    last_pinch: Option<(f64, f64)>,
    long_press: Option<TimerHandle>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        let config = config.sanitized();
        Self {
            recent: VecDeque::with_capacity(config.velocity_window),
            config,
            state: GestureState::default(),
            pinch_start_distance: None,
            last_pinch: None,
            long_press: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// The live state of the current sequence.
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.phase == GesturePhase::Idle
    }

    /// Returns `true` while a long-press timer is armed.
    pub fn has_pending_long_press(&self) -> bool {
        self.long_press.is_some()
    }

    /// Feeds one touch event. Returns the gesture it completed, if any.
    ///
    /// Events that do not fit the current phase, such as a move with no prior
    /// start, are ignored and leave the state untouched.
    pub fn handle_touch<S>(&mut self, event: &TouchEvent, scheduler: &S) -> Option<GestureEvent>
    where
        S: Scheduler + ?Sized,
    {
        if !self.config.enabled {
            return None;
        }
        match event.phase {
            TouchPhase::Start => {
                self.on_start(event, scheduler);
                None
            }
            TouchPhase::Move => self.on_move(event, scheduler),
            TouchPhase::End => self.on_end(event, scheduler),
            TouchPhase::Cancel => {
                if !self.is_idle() {
                    log::trace!("GestureRecognizer: sequence cancelled.");
                    self.state.phase = GesturePhase::Cancelled;
                    self.reset(scheduler);
                }
                None
            }
        }
    }

    /// Handles a fired timer. Returns a long-press if `handle` is the armed timer.
    ///
    /// Unknown or stale handles are ignored.
    pub fn handle_timer(&mut self, handle: TimerHandle) -> Option<GestureEvent> {
        if self.long_press != Some(handle) {
            return None;
        }
        self.long_press = None;
        if self.state.phase != GesturePhase::Active {
            return None;
        }
        let point = self.state.start_point?;
        self.state.phase = GesturePhase::Recognized;
        log::debug!("GestureRecognizer: long-press at ({:.0}, {:.0}).", point.x, point.y);
        Some(GestureEvent::LongPress { point })
    }

    /// Drops the current sequence and cancels any pending long-press timer.
    pub fn reset<S>(&mut self, scheduler: &S)
    where
        S: Scheduler + ?Sized,
    {
        if let Some(handle) = self.long_press.take() {
            scheduler.cancel(handle);
        }
        self.state = GestureState::default();
        self.recent.clear();
        self.pinch_start_distance = None;
        self.last_pinch = None;
    }

    fn on_start<S>(&mut self, event: &TouchEvent, scheduler: &S)
    where
        S: Scheduler + ?Sized,
    {
        let Some(&primary) = event.primary() else {
            log::trace!("GestureRecognizer: touch-start without contacts, ignored.");
            return;
        };
        self.reset(scheduler);

        self.state.phase = GesturePhase::Active;
        self.state.start_point = Some(primary);
        self.state.current_point = Some(primary);
        self.recent.push_back(primary);

        match event.points.as_slice() {
            [_] if self.config.long_press_enabled => {
                self.long_press = Some(scheduler.schedule(self.config.long_press_delay_ms));
            }
            [a, b] => {
                let spread = a.distance_to(b);
                if spread > 0.0 {
                    self.pinch_start_distance = Some(spread);
                    self.last_pinch = Some((1.0, event.timestamp));
                }
            }
            _ => {}
        }
    }

    fn on_move<S>(&mut self, event: &TouchEvent, scheduler: &S) -> Option<GestureEvent>
    where
        S: Scheduler + ?Sized,
    {
        if !matches!(self.state.phase, GesturePhase::Active | GesturePhase::Recognized) {
            return None;
        }
        let &primary = event.primary()?;
        self.track(primary);

        if self.long_press.is_some() && self.state.distance > self.config.long_press_cancel_radius {
            if let Some(handle) = self.long_press.take() {
                scheduler.cancel(handle);
            }
            log::trace!("GestureRecognizer: moved {:.1}px, long-press cancelled.", self.state.distance);
        }

        match event.points.as_slice() {
            [a, b] => self.evaluate_pinch(a, b, event.timestamp),
            _ => None,
        }
    }

    fn on_end<S>(&mut self, event: &TouchEvent, scheduler: &S) -> Option<GestureEvent>
    where
        S: Scheduler + ?Sized,
    {
        if matches!(self.state.phase, GesturePhase::Idle | GesturePhase::Cancelled) {
            return None;
        }
        if let Some(&last) = event.primary() {
            self.track(last);
        }

        let swipe = if self.state.phase == GesturePhase::Active {
            self.evaluate_swipe()
        } else {
            None
        };
        self.reset(scheduler);
        swipe
    }

    /// Folds a new primary-contact position into the state.
    fn track(&mut self, point: TouchPoint) {
        if self.recent.len() == self.config.velocity_window {
            self.recent.pop_front();
        }
        self.recent.push_back(point);

        let Some(start) = self.state.start_point else {
            return;
        };
        let (dx, dy) = (point.x - start.x, point.y - start.y);
        self.state.current_point = Some(point);
        self.state.distance = dx.hypot(dy);
        self.state.direction =
            Direction::classify(dx, dy, self.state.distance, self.config.swipe_threshold);
        self.state.duration = (point.timestamp - start.timestamp).max(0.0);
        self.state.velocity = match (self.recent.front(), self.recent.back()) {
            (Some(first), Some(last)) => Velocity::between(first, last),
            _ => Velocity::default(),
        };
    }

    fn evaluate_swipe(&self) -> Option<GestureEvent> {
        let state = &self.state;
        let fast_enough = state.velocity.magnitude() >= self.config.velocity_threshold;
        let far_enough = state.distance >= self.config.swipe_threshold;
        if !(far_enough && fast_enough) || state.direction == Direction::None {
            return None;
        }
        log::debug!(
            "GestureRecognizer: swipe {} ({:.0}px, {:.2}px/ms).",
            state.direction.as_str(),
            state.distance,
            state.velocity.magnitude()
        );
        Some(GestureEvent::Swipe {
            direction: state.direction,
            velocity: state.velocity,
            distance: state.distance,
            duration: state.duration,
        })
    }

    fn evaluate_pinch(&mut self, a: &TouchPoint, b: &TouchPoint, now: f64) -> Option<GestureEvent> {
        let start = self.pinch_start_distance?;
        let scale = a.distance_to(b) / start;
        let velocity = match self.last_pinch.replace((scale, now)) {
            Some((prev_scale, prev_t)) if now > prev_t => (scale - prev_scale) / (now - prev_t),
            _ => 0.0,
        };
        if (scale - 1.0).abs() <= self.config.pinch_threshold {
            return None;
        }
        self.state.phase = GesturePhase::Recognized;
        Some(GestureEvent::Pinch {
            scale,
            center: a.midpoint(b),
            velocity,
        })
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
