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

//! Render-duration timing.
//!
//! The host brackets each render with [`RenderTimer::start_measurement`] and
//! [`RenderTimer::end_measurement`], or holds a [`RenderScope`] guard that
//! ends the measurement when dropped.

use serde::{Deserialize, Serialize};
use vitals_core::sanitize;
use vitals_core::telemetry::{MetricSnapshot, SampleWindow};
use vitals_core::Clock;

use crate::sampling::SamplingGate;

/// The duration of one frame at 60Hz, in milliseconds.
pub const FRAME_BUDGET_MS: f64 = 1000.0 / 60.0;

/// Configuration for [`RenderTimer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderTimerConfig {
    /// Whether render timing runs at all.
    pub enabled: bool,
    /// Number of durations kept.
    pub window_capacity: usize,
    /// Fraction of render cycles that are measured.
    pub sample_rate: f64,
    /// Renders slower than this count as jank, in milliseconds.
    pub jank_threshold_ms: f64,
    /// Seed for the sampling gate. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for RenderTimerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_capacity: 100,
            sample_rate: 1.0,
            jank_threshold_ms: FRAME_BUDGET_MS,
            seed: None,
        }
    }
}

impl RenderTimerConfig {
    /// Replaces invalid values with their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            enabled: self.enabled,
            window_capacity: sanitize::capacity(
                "render.window_capacity",
                self.window_capacity,
                d.window_capacity,
            ),
            sample_rate: sanitize::unit_interval("render.sample_rate", self.sample_rate, d.sample_rate),
            jank_threshold_ms: sanitize::positive(
                "render.jank_threshold_ms",
                self.jank_threshold_ms,
                d.jank_threshold_ms,
            ),
            seed: self.seed,
        }
    }
}

/// Aggregated render-duration statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// Snapshot of the newest duration, if any.
    pub snapshot: Option<MetricSnapshot>,
    /// Mean duration in the window, in milliseconds.
    pub average_ms: f64,
    /// Slowest duration in the window, in milliseconds.
    pub max_ms: f64,
    /// Durations in the window above the jank threshold.
    pub jank_count: usize,
    /// Durations currently held.
    pub sample_count: usize,
    /// Cycles skipped by the sampling gate since the last clear.
    pub skipped: u64,
}

/// Start/end render timer with probabilistic sampling.
#[derive(Debug)]
pub struct RenderTimer {
    config: RenderTimerConfig,
    window: SampleWindow,
    gate: SamplingGate,
    pending_start: Option<f64>,
    skipped: u64,
}

impl RenderTimer {
    pub fn new(config: RenderTimerConfig) -> Self {
        let config = config.sanitized();
        Self {
            window: SampleWindow::new(config.window_capacity),
            gate: SamplingGate::new(config.sample_rate, config.seed),
            pending_start: None,
            skipped: 0,
            config,
        }
    }

    pub fn config(&self) -> &RenderTimerConfig {
        &self.config
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Returns `true` while a measurement is pending.
    pub fn is_measuring(&self) -> bool {
        self.pending_start.is_some()
    }

    /// Begins a measurement at `now`. Returns `true` if this cycle is being measured.
    ///
    /// A second start while one is pending keeps the first start time.
    pub fn start_measurement(&mut self, now: f64) -> bool {
        if !self.config.enabled {
            return false;
        }
        if self.pending_start.is_some() {
            log::trace!("RenderTimer: measurement already pending, keeping the earlier start.");
            return true;
        }
        if !self.gate.admit() {
            self.skipped += 1;
            return false;
        }
        self.pending_start = Some(now);
        true
    }

    /// Ends the pending measurement and records its duration.
    ///
    /// Without a pending start this is a no-op. Negative durations are dropped.
    pub fn end_measurement(&mut self, now: f64) -> Option<f64> {
        let start = self.pending_start.take()?;
        let duration = now - start;
        if !duration.is_finite() || duration < 0.0 {
            log::debug!("RenderTimer: dropping invalid duration {duration}ms.");
            return None;
        }
        self.window.push(duration, now);
        if duration > self.config.jank_threshold_ms {
            log::trace!("RenderTimer: janky render of {duration:.2}ms.");
        }
        Some(duration)
    }

    /// Abandons the pending measurement, if any.
    pub fn cancel_measurement(&mut self) {
        self.pending_start = None;
    }

    /// Starts a measurement that ends when the returned guard is dropped.
    pub fn scope<'a, C>(&'a mut self, clock: &'a C) -> RenderScope<'a, C>
    where
        C: Clock + ?Sized,
    {
        let active = self.start_measurement(clock.now());
        RenderScope {
            timer: self,
            clock,
            active,
        }
    }

    pub fn stats(&self) -> RenderStats {
        let threshold = self.config.jank_threshold_ms;
        RenderStats {
            snapshot: self.window.snapshot(),
            average_ms: self.window.average(),
            max_ms: self.window.max().unwrap_or(0.0),
            jank_count: self.window.iter().filter(|s| s.value > threshold).count(),
            sample_count: self.window.len(),
            skipped: self.skipped,
        }
    }

    /// Drops every duration and any pending measurement.
    pub fn clear(&mut self) {
        self.window.clear();
        self.pending_start = None;
        self.skipped = 0;
    }
}

impl Default for RenderTimer {
    fn default() -> Self {
        Self::new(RenderTimerConfig::default())
    }
}

/// Times a render scope and records the duration when dropped.
///
/// The measurement is recorded even on early return or unwinding.
pub struct RenderScope<'a, C: Clock + ?Sized> {
    timer: &'a mut RenderTimer,
    clock: &'a C,
    active: bool,
}

impl<C: Clock + ?Sized> RenderScope<'_, C> {
    /// Returns `true` if this scope was admitted by the sampling gate.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Abandons the measurement; nothing is recorded on drop.
    pub fn cancel(mut self) {
        self.timer.cancel_measurement();
        self.active = false;
    }
}

impl<C: Clock + ?Sized> Drop for RenderScope<'_, C> {
    fn drop(&mut self) {
        if self.active {
            self.timer.end_measurement(self.clock.now());
        }
    }
}
