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

//! Input latency tracking.
//!
//! Latency is the time between the timestamp the platform stamped on a raw
//! input event and the moment the engine processed it.

use serde::{Deserialize, Serialize};
use vitals_core::sanitize;
use vitals_core::telemetry::{MetricSnapshot, SampleWindow};

use crate::sampling::SamplingGate;

/// Configuration for [`TouchLatencyTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchLatencyConfig {
    pub enabled: bool,
    pub window_capacity: usize,
    /// Fraction of input events whose latency is recorded.
    pub sample_rate: f64,
    /// Latency considered fully unresponsive, in milliseconds.
    pub latency_ceiling_ms: f64,
    /// Inputs further apart than this do not contribute to the input rate.
    pub max_input_gap_ms: f64,
    pub seed: Option<u64>,
}

impl Default for TouchLatencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_capacity: 50,
            sample_rate: 1.0,
            latency_ceiling_ms: 100.0,
            max_input_gap_ms: 250.0,
            seed: None,
        }
    }
}

impl TouchLatencyConfig {
    /// Replaces invalid values with their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            enabled: self.enabled,
            window_capacity: sanitize::capacity(
                "touch.window_capacity",
                self.window_capacity,
                d.window_capacity,
            ),
            sample_rate: sanitize::unit_interval("touch.sample_rate", self.sample_rate, d.sample_rate),
            latency_ceiling_ms: sanitize::positive(
                "touch.latency_ceiling_ms",
                self.latency_ceiling_ms,
                d.latency_ceiling_ms,
            ),
            max_input_gap_ms: sanitize::positive(
                "touch.max_input_gap_ms",
                self.max_input_gap_ms,
                d.max_input_gap_ms,
            ),
            seed: self.seed,
        }
    }
}

/// Aggregated latency statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TouchStats {
    pub snapshot: Option<MetricSnapshot>,
    /// Mean latency in milliseconds, 0 when empty.
    pub average_ms: f64,
    pub max_ms: f64,
    /// `1 - average / ceiling`, clamped to `[0, 1]`. 1.0 with no samples.
    pub responsiveness: f64,
    /// Input events per second over recent consecutive inputs.
    pub input_rate: f64,
    pub sample_count: usize,
}

/// Records input-to-processing latency and the input event rate.
#[derive(Debug)]
pub struct TouchLatencyTracker {
    config: TouchLatencyConfig,
    window: SampleWindow,
    rates: SampleWindow,
    gate: SamplingGate,
    last_input: Option<f64>,
}

impl TouchLatencyTracker {
    pub fn new(config: TouchLatencyConfig) -> Self {
        let config = config.sanitized();
        Self {
            window: SampleWindow::new(config.window_capacity),
            rates: SampleWindow::new(config.window_capacity),
            gate: SamplingGate::new(config.sample_rate, config.seed),
            last_input: None,
            config,
        }
    }

    pub fn config(&self) -> &TouchLatencyConfig {
        &self.config
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Records one input stamped `input_timestamp` and processed at `processed_at`.
    ///
    /// Returns the recorded latency, or `None` when the event was skipped by
    /// sampling or carried a timestamp later than its processing time.
    pub fn record(&mut self, input_timestamp: f64, processed_at: f64) -> Option<f64> {
        if !self.config.enabled || !input_timestamp.is_finite() {
            return None;
        }

        // The input rate sees every event, independent of latency sampling.
        if let Some(previous) = self.last_input.replace(input_timestamp) {
            let delta = input_timestamp - previous;
            if delta > 0.0 && delta <= self.config.max_input_gap_ms {
                self.rates.push(1000.0 / delta, input_timestamp);
            }
        }

        if !self.gate.admit() {
            return None;
        }
        let latency = processed_at - input_timestamp;
        if !latency.is_finite() || latency < 0.0 {
            log::debug!("TouchLatencyTracker: input stamped after processing, ignored.");
            return None;
        }
        self.window.push(latency, processed_at);
        Some(latency)
    }

    pub fn stats(&self) -> TouchStats {
        let average_ms = self.window.average();
        let responsiveness = if self.window.is_empty() {
            1.0
        } else {
            (1.0 - average_ms / self.config.latency_ceiling_ms).clamp(0.0, 1.0)
        };
        TouchStats {
            snapshot: self.window.snapshot(),
            average_ms,
            max_ms: self.window.max().unwrap_or(0.0),
            responsiveness,
            input_rate: self.rates.average(),
            sample_count: self.window.len(),
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.rates.clear();
        self.last_input = None;
    }
}

impl Default for TouchLatencyTracker {
    fn default() -> Self {
        Self::new(TouchLatencyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_latency_is_processing_delay() {
        let mut tracker = TouchLatencyTracker::default();
        assert_eq!(tracker.record(100.0, 112.0), Some(12.0));
        assert_eq!(tracker.record(200.0, 230.0), Some(30.0));
        let stats = tracker.stats();
        assert_relative_eq!(stats.average_ms, 21.0);
        assert_relative_eq!(stats.max_ms, 30.0);
        assert_relative_eq!(stats.responsiveness, 0.79, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_latency_is_dropped() {
        let mut tracker = TouchLatencyTracker::default();
        assert_eq!(tracker.record(100.0, 90.0), None);
        assert_eq!(tracker.stats().sample_count, 0);
        assert_eq!(tracker.stats().responsiveness, 1.0);
    }

    #[test]
    fn test_input_rate_ignores_sampling() {
        let mut tracker = TouchLatencyTracker::new(TouchLatencyConfig {
            sample_rate: 0.0,
            ..Default::default()
        });
        for i in 0..6 {
            let t = i as f64 * 20.0;
            assert_eq!(tracker.record(t, t + 5.0), None);
        }
        let stats = tracker.stats();
        assert_eq!(stats.sample_count, 0);
        assert_relative_eq!(stats.input_rate, 50.0);
    }

    #[test]
    fn test_input_rate_skips_long_gaps() {
        let mut tracker = TouchLatencyTracker::default();
        tracker.record(0.0, 1.0);
        tracker.record(10.0, 11.0);
        tracker.record(5000.0, 5001.0);
        assert_relative_eq!(tracker.stats().input_rate, 100.0);
    }

    #[test]
    fn test_responsiveness_bottoms_out() {
        let mut tracker = TouchLatencyTracker::default();
        tracker.record(0.0, 250.0);
        assert_eq!(tracker.stats().responsiveness, 0.0);
        tracker.clear();
        assert_eq!(tracker.stats().sample_count, 0);
        assert_eq!(tracker.stats().input_rate, 0.0);
    }
}
