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

//! Scroll frame-rate tracking.

use serde::{Deserialize, Serialize};
use vitals_core::sanitize;
use vitals_core::telemetry::{MetricSnapshot, SampleWindow};

use crate::normalized_score;

/// Configuration for [`ScrollFpsTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollFpsConfig {
    pub enabled: bool,
    pub window_capacity: usize,
    /// Frames below this rate count as dropped.
    pub fps_threshold: f64,
    /// Average FPS that maps to zero smoothness.
    pub smoothness_floor: f64,
    /// FPS span above the floor that maps to full smoothness.
    pub smoothness_range: f64,
    /// A gap longer than this between scroll frames starts a new burst.
    pub max_frame_gap_ms: f64,
}

impl Default for ScrollFpsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_capacity: 60,
            fps_threshold: 55.0,
            smoothness_floor: 30.0,
            smoothness_range: 30.0,
            max_frame_gap_ms: 250.0,
        }
    }
}

impl ScrollFpsConfig {
    /// Replaces invalid values with their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            enabled: self.enabled,
            window_capacity: sanitize::capacity(
                "scroll.window_capacity",
                self.window_capacity,
                d.window_capacity,
            ),
            fps_threshold: sanitize::positive("scroll.fps_threshold", self.fps_threshold, d.fps_threshold),
            smoothness_floor: sanitize::non_negative(
                "scroll.smoothness_floor",
                self.smoothness_floor,
                d.smoothness_floor,
            ),
            smoothness_range: sanitize::positive(
                "scroll.smoothness_range",
                self.smoothness_range,
                d.smoothness_range,
            ),
            max_frame_gap_ms: sanitize::positive(
                "scroll.max_frame_gap_ms",
                self.max_frame_gap_ms,
                d.max_frame_gap_ms,
            ),
        }
    }
}

/// Aggregated scroll statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollStats {
    pub snapshot: Option<MetricSnapshot>,
    /// Mean FPS over the window, 0 when empty.
    pub average_fps: f64,
    /// Smoothness in `[0, 1]`.
    pub smoothness: f64,
    /// Smoothness scaled to `[0, 100]`.
    pub smoothness_score: f64,
    /// Frames below the threshold since the last clear.
    pub dropped_frames: u64,
    /// Frame intervals measured since the last clear.
    pub total_frames: u64,
    pub sample_count: usize,
}

/// Derives an FPS sample from each pair of consecutive scroll frames.
#[derive(Debug)]
pub struct ScrollFpsTracker {
    config: ScrollFpsConfig,
    window: SampleWindow,
    last_frame: Option<f64>,
    dropped_frames: u64,
    total_frames: u64,
}

impl ScrollFpsTracker {
    pub fn new(config: ScrollFpsConfig) -> Self {
        let config = config.sanitized();
        Self {
            window: SampleWindow::new(config.window_capacity),
            last_frame: None,
            dropped_frames: 0,
            total_frames: 0,
            config,
        }
    }

    pub fn config(&self) -> &ScrollFpsConfig {
        &self.config
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Records a scroll frame at `timestamp` and returns the derived FPS.
    ///
    /// The first frame of a burst, a frame after a long gap, and frames that do
    /// not move forward in time produce no sample.
    pub fn record_frame(&mut self, timestamp: f64) -> Option<f64> {
        if !self.config.enabled || !timestamp.is_finite() {
            return None;
        }
        let previous = self.last_frame.replace(timestamp);
        let delta = timestamp - previous?;
        if delta <= 0.0 {
            log::trace!("ScrollFpsTracker: non-increasing frame timestamp, ignored.");
            return None;
        }
        if delta > self.config.max_frame_gap_ms {
            log::trace!("ScrollFpsTracker: {delta:.0}ms gap, starting a new burst.");
            return None;
        }

        let fps = 1000.0 / delta;
        self.window.push(fps, timestamp);
        self.total_frames += 1;
        if fps < self.config.fps_threshold {
            self.dropped_frames += 1;
        }
        Some(fps)
    }

    /// Forgets the previous frame so the next one starts a new burst.
    pub fn end_burst(&mut self) {
        self.last_frame = None;
    }

    pub fn stats(&self) -> ScrollStats {
        let average_fps = self.window.average();
        let smoothness = if self.window.is_empty() {
            1.0
        } else {
            normalized_score(
                average_fps,
                self.config.smoothness_floor,
                self.config.smoothness_range,
            )
        };
        ScrollStats {
            snapshot: self.window.snapshot(),
            average_fps,
            smoothness,
            smoothness_score: smoothness * 100.0,
            dropped_frames: self.dropped_frames,
            total_frames: self.total_frames,
            sample_count: self.window.len(),
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.last_frame = None;
        self.dropped_frames = 0;
        self.total_frames = 0;
    }
}

impl Default for ScrollFpsTracker {
    fn default() -> Self {
        Self::new(ScrollFpsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fps_from_frame_interval() {
        let mut tracker = ScrollFpsTracker::default();
        assert_eq!(tracker.record_frame(0.0), None);
        assert_relative_eq!(tracker.record_frame(20.0).unwrap(), 50.0);
        assert_relative_eq!(tracker.record_frame(30.0).unwrap(), 100.0);
    }

    #[test]
    fn test_dropped_frames_are_counted() {
        let mut tracker = ScrollFpsTracker::default();
        let mut t = 0.0;
        tracker.record_frame(t);
        for interval in [16.0, 16.0, 40.0, 16.0, 50.0] {
            t += interval;
            tracker.record_frame(t);
        }
        let stats = tracker.stats();
        assert_eq!(stats.total_frames, 5);
        assert_eq!(stats.dropped_frames, 2);
    }

    #[test]
    fn test_long_gap_starts_new_burst() {
        let mut tracker = ScrollFpsTracker::default();
        tracker.record_frame(0.0);
        tracker.record_frame(16.0);
        assert_eq!(tracker.record_frame(2000.0), None);
        assert_relative_eq!(tracker.record_frame(2020.0).unwrap(), 50.0);
        assert_eq!(tracker.stats().sample_count, 2);
    }

    #[test]
    fn test_non_increasing_timestamp_is_ignored() {
        let mut tracker = ScrollFpsTracker::default();
        tracker.record_frame(100.0);
        assert_eq!(tracker.record_frame(100.0), None);
        assert_eq!(tracker.stats().sample_count, 0);
    }

    #[test]
    fn test_smoothness_is_normalized() {
        let mut tracker = ScrollFpsTracker::default();
        // 22.22ms interval = 45fps, halfway between the 30fps floor and 60fps.
        let interval = 1000.0 / 45.0;
        for i in 0..10 {
            tracker.record_frame(i as f64 * interval);
        }
        let stats = tracker.stats();
        assert_relative_eq!(stats.average_fps, 45.0, epsilon = 1e-9);
        assert_relative_eq!(stats.smoothness, 0.5, epsilon = 1e-9);
        assert_relative_eq!(stats.smoothness_score, 50.0, epsilon = 1e-7);
    }

    #[test]
    fn test_smoothness_clamps_to_unit_range() {
        let mut slow = ScrollFpsTracker::default();
        for i in 0..5 {
            slow.record_frame(i as f64 * 50.0);
        }
        assert_eq!(slow.stats().smoothness, 0.0);

        let mut fast = ScrollFpsTracker::default();
        for i in 0..5 {
            fast.record_frame(i as f64 * 8.0);
        }
        assert_eq!(fast.stats().smoothness, 1.0);
    }

    #[test]
    fn test_end_burst_and_clear() {
        let mut tracker = ScrollFpsTracker::default();
        tracker.record_frame(0.0);
        tracker.end_burst();
        assert_eq!(tracker.record_frame(10.0), None);
        tracker.record_frame(26.0);
        tracker.clear();
        let stats = tracker.stats();
        assert_eq!(stats.sample_count, 0);
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.smoothness, 1.0);
    }
}
