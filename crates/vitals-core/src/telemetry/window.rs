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

//! Bounded sliding windows of timestamped samples.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default noise floor for trend classification, in units per second.
pub const DEFAULT_NOISE_FLOOR: f64 = 0.1;

/// Maximum number of trailing samples considered by [`SampleWindow::trend`].
pub const TREND_SPAN: usize = 5;

/// A single timestamped numeric observation.
///
/// Samples are `Copy` and never modified once pushed; they leave a window
/// only through eviction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The observed value.
    pub value: f64,
    /// When the value was observed, in milliseconds.
    pub timestamp: f64,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(value: f64, timestamp: f64) -> Self {
        Self { value, timestamp }
    }
}

/// The direction a metric is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// The rate of change is above the noise floor.
    Increasing,
    /// The rate of change is below the negative noise floor.
    Decreasing,
    /// Not enough data, or the change stays within the noise floor.
    #[default]
    Stable,
}

/// A trend classification together with the rate it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrendReading {
    /// The classified direction.
    pub trend: Trend,
    /// Rate of change in units per second.
    pub rate: f64,
}

/// A derived view of a window at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// The most recent value.
    pub current: f64,
    /// Trend over the trailing samples.
    pub trend: Trend,
    /// Rate of change in units per second.
    pub change_rate: f64,
    /// Timestamp of the most recent sample, in milliseconds.
    pub timestamp: f64,
}

/// A fixed-capacity, time-ordered, FIFO-evicting buffer of samples.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
    noise_floor: f64,
}

impl SampleWindow {
    /// Creates an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_noise_floor(capacity, DEFAULT_NOISE_FLOOR)
    }

    /// Creates an empty window with a custom trend noise floor.
    ///
    /// Negative or non-finite noise floors fall back to [`DEFAULT_NOISE_FLOOR`].
    pub fn with_noise_floor(capacity: usize, noise_floor: f64) -> Self {
        let capacity = capacity.max(1);
        let noise_floor = if noise_floor.is_finite() && noise_floor >= 0.0 {
            noise_floor
        } else {
            DEFAULT_NOISE_FLOOR
        };
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            noise_floor,
        }
    }

    /// Appends a sample, evicting and returning the oldest one if the window was full.
    ///
    /// Non-finite values are dropped.
    pub fn push(&mut self, value: f64, timestamp: f64) -> Option<Sample> {
        if !value.is_finite() || !timestamp.is_finite() {
            log::trace!("SampleWindow: dropping non-finite sample ({value}, {timestamp})");
            return None;
        }
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(Sample::new(value, timestamp));
        evicted
    }

    /// Returns the number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the maximum number of samples the window can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Returns the newest sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Iterates over samples oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Returns a copy of the samples, oldest first.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Arithmetic mean of the values, or 0.0 if empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.value).sum::<f64>() / self.samples.len() as f64
    }

    /// Population variance of the values, or 0.0 with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let avg = self.average();
        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|s| (s.value - avg) * (s.value - avg))
            .sum();
        sum_sq / self.samples.len() as f64
    }

    /// Smallest value, or `None` if empty.
    pub fn min(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.value).reduce(f64::min)
    }

    /// Largest value, or `None` if empty.
    pub fn max(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.value).reduce(f64::max)
    }

    /// Classifies the recent rate of change.
    ///
    /// Compares the newest sample against the oldest sample of the trailing
    /// [`TREND_SPAN`] samples. With fewer than two samples, or no elapsed time
    /// between them, the result is `Stable` with a zero rate.
    pub fn trend(&self) -> TrendReading {
        let len = self.samples.len();
        if len < 2 {
            return TrendReading::default();
        }
        let span = len.min(TREND_SPAN);
        let (Some(first), Some(last)) = (self.samples.get(len - span), self.samples.back()) else {
            return TrendReading::default();
        };
        let elapsed_secs = (last.timestamp - first.timestamp) / 1000.0;
        if elapsed_secs <= 0.0 {
            return TrendReading::default();
        }
        let rate = (last.value - first.value) / elapsed_secs;
        let trend = if rate > self.noise_floor {
            Trend::Increasing
        } else if rate < -self.noise_floor {
            Trend::Decreasing
        } else {
            Trend::Stable
        };
        TrendReading { trend, rate }
    }

    /// Builds a snapshot from the newest sample and the current trend.
    pub fn snapshot(&self) -> Option<MetricSnapshot> {
        let latest = self.latest()?;
        let reading = self.trend();
        Some(MetricSnapshot {
            current: latest.value,
            trend: reading.trend,
            change_rate: reading.rate,
            timestamp: latest.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn values(window: &SampleWindow) -> Vec<f64> {
        window.iter().map(|s| s.value).collect()
    }

    #[test]
    fn test_push_evicts_oldest_first() {
        let mut window = SampleWindow::new(5);
        for i in 1..=8 {
            window.push(i as f64, i as f64 * 100.0);
        }
        assert_eq!(values(&window), vec![4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn test_push_returns_evicted_sample() {
        let mut window = SampleWindow::new(2);
        assert!(window.push(1.0, 0.0).is_none());
        assert!(window.push(2.0, 1.0).is_none());
        let evicted = window.push(3.0, 2.0).unwrap();
        assert_eq!(evicted, Sample::new(1.0, 0.0));
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut window = SampleWindow::new(7);
        for i in 0..1000 {
            window.push((i % 13) as f64, i as f64);
            assert!(window.len() <= window.capacity());
        }
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut window = SampleWindow::new(0);
        window.push(1.0, 0.0);
        window.push(2.0, 1.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(values(&window), vec![2.0]);
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        let mut window = SampleWindow::new(3);
        window.push(f64::NAN, 0.0);
        window.push(1.0, f64::INFINITY);
        assert!(window.is_empty());
    }

    #[test]
    fn test_trend_needs_two_samples() {
        let mut window = SampleWindow::new(4);
        assert_eq!(window.trend().trend, Trend::Stable);
        window.push(100.0, 0.0);
        let reading = window.trend();
        assert_eq!(reading.trend, Trend::Stable);
        assert_eq!(reading.rate, 0.0);
    }

    #[test]
    fn test_trend_increasing_and_decreasing() {
        let mut up = SampleWindow::new(10);
        up.push(10.0, 0.0);
        up.push(12.0, 1000.0);
        let reading = up.trend();
        assert_eq!(reading.trend, Trend::Increasing);
        assert_relative_eq!(reading.rate, 2.0);

        let mut down = SampleWindow::new(10);
        down.push(10.0, 0.0);
        down.push(9.0, 2000.0);
        let reading = down.trend();
        assert_eq!(reading.trend, Trend::Decreasing);
        assert_relative_eq!(reading.rate, -0.5);
    }

    #[test]
    fn test_trend_within_noise_floor_is_stable() {
        let mut window = SampleWindow::new(10);
        window.push(10.0, 0.0);
        window.push(10.05, 1000.0);
        assert_eq!(window.trend().trend, Trend::Stable);

        let mut strict = SampleWindow::with_noise_floor(10, 0.01);
        strict.push(10.0, 0.0);
        strict.push(10.05, 1000.0);
        assert_eq!(strict.trend().trend, Trend::Increasing);
    }

    #[test]
    fn test_trend_uses_trailing_span_only() {
        let mut window = SampleWindow::new(20);
        // A large early jump followed by a flat tail.
        window.push(0.0, 0.0);
        window.push(100.0, 1000.0);
        for i in 2..8 {
            window.push(100.0, i as f64 * 1000.0);
        }
        let reading = window.trend();
        assert_eq!(reading.trend, Trend::Stable);
        assert_eq!(reading.rate, 0.0);
    }

    #[test]
    fn test_trend_with_zero_elapsed_time_is_stable() {
        let mut window = SampleWindow::new(4);
        window.push(1.0, 500.0);
        window.push(50.0, 500.0);
        assert_eq!(window.trend(), TrendReading::default());
    }

    #[test]
    fn test_statistics() {
        let mut window = SampleWindow::new(4);
        assert_eq!(window.average(), 0.0);
        assert_eq!(window.min(), None);
        window.push(5.0, 0.0);
        window.push(15.0, 1.0);
        window.push(5.0, 2.0);
        window.push(15.0, 3.0);
        assert_relative_eq!(window.average(), 10.0);
        assert_relative_eq!(window.variance(), 25.0);
        assert_eq!(window.min(), Some(5.0));
        assert_eq!(window.max(), Some(15.0));
    }

    #[test]
    fn test_snapshot_reflects_latest_sample() {
        let mut window = SampleWindow::new(4);
        assert!(window.snapshot().is_none());
        window.push(10.0, 0.0);
        window.push(20.0, 1000.0);
        let snapshot = window.snapshot().unwrap();
        assert_eq!(snapshot.current, 20.0);
        assert_eq!(snapshot.timestamp, 1000.0);
        assert_eq!(snapshot.trend, Trend::Increasing);
        assert_relative_eq!(snapshot.change_rate, 10.0);
    }
}
