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

//! Heap Usage Monitor
//!
//! Periodically samples heap usage through the platform's [`HeapInfoSource`],
//! captures a per-session baseline, and reports rapid growth, near-limit
//! usage, and sustained leaks as alert conditions.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use vitals_core::sanitize;
use vitals_core::telemetry::{
    AlertCondition, AlertKind, MetricSnapshot, SampleWindow, Severity, Trend, DEFAULT_NOISE_FLOOR,
};
use vitals_core::HeapInfoSource;

/// Configuration for [`MemoryMonitor`]. Memory figures are in megabytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryMonitorConfig {
    /// Whether heap sampling runs at all.
    pub enabled: bool,
    /// Number of samples kept.
    pub window_capacity: usize,
    /// Trend noise floor, in MB per second.
    pub noise_floor: f64,
    /// Growth over the baseline that raises `rapid_increase`.
    pub increase_threshold_mb: f64,
    /// Growth over `increase_threshold_mb × multiplier` is critical.
    pub critical_increase_multiplier: f64,
    /// `used / limit` above this raises a `high_usage` warning.
    pub high_usage_ratio: f64,
    /// `used / limit` above this raises a critical `high_usage`.
    pub critical_usage_ratio: f64,
    /// Minimum growth rate, in MB per second, for a leak.
    pub leak_rate_per_sec: f64,
    /// Consecutive `Increasing` samples required before a leak is reported.
    pub leak_streak: usize,
    /// Ask the platform to reclaim memory when a critical condition is found.
    pub reclaim_on_critical: bool,
}

impl Default for MemoryMonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_capacity: 60,
            noise_floor: DEFAULT_NOISE_FLOOR,
            increase_threshold_mb: 50.0,
            critical_increase_multiplier: 2.0,
            high_usage_ratio: 0.8,
            critical_usage_ratio: 0.9,
            leak_rate_per_sec: 1.0,
            leak_streak: 10,
            reclaim_on_critical: true,
        }
    }
}

impl MemoryMonitorConfig {
    /// Replaces invalid values with their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let high_usage_ratio =
            sanitize::unit_interval("memory.high_usage_ratio", self.high_usage_ratio, d.high_usage_ratio);
        let mut critical_usage_ratio = sanitize::unit_interval(
            "memory.critical_usage_ratio",
            self.critical_usage_ratio,
            d.critical_usage_ratio,
        );
        if critical_usage_ratio < high_usage_ratio {
            log::warn!("Config: `memory.critical_usage_ratio` below `high_usage_ratio`, raising it");
            critical_usage_ratio = high_usage_ratio;
        }
        Self {
            enabled: self.enabled,
            window_capacity: sanitize::capacity(
                "memory.window_capacity",
                self.window_capacity,
                d.window_capacity,
            ),
            noise_floor: sanitize::non_negative("memory.noise_floor", self.noise_floor, d.noise_floor),
            increase_threshold_mb: sanitize::positive(
                "memory.increase_threshold_mb",
                self.increase_threshold_mb,
                d.increase_threshold_mb,
            ),
            critical_increase_multiplier: sanitize::positive(
                "memory.critical_increase_multiplier",
                self.critical_increase_multiplier,
                d.critical_increase_multiplier,
            )
            .max(1.0),
            high_usage_ratio,
            critical_usage_ratio,
            leak_rate_per_sec: sanitize::non_negative(
                "memory.leak_rate_per_sec",
                self.leak_rate_per_sec,
                d.leak_rate_per_sec,
            ),
            leak_streak: sanitize::capacity("memory.leak_streak", self.leak_streak, d.leak_streak),
            reclaim_on_critical: self.reclaim_on_critical,
        }
    }
}

/// The outcome of one sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryReading {
    /// Snapshot of the heap window after this tick's sample.
    pub snapshot: MetricSnapshot,
    /// Heap in use, in MB.
    pub used_mb: f64,
    /// Heap limit, in MB, if the platform reports one.
    pub limit_mb: Option<f64>,
    /// The session baseline, in MB.
    pub baseline_mb: f64,
    /// `used_mb - baseline_mb`.
    pub increase_from_baseline: f64,
    /// Highest usage seen this session, in MB.
    pub peak_mb: f64,
    /// Thresholds crossed on this tick, in evaluation order.
    pub conditions: Vec<AlertCondition>,
    /// `true` if a reclamation was requested and the platform acted on it.
    pub reclaimed: bool,
}

impl MemoryReading {
    /// Returns `used / limit`, if a limit is known.
    pub fn usage_ratio(&self) -> Option<f64> {
        self.limit_mb
            .filter(|limit| *limit > 0.0)
            .map(|limit| self.used_mb / limit)
    }

    /// Returns `true` if any condition on this tick is critical.
    pub fn has_critical(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.severity == Severity::Critical)
    }
}

/// Periodic heap-usage sampler.
///
/// The first successful sample of a session becomes the baseline. When the
/// platform cannot report heap usage the monitor turns into a no-op and says
/// so once in the log.
#[derive(Debug)]
pub struct MemoryMonitor {
    config: MemoryMonitorConfig,
    window: SampleWindow,
    trend_history: VecDeque<Trend>,
    baseline_mb: Option<f64>,
    peak_mb: f64,
    sample_count: u64,
    supported: Option<bool>,
}

impl MemoryMonitor {
    /// Creates a monitor. The configuration is sanitized first.
    pub fn new(config: MemoryMonitorConfig) -> Self {
        let config = config.sanitized();
        Self {
            window: SampleWindow::with_noise_floor(config.window_capacity, config.noise_floor),
            trend_history: VecDeque::with_capacity(config.leak_streak),
            baseline_mb: None,
            peak_mb: 0.0,
            sample_count: 0,
            supported: None,
            config,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MemoryMonitorConfig {
        &self.config
    }

    /// Returns `false` once the platform has been found to lack heap introspection.
    pub fn is_supported(&self) -> bool {
        self.supported != Some(false)
    }

    /// Returns the session baseline, if captured.
    pub fn baseline_mb(&self) -> Option<f64> {
        self.baseline_mb
    }

    /// Returns the number of samples recorded this session.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Returns the sample window.
    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Returns the latest snapshot, if any sample exists.
    pub fn snapshot(&self) -> Option<MetricSnapshot> {
        self.window.snapshot()
    }

    /// Queries the platform and records one sample.
    ///
    /// Returns `None` when disabled or when the platform lacks heap introspection.
    pub fn sample<H>(&mut self, source: &H, now: f64) -> Option<MemoryReading>
    where
        H: HeapInfoSource + ?Sized,
    {
        if !self.config.enabled || self.supported == Some(false) {
            return None;
        }
        let Some(info) = source.query_heap_info() else {
            self.supported = Some(false);
            log::warn!("MemoryMonitor: heap introspection unavailable, memory sampling disabled.");
            return None;
        };
        self.supported = Some(true);

        let limit_mb = (info.limit > 0).then(|| info.limit_mb());
        let mut reading = self.record(info.used_mb(), limit_mb, now);

        if reading.has_critical() && self.config.reclaim_on_critical {
            reading.reclaimed = panic::catch_unwind(AssertUnwindSafe(|| source.reclaim_memory()))
                .unwrap_or_else(|_| {
                    log::error!("MemoryMonitor: platform reclaim panicked, ignoring.");
                    false
                });
            log::debug!("MemoryMonitor: reclaim requested (acted: {}).", reading.reclaimed);
        }
        Some(reading)
    }

    /// Growth between the two newest samples, in MB per second.
    fn instantaneous_rate(&self) -> f64 {
        let skip = self.window.len().saturating_sub(2);
        let mut newest = self.window.iter().skip(skip);
        match (newest.next(), newest.next()) {
            (Some(prev), Some(last)) if last.timestamp > prev.timestamp => {
                (last.value - prev.value) * 1000.0 / (last.timestamp - prev.timestamp)
            }
            _ => 0.0,
        }
    }

    /// Records a usage figure directly, bypassing the platform query.
    pub fn record(&mut self, used_mb: f64, limit_mb: Option<f64>, now: f64) -> MemoryReading {
        let baseline_mb = *self.baseline_mb.get_or_insert_with(|| {
            log::info!("MemoryMonitor: baseline captured at {used_mb:.1}MB.");
            used_mb
        });
        self.peak_mb = self.peak_mb.max(used_mb);
        self.sample_count += 1;

        self.window.push(used_mb, now);
        let reading = self.window.trend();
        if self.trend_history.len() == self.config.leak_streak {
            self.trend_history.pop_front();
        }
        self.trend_history.push_back(reading.trend);

        let increase_from_baseline = used_mb - baseline_mb;
        let mut conditions = Vec::new();

        let threshold = self.config.increase_threshold_mb;
        if increase_from_baseline > threshold {
            let severity =
                if increase_from_baseline > threshold * self.config.critical_increase_multiplier {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
            conditions.push(AlertCondition::new(
                AlertKind::RapidIncrease,
                severity,
                format!(
                    "Memory increased by {increase_from_baseline:.1}MB since baseline \
                     ({baseline_mb:.1}MB -> {used_mb:.1}MB)"
                ),
            ));
        }

        if let Some(ratio) = limit_mb.filter(|l| *l > 0.0).map(|l| used_mb / l) {
            let severity = if ratio > self.config.critical_usage_ratio {
                Some(Severity::Critical)
            } else if ratio > self.config.high_usage_ratio {
                Some(Severity::Warning)
            } else {
                None
            };
            if let Some(severity) = severity {
                conditions.push(AlertCondition::new(
                    AlertKind::HighUsage,
                    severity,
                    format!("Memory usage at {:.0}% of limit", ratio * 100.0),
                ));
            }
        }

        let sustained = self.trend_history.len() >= self.config.leak_streak
            && self.trend_history.iter().all(|t| *t == Trend::Increasing);
        let rate = self.instantaneous_rate();
        if reading.trend == Trend::Increasing && rate > self.config.leak_rate_per_sec && sustained
        {
            conditions.push(AlertCondition::new(
                AlertKind::MemoryLeak,
                Severity::Critical,
                format!(
                    "Possible memory leak: usage rising {rate:.2}MB/s after {} consecutive \
                     increasing samples",
                    self.config.leak_streak
                ),
            ));
        }

        log::trace!(
            "MemoryMonitor: {used_mb:.1}MB ({:?}, {:+.2}MB/s), {} condition(s)",
            reading.trend,
            reading.rate,
            conditions.len()
        );

        MemoryReading {
            snapshot: MetricSnapshot {
                current: used_mb,
                trend: reading.trend,
                change_rate: reading.rate,
                timestamp: now,
            },
            used_mb,
            limit_mb,
            baseline_mb,
            increase_from_baseline,
            peak_mb: self.peak_mb,
            conditions,
            reclaimed: false,
        }
    }

    /// Starts a new monitoring session: samples, trend history and baseline are dropped.
    pub fn reset_session(&mut self) {
        self.window.clear();
        self.trend_history.clear();
        self.baseline_mb = None;
        self.peak_mb = 0.0;
        self.sample_count = 0;
    }
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new(MemoryMonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vitals_core::platform::{HeapInfo, ManualPlatform};

    fn kinds(reading: &MemoryReading) -> Vec<(AlertKind, Severity)> {
        reading
            .conditions
            .iter()
            .map(|c| (c.kind, c.severity))
            .collect()
    }

    #[test]
    fn test_baseline_is_captured_once() {
        let mut monitor = MemoryMonitor::default();
        monitor.record(10.0, None, 0.0);
        monitor.record(20.0, None, 1000.0);
        let reading = monitor.record(30.0, None, 2000.0);
        assert_eq!(monitor.baseline_mb(), Some(10.0));
        assert_relative_eq!(reading.increase_from_baseline, 20.0);
    }

    #[test]
    fn test_rapid_increase_warning_then_critical() {
        let mut monitor = MemoryMonitor::default();
        monitor.record(10.0, None, 0.0);
        monitor.record(20.0, None, 5000.0);
        let reading = monitor.record(80.0, None, 10_000.0);
        assert!(kinds(&reading).contains(&(AlertKind::RapidIncrease, Severity::Warning)));

        let reading = monitor.record(120.0, None, 15_000.0);
        assert!(kinds(&reading).contains(&(AlertKind::RapidIncrease, Severity::Critical)));
    }

    #[test]
    fn test_increase_at_threshold_does_not_fire() {
        let mut monitor = MemoryMonitor::default();
        monitor.record(10.0, None, 0.0);
        let reading = monitor.record(60.0, None, 5000.0);
        assert!(reading.conditions.is_empty());
    }

    #[test]
    fn test_high_usage_levels() {
        let mut monitor = MemoryMonitor::default();
        let reading = monitor.record(79.0, Some(100.0), 0.0);
        assert!(reading.conditions.is_empty());

        let reading = monitor.record(85.0, Some(100.0), 60_000.0);
        assert!(kinds(&reading).contains(&(AlertKind::HighUsage, Severity::Warning)));

        let reading = monitor.record(95.0, Some(100.0), 120_000.0);
        assert!(kinds(&reading).contains(&(AlertKind::HighUsage, Severity::Critical)));
    }

    #[test]
    fn test_leak_requires_sustained_growth() {
        let config = MemoryMonitorConfig {
            increase_threshold_mb: 10_000.0,
            ..Default::default()
        };
        let mut monitor = MemoryMonitor::new(config);

        // 2MB/s growth, sampled every second. The first sample is `Stable`,
        // so the tenth consecutive `Increasing` trend arrives on sample 11.
        let mut leak_at = None;
        for i in 0..15 {
            let reading = monitor.record(100.0 + 2.0 * i as f64, None, i as f64 * 1000.0);
            if leak_at.is_none()
                && reading
                    .conditions
                    .iter()
                    .any(|c| c.kind == AlertKind::MemoryLeak)
            {
                leak_at = Some(i);
            }
        }
        assert_eq!(leak_at, Some(10));
    }

    #[test]
    fn test_single_noisy_sample_breaks_leak_streak() {
        let config = MemoryMonitorConfig {
            increase_threshold_mb: 10_000.0,
            ..Default::default()
        };
        let mut monitor = MemoryMonitor::new(config);
        let mut value: f64 = 100.0;
        for i in 0..14 {
            value += if i == 8 { -20.0 } else { 2.0 };
            let reading = monitor.record(value, None, i as f64 * 1000.0);
            assert!(
                !reading
                    .conditions
                    .iter()
                    .any(|c| c.kind == AlertKind::MemoryLeak),
                "unexpected leak at sample {i}"
            );
        }
    }

    #[test]
    fn test_leak_needs_current_growth_above_rate() {
        let config = MemoryMonitorConfig {
            increase_threshold_mb: 10_000.0,
            ..Default::default()
        };
        let mut monitor = MemoryMonitor::new(config);
        let mut value = 100.0;
        for i in 0..12 {
            value += 2.0;
            monitor.record(value, None, i as f64 * 1000.0);
        }

        // Still trending up over the window, but the latest step is 0.1MB/s.
        let reading = monitor.record(value + 0.1, None, 12_000.0);
        assert_eq!(reading.snapshot.trend, Trend::Increasing);
        assert!(reading.snapshot.change_rate > 1.0);
        assert!(!reading
            .conditions
            .iter()
            .any(|c| c.kind == AlertKind::MemoryLeak));

        let reading = monitor.record(value + 3.1, None, 13_000.0);
        assert!(reading
            .conditions
            .iter()
            .any(|c| c.kind == AlertKind::MemoryLeak));
    }

    #[test]
    fn test_slow_growth_is_not_a_leak() {
        let config = MemoryMonitorConfig {
            increase_threshold_mb: 10_000.0,
            ..Default::default()
        };
        let mut monitor = MemoryMonitor::new(config);
        for i in 0..30 {
            // 0.5MB/s: increasing, but below the leak rate.
            let reading = monitor.record(100.0 + 0.5 * i as f64, None, i as f64 * 1000.0);
            assert!(reading.conditions.is_empty());
        }
    }

    #[test]
    fn test_unsupported_platform_degrades_to_noop() {
        let platform = ManualPlatform::new();
        let mut monitor = MemoryMonitor::default();
        assert!(monitor.sample(&platform, 0.0).is_none());
        assert!(!monitor.is_supported());

        // Once disabled it stays a no-op for the session.
        platform.set_heap_info(Some(HeapInfo::from_megabytes(10.0, 20.0, 100.0)));
        assert!(monitor.sample(&platform, 1000.0).is_none());
        assert_eq!(monitor.sample_count(), 0);
    }

    #[test]
    fn test_sample_reads_platform_and_reclaims_on_critical() {
        let platform = ManualPlatform::new();
        platform.set_reclaim_supported(true);
        let mut monitor = MemoryMonitor::default();

        platform.set_heap_info(Some(HeapInfo::from_megabytes(50.0, 60.0, 100.0)));
        let reading = monitor.sample(&platform, 0.0).unwrap();
        assert_relative_eq!(reading.used_mb, 50.0);
        assert_eq!(reading.limit_mb, Some(100.0));
        assert!(!reading.reclaimed);

        platform.set_heap_info(Some(HeapInfo::from_megabytes(95.0, 96.0, 100.0)));
        let reading = monitor.sample(&platform, 5000.0).unwrap();
        assert!(reading.has_critical());
        assert!(reading.reclaimed);
        assert_eq!(platform.reclaim_calls(), 1);
    }

    #[test]
    fn test_disabled_monitor_does_nothing() {
        let platform = ManualPlatform::new();
        platform.set_heap_info(Some(HeapInfo::from_megabytes(10.0, 10.0, 100.0)));
        let mut monitor = MemoryMonitor::new(MemoryMonitorConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(monitor.sample(&platform, 0.0).is_none());
        assert!(monitor.is_supported());
    }

    #[test]
    fn test_reset_session_recaptures_baseline() {
        let mut monitor = MemoryMonitor::default();
        monitor.record(10.0, None, 0.0);
        monitor.reset_session();
        assert_eq!(monitor.baseline_mb(), None);
        monitor.record(40.0, None, 1000.0);
        assert_eq!(monitor.baseline_mb(), Some(40.0));
        assert_eq!(monitor.window().len(), 1);
    }

    #[test]
    fn test_invalid_config_is_clamped() {
        let monitor = MemoryMonitor::new(MemoryMonitorConfig {
            window_capacity: 0,
            increase_threshold_mb: -5.0,
            high_usage_ratio: 3.0,
            leak_streak: 0,
            ..Default::default()
        });
        let d = MemoryMonitorConfig::default();
        assert_eq!(monitor.config().window_capacity, d.window_capacity);
        assert_eq!(monitor.config().increase_threshold_mb, d.increase_threshold_mb);
        assert_eq!(monitor.config().high_usage_ratio, d.high_usage_ratio);
        assert_eq!(monitor.config().leak_streak, d.leak_streak);
    }
}
