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

//! Threshold-based alerting.
//!
//! Rules run in a fixed order on every evaluation tick:
//!
//! 1. memory: `rapid_increase`, `high_usage`, `memory_leak`
//! 2. touch latency
//! 3. frame drop
//! 4. render jank
//! 5. network
//!
//! so that the alerts raised by one tick always come out in the same order.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use vitals_core::event::{CallbackId, CallbackRegistry};
use vitals_core::sanitize;
use vitals_core::telemetry::{Alert, AlertCondition, AlertKind, MetricSnapshot, Severity};
use vitals_core::NetworkTier;

use crate::observations::Observations;

/// Thresholds for the non-memory rules, and alert log settings.
///
/// Memory thresholds live in `MemoryMonitorConfig`, since the monitor raises
/// those conditions itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Average touch latency above this warns; above twice this is critical.
    pub touch_latency_ceiling_ms: f64,
    /// Average scroll FPS below this warns.
    pub fps_threshold: f64,
    /// Average scroll FPS below this is critical.
    pub fps_critical: f64,
    /// Average render duration above this warns; above twice this is critical.
    pub jank_ceiling_ms: f64,
    /// Samples a window needs before its rule is evaluated.
    pub min_samples: usize,
    /// Repeats of the same kind within this window are suppressed. 0 disables.
    pub cooldown_ms: f64,
    /// Alerts kept in the log.
    pub log_capacity: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            touch_latency_ceiling_ms: 100.0,
            fps_threshold: 55.0,
            fps_critical: 30.0,
            jank_ceiling_ms: 1000.0 / 60.0,
            min_samples: 5,
            cooldown_ms: 0.0,
            log_capacity: 50,
        }
    }
}

impl AlertThresholds {
    /// Replaces invalid values with their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let fps_threshold = sanitize::positive("alerts.fps_threshold", self.fps_threshold, d.fps_threshold);
        let mut fps_critical = sanitize::positive("alerts.fps_critical", self.fps_critical, d.fps_critical);
        if fps_critical > fps_threshold {
            log::warn!("Config: `alerts.fps_critical` above `fps_threshold`, lowering it");
            fps_critical = fps_threshold;
        }
        Self {
            touch_latency_ceiling_ms: sanitize::positive(
                "alerts.touch_latency_ceiling_ms",
                self.touch_latency_ceiling_ms,
                d.touch_latency_ceiling_ms,
            ),
            fps_threshold,
            fps_critical,
            jank_ceiling_ms: sanitize::positive(
                "alerts.jank_ceiling_ms",
                self.jank_ceiling_ms,
                d.jank_ceiling_ms,
            ),
            min_samples: sanitize::capacity("alerts.min_samples", self.min_samples, d.min_samples),
            cooldown_ms: sanitize::non_negative("alerts.cooldown_ms", self.cooldown_ms, d.cooldown_ms),
            log_capacity: sanitize::capacity("alerts.log_capacity", self.log_capacity, d.log_capacity),
        }
    }
}

/// Evaluates rules, keeps the bounded alert log and notifies callbacks.
pub struct AlertEngine {
    thresholds: AlertThresholds,
    log: VecDeque<Alert>,
    last_raised: HashMap<AlertKind, f64>,
    callbacks: CallbackRegistry<Alert>,
}

impl AlertEngine {
    pub fn new(thresholds: AlertThresholds) -> Self {
        let thresholds = thresholds.sanitized();
        Self {
            log: VecDeque::with_capacity(thresholds.log_capacity),
            thresholds,
            last_raised: HashMap::new(),
            callbacks: CallbackRegistry::new("alert"),
        }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Registers a callback invoked for every alert raised from now on.
    pub fn on_alert<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&Alert) -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.register(callback)
    }

    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        self.callbacks.unregister(id)
    }

    /// Returns every threshold currently exceeded, in rule order.
    ///
    /// This has no side effects: nothing is logged, stored or dispatched.
    pub fn conditions(&self, obs: &Observations<'_>) -> Vec<(AlertCondition, MetricSnapshot)> {
        let t = &self.thresholds;
        let mut out = Vec::new();

        // ── 1. Memory ────────────────────────────────────────────────────
        if let Some(reading) = obs.memory {
            out.extend(
                reading
                    .conditions
                    .iter()
                    .cloned()
                    .map(|c| (c, reading.snapshot)),
            );
        }

        // ── 2. Touch latency ─────────────────────────────────────────────
        let touch = obs.touch;
        if touch.sample_count >= t.min_samples {
            let ceiling = t.touch_latency_ceiling_ms;
            let severity = if touch.average_ms > ceiling * 2.0 {
                Some(Severity::Critical)
            } else if touch.average_ms > ceiling {
                Some(Severity::Warning)
            } else {
                None
            };
            if let Some(severity) = severity {
                out.push((
                    AlertCondition::new(
                        AlertKind::HighTouchLatency,
                        severity,
                        format!(
                            "Average touch latency {:.1}ms exceeds {ceiling:.0}ms",
                            touch.average_ms
                        ),
                    ),
                    snapshot_or(touch.snapshot, touch.average_ms, obs.timestamp),
                ));
            }
        }

        // ── 3. Frame drop ────────────────────────────────────────────────
        let scroll = obs.scroll;
        if scroll.sample_count >= t.min_samples {
            let severity = if scroll.average_fps < t.fps_critical {
                Some(Severity::Critical)
            } else if scroll.average_fps < t.fps_threshold {
                Some(Severity::Warning)
            } else {
                None
            };
            if let Some(severity) = severity {
                out.push((
                    AlertCondition::new(
                        AlertKind::FrameDrop,
                        severity,
                        format!(
                            "Scroll running at {:.1}fps ({} of {} frames dropped)",
                            scroll.average_fps, scroll.dropped_frames, scroll.total_frames
                        ),
                    ),
                    snapshot_or(scroll.snapshot, scroll.average_fps, obs.timestamp),
                ));
            }
        }

        // ── 4. Render jank ───────────────────────────────────────────────
        let render = obs.render;
        if render.sample_count >= t.min_samples {
            let ceiling = t.jank_ceiling_ms;
            let severity = if render.average_ms > ceiling * 2.0 {
                Some(Severity::Critical)
            } else if render.average_ms > ceiling {
                Some(Severity::Warning)
            } else {
                None
            };
            if let Some(severity) = severity {
                out.push((
                    AlertCondition::new(
                        AlertKind::RenderJank,
                        severity,
                        format!(
                            "Average render {:.1}ms exceeds the {ceiling:.2}ms frame budget",
                            render.average_ms
                        ),
                    ),
                    snapshot_or(render.snapshot, render.average_ms, obs.timestamp),
                ));
            }
        }

        // ── 5. Network ───────────────────────────────────────────────────
        let network = match obs.network {
            NetworkTier::Slow => Some((Severity::Warning, "Network connection is slow")),
            NetworkTier::Offline => Some((Severity::Critical, "Network connection is offline")),
            _ => None,
        };
        if let Some((severity, message)) = network {
            out.push((
                AlertCondition::new(AlertKind::SlowNetwork, severity, message),
                MetricSnapshot {
                    timestamp: obs.timestamp,
                    ..Default::default()
                },
            ));
        }

        out
    }

    /// Runs every rule, records the resulting alerts and dispatches them.
    ///
    /// Returns the alerts raised by this tick, in rule order. Callback
    /// failures are logged and never interrupt the tick.
    pub fn evaluate(&mut self, obs: &Observations<'_>) -> Vec<Alert> {
        let mut raised = Vec::new();
        for (condition, snapshot) in self.conditions(obs) {
            if self.cooling_down(condition.kind, obs.timestamp) {
                log::trace!("AlertEngine: {} suppressed by cooldown.", condition.kind);
                continue;
            }
            self.last_raised.insert(condition.kind, obs.timestamp);
            raised.push(Alert::new(condition, snapshot, obs.timestamp));
        }

        for alert in &raised {
            match alert.severity() {
                Severity::Critical => log::warn!("Alert: {alert}"),
                Severity::Warning => log::info!("Alert: {alert}"),
            }
            self.push(alert.clone());
            let failures = self.callbacks.dispatch(alert);
            if failures > 0 {
                log::debug!("AlertEngine: {failures} callback(s) failed for {}.", alert.kind());
            }
        }
        raised
    }

    /// The alert log, oldest first.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.log.iter()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Empties the log and forgets cooldowns. Callbacks stay registered.
    pub fn clear(&mut self) {
        self.log.clear();
        self.last_raised.clear();
    }

    fn push(&mut self, alert: Alert) {
        if self.log.len() == self.thresholds.log_capacity {
            self.log.pop_front();
        }
        self.log.push_back(alert);
    }

    fn cooling_down(&self, kind: AlertKind, now: f64) -> bool {
        let cooldown = self.thresholds.cooldown_ms;
        cooldown > 0.0
            && self
                .last_raised
                .get(&kind)
                .is_some_and(|last| now - last < cooldown)
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

impl std::fmt::Debug for AlertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEngine")
            .field("thresholds", &self.thresholds)
            .field("log", &self.log.len())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

fn snapshot_or(snapshot: Option<MetricSnapshot>, current: f64, timestamp: f64) -> MetricSnapshot {
    snapshot.unwrap_or(MetricSnapshot {
        current,
        timestamp,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use vitals_telemetry::{MemoryMonitor, RenderStats, ScrollStats, TouchStats};

    struct Fixture {
        touch: TouchStats,
        scroll: ScrollStats,
        render: RenderStats,
        network: NetworkTier,
    }

    impl Fixture {
        fn healthy() -> Self {
            Self {
                touch: TouchStats {
                    average_ms: 20.0,
                    sample_count: 10,
                    ..Default::default()
                },
                scroll: ScrollStats {
                    average_fps: 60.0,
                    sample_count: 10,
                    ..Default::default()
                },
                render: RenderStats {
                    average_ms: 8.0,
                    sample_count: 10,
                    ..Default::default()
                },
                network: NetworkTier::Fast,
            }
        }

        fn observe(&self, timestamp: f64) -> Observations<'_> {
            Observations {
                memory: None,
                touch: &self.touch,
                scroll: &self.scroll,
                render: &self.render,
                network: self.network,
                timestamp,
            }
        }
    }

    fn kinds(alerts: &[Alert]) -> Vec<(AlertKind, Severity)> {
        alerts.iter().map(|a| (a.kind(), a.severity())).collect()
    }

    #[test]
    fn test_healthy_observations_raise_nothing() {
        let mut engine = AlertEngine::default();
        let fixture = Fixture::healthy();
        assert!(engine.evaluate(&fixture.observe(0.0)).is_empty());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let mut engine = AlertEngine::default();
        let mut monitor = MemoryMonitor::default();
        monitor.record(10.0, None, 0.0);
        let reading = monitor.record(200.0, Some(210.0), 1000.0);

        let mut fixture = Fixture::healthy();
        fixture.touch.average_ms = 150.0;
        fixture.scroll.average_fps = 20.0;
        fixture.render.average_ms = 40.0;
        fixture.network = NetworkTier::Slow;

        let mut obs = fixture.observe(1000.0);
        obs.memory = Some(&reading);
        let alerts = engine.evaluate(&obs);
        assert_eq!(
            kinds(&alerts),
            vec![
                (AlertKind::RapidIncrease, Severity::Critical),
                (AlertKind::HighUsage, Severity::Critical),
                (AlertKind::HighTouchLatency, Severity::Warning),
                (AlertKind::FrameDrop, Severity::Critical),
                (AlertKind::RenderJank, Severity::Critical),
                (AlertKind::SlowNetwork, Severity::Warning),
            ]
        );
        assert_eq!(alerts[0].snapshot().current, 200.0);
    }

    #[test]
    fn test_severity_levels() {
        let mut engine = AlertEngine::default();
        let mut fixture = Fixture::healthy();
        fixture.touch.average_ms = 250.0;
        fixture.scroll.average_fps = 50.0;
        fixture.render.average_ms = 20.0;
        fixture.network = NetworkTier::Offline;
        let alerts = engine.evaluate(&fixture.observe(0.0));
        assert_eq!(
            kinds(&alerts),
            vec![
                (AlertKind::HighTouchLatency, Severity::Critical),
                (AlertKind::FrameDrop, Severity::Warning),
                (AlertKind::RenderJank, Severity::Warning),
                (AlertKind::SlowNetwork, Severity::Critical),
            ]
        );
    }

    #[test]
    fn test_rules_wait_for_min_samples() {
        let mut engine = AlertEngine::default();
        let mut fixture = Fixture::healthy();
        fixture.touch = TouchStats {
            average_ms: 500.0,
            sample_count: 4,
            ..Default::default()
        };
        fixture.scroll = ScrollStats::default();
        assert!(engine.evaluate(&fixture.observe(0.0)).is_empty());
    }

    #[test]
    fn test_log_is_bounded() {
        let mut engine = AlertEngine::default();
        let mut fixture = Fixture::healthy();
        fixture.network = NetworkTier::Offline;
        for i in 0..120 {
            engine.evaluate(&fixture.observe(i as f64));
        }
        assert_eq!(engine.len(), 50);
        // Oldest dropped first.
        assert_eq!(engine.alerts().next().map(|a| a.timestamp()), Some(70.0));
    }

    #[test]
    fn test_failing_callbacks_do_not_block_delivery() {
        let mut engine = AlertEngine::default();
        let delivered = Arc::new(Mutex::new(Vec::new()));
        engine.on_alert(|_| anyhow::bail!("host rejected alert"));
        engine.on_alert(|_| panic!("host bug"));
        let sink = Arc::clone(&delivered);
        engine.on_alert(move |alert| {
            sink.lock().unwrap().push(alert.kind());
            Ok(())
        });

        let mut fixture = Fixture::healthy();
        fixture.network = NetworkTier::Slow;
        fixture.render.average_ms = 30.0;
        let alerts = engine.evaluate(&fixture.observe(0.0));

        assert_eq!(alerts.len(), 2);
        assert_eq!(
            *delivered.lock().unwrap(),
            vec![AlertKind::RenderJank, AlertKind::SlowNetwork]
        );
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_cooldown_suppresses_repeats() {
        let mut engine = AlertEngine::new(AlertThresholds {
            cooldown_ms: 1000.0,
            ..Default::default()
        });
        let mut fixture = Fixture::healthy();
        fixture.network = NetworkTier::Offline;

        assert_eq!(engine.evaluate(&fixture.observe(0.0)).len(), 1);
        assert!(engine.evaluate(&fixture.observe(500.0)).is_empty());
        assert_eq!(engine.evaluate(&fixture.observe(1000.0)).len(), 1);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_conditions_have_no_side_effects() {
        let engine = AlertEngine::default();
        let mut fixture = Fixture::healthy();
        fixture.network = NetworkTier::Slow;
        assert_eq!(engine.conditions(&fixture.observe(0.0)).len(), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_clear_keeps_callbacks() {
        let mut engine = AlertEngine::default();
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        engine.on_alert(move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });
        let mut fixture = Fixture::healthy();
        fixture.network = NetworkTier::Slow;
        engine.evaluate(&fixture.observe(0.0));
        engine.clear();
        assert!(engine.is_empty());
        engine.evaluate(&fixture.observe(1.0));
        assert_eq!(*count.lock().unwrap(), 2);
    }
}
