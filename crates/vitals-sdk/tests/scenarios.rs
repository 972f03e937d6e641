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

//! End-to-end behaviour of the engine against a virtual clock.

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use vitals_core::input::{InputEvent, TouchEvent, TouchPhase, TouchPoint};
use vitals_core::platform::{HeapInfo, ManualPlatform};
use vitals_core::telemetry::{AlertKind, MetricKind, SampleWindow, Severity};
use vitals_core::NetworkTier;
use vitals_input::{Direction, GestureConfig, GestureEvent};
use vitals_sdk::{EngineConfig, PerformanceEngine};

struct Harness {
    engine: PerformanceEngine,
    platform: Arc<ManualPlatform>,
    gestures: Arc<Mutex<Vec<GestureEvent>>>,
}

impl Harness {
    fn new(config: EngineConfig) -> Self {
        let platform = Arc::new(ManualPlatform::new());
        let mut engine = PerformanceEngine::new(config, platform.clone());
        let gestures = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&gestures);
        engine.on_gesture(move |g| {
            sink.lock().unwrap().push(*g);
            Ok(())
        });
        engine.start();
        Self {
            engine,
            platform,
            gestures,
        }
    }

    /// Delivers every wakeup due up to `until`, then parks the clock there.
    fn run_until(&mut self, until: f64) {
        while let Some(wakeup) = self.platform.pop_due(until) {
            self.engine.handle_wakeup(wakeup);
        }
        self.platform.set_now(until);
    }

    fn touch(&mut self, phase: TouchPhase, points: &[(f64, f64)], t: f64) {
        self.platform.set_now(t);
        let points = points.iter().map(|&(x, y)| TouchPoint::new(x, y, t)).collect();
        self.engine
            .handle_input(InputEvent::Touch(TouchEvent::new(phase, points)));
    }

    fn set_heap_mb(&self, used: f64) {
        self.platform
            .set_heap_info(Some(HeapInfo::from_megabytes(used, used, 1000.0)));
    }

    fn gestures(&self) -> Vec<GestureEvent> {
        self.gestures.lock().unwrap().clone()
    }
}

/// A rapid increase is critical only above twice the 50MB threshold, so the
/// 70MB rise stays a warning and the 110MB rise escalates.
#[test]
fn memory_growth_escalates_from_warning_to_critical() {
    let mut h = Harness::new(EngineConfig::default());
    for (i, used) in [10.0, 20.0, 80.0].into_iter().enumerate() {
        h.set_heap_mb(used);
        h.run_until(1000.0 * (i as f64 + 1.0));
    }

    let alerts = h.engine.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind(), AlertKind::RapidIncrease);
    assert_eq!(alerts[0].severity(), Severity::Warning);
    assert_relative_eq!(h.engine.snapshot().memory.unwrap().increase_from_baseline, 70.0);

    h.set_heap_mb(120.0);
    h.run_until(4000.0);
    let last = h.engine.alerts().pop().unwrap();
    assert_eq!(last.kind(), AlertKind::RapidIncrease);
    assert_eq!(last.severity(), Severity::Critical);
}

#[test]
fn window_keeps_the_newest_samples() {
    let mut window = SampleWindow::new(5);
    for v in 1..=8 {
        window.push(v as f64, v as f64);
    }
    let values: Vec<f64> = window.iter().map(|s| s.value).collect();
    assert_eq!(values, vec![4.0, 5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn quick_horizontal_drag_is_a_right_swipe() {
    let mut h = Harness::new(EngineConfig {
        gesture: GestureConfig {
            swipe_threshold: 50.0,
            velocity_threshold: 0.5,
            ..Default::default()
        },
        ..Default::default()
    });
    h.touch(TouchPhase::Start, &[(0.0, 0.0)], 100.0);
    h.touch(TouchPhase::Move, &[(100.0, 0.0)], 150.0);
    h.touch(TouchPhase::End, &[(100.0, 0.0)], 160.0);

    match h.gestures().as_slice() {
        [GestureEvent::Swipe {
            direction,
            velocity,
            distance,
            duration,
        }] => {
            assert_eq!(*direction, Direction::Right);
            assert_relative_eq!(*distance, 100.0);
            assert_relative_eq!(*duration, 60.0);
            assert_relative_eq!(velocity.x, 100.0 / 60.0);
        }
        other => panic!("expected one swipe, got {other:?}"),
    }
    assert!(h.engine.gesture_state().phase == vitals_input::GesturePhase::Idle);
}

#[test]
fn spreading_two_fingers_is_a_pinch() {
    let mut h = Harness::new(EngineConfig::default());
    h.touch(TouchPhase::Start, &[(0.0, 0.0), (100.0, 0.0)], 10.0);
    h.touch(TouchPhase::Move, &[(0.0, 0.0), (150.0, 0.0)], 60.0);

    match h.gestures().as_slice() {
        [GestureEvent::Pinch { scale, center, .. }] => {
            assert_relative_eq!(*scale, 1.5);
            assert_relative_eq!(center.0, 75.0);
        }
        other => panic!("expected one pinch, got {other:?}"),
    }
}

#[test]
fn still_finger_becomes_a_long_press() {
    let mut h = Harness::new(EngineConfig::default());
    h.touch(TouchPhase::Start, &[(40.0, 40.0)], 0.0);
    h.run_until(499.0);
    assert!(h.gestures().is_empty());
    h.run_until(500.0);
    assert!(matches!(
        h.gestures().as_slice(),
        [GestureEvent::LongPress { point }] if point.x == 40.0
    ));
}

#[test]
fn moving_finger_cancels_the_long_press() {
    let mut h = Harness::new(EngineConfig::default());
    h.touch(TouchPhase::Start, &[(40.0, 40.0)], 0.0);
    h.touch(TouchPhase::Move, &[(55.0, 40.0)], 300.0);
    h.run_until(1500.0);
    assert!(h.gestures().is_empty());
}

#[test]
fn stop_leaves_no_pending_work() {
    let mut h = Harness::new(EngineConfig::default());
    h.touch(TouchPhase::Start, &[(0.0, 0.0)], 0.0);
    h.engine.handle_input(InputEvent::Scroll { timestamp: 0.0 });
    h.engine.handle_input(InputEvent::Scroll { timestamp: 5.0 });
    assert!(h.platform.pending_count() > 0);

    h.engine.stop();
    assert_eq!(h.platform.pending_count(), 0);
    h.engine.stop();
    assert_eq!(h.platform.pending_count(), 0);
}

#[test]
fn missing_heap_introspection_is_not_fatal() {
    let mut h = Harness::new(EngineConfig::default());
    h.run_until(5000.0);

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.ticks, 5);
    assert!(snapshot.memory.is_none());
    assert!(!h.engine.memory_supported());
    assert!(h.engine.history(MetricKind::Memory).is_empty());
}

#[test]
fn simultaneous_conditions_alert_in_rule_order() {
    let mut h = Harness::new(EngineConfig {
        gesture: GestureConfig {
            long_press_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    });
    h.set_heap_mb(10.0);
    h.run_until(1000.0);
    assert!(h.engine.alerts().is_empty());

    h.set_heap_mb(80.0);
    h.platform.set_network_tier(NetworkTier::Slow);
    // Scroll at 20fps.
    for i in 0..6 {
        h.engine.handle_input(InputEvent::Scroll {
            timestamp: 1100.0 + i as f64 * 50.0,
        });
    }
    // Renders of 40ms.
    for i in 0..5 {
        let start = 1400.0 + i as f64 * 50.0;
        assert!(h.engine.begin_render_at(start));
        assert_eq!(h.engine.end_render_at(start + 40.0), Some(40.0));
    }
    // Touches processed 250ms after they happened.
    for i in 0..3 {
        let now = 1700.0 + i as f64 * 20.0;
        h.platform.set_now(now);
        for phase in [TouchPhase::Start, TouchPhase::End] {
            h.engine.handle_input(InputEvent::Touch(TouchEvent::single(
                phase,
                0.0,
                0.0,
                now - 250.0,
            )));
        }
    }
    h.run_until(2000.0);

    let kinds: Vec<AlertKind> = h.engine.alerts().iter().map(|a| a.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            AlertKind::RapidIncrease,
            AlertKind::HighTouchLatency,
            AlertKind::FrameDrop,
            AlertKind::RenderJank,
            AlertKind::SlowNetwork,
        ]
    );
    assert!(h.engine.alerts()[1..4].iter().all(|a| a.is_critical()));
    assert!(!h.engine.suggestions().is_empty());
    assert!(h.engine.performance_score().total < 50.0);
}

#[test]
fn alert_log_stays_bounded() {
    let mut h = Harness::new(EngineConfig::default());
    h.platform.set_network_tier(NetworkTier::Offline);
    h.run_until(80_000.0);
    assert_eq!(h.engine.snapshot().ticks, 80);
    assert_eq!(h.engine.alerts().len(), 50);
    assert_relative_eq!(h.engine.alerts()[0].timestamp(), 31_000.0);
}

#[test]
fn failing_callbacks_do_not_block_others() {
    let mut h = Harness::new(EngineConfig::default());
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    h.engine.on_alert(|_| anyhow::bail!("host handler failed"));
    h.engine.on_alert(|_| panic!("host handler panicked"));
    h.engine.on_alert(move |alert| {
        sink.lock().unwrap().push(alert.kind());
        Ok(())
    });

    h.platform.set_network_tier(NetworkTier::Offline);
    h.run_until(2000.0);
    assert_eq!(
        *received.lock().unwrap(),
        vec![AlertKind::SlowNetwork, AlertKind::SlowNetwork]
    );
    assert_eq!(h.engine.snapshot().ticks, 2);
}

#[test]
fn mixed_input_in_one_frame_emits_one_update() {
    let mut h = Harness::new(EngineConfig::default());
    let updates = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&updates);
    h.engine.on_metrics_update(move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    h.platform.set_now(1.0);
    h.engine.handle_input(InputEvent::Scroll { timestamp: 0.0 });
    h.engine.handle_input(InputEvent::Scroll { timestamp: 1.0 });
    h.touch(TouchPhase::Start, &[(0.0, 0.0)], 2.0);
    h.touch(TouchPhase::End, &[(0.0, 0.0)], 3.0);
    h.engine.begin_render_at(3.0);
    h.engine.end_render_at(4.0);
    h.run_until(16.0);
    assert_eq!(*updates.lock().unwrap(), 0);
    h.run_until(17.0);
    assert_eq!(*updates.lock().unwrap(), 1);

    // The sampling tick emits its own update.
    h.run_until(1000.0);
    assert_eq!(*updates.lock().unwrap(), 2);
}

#[test]
fn render_history_is_bounded() {
    let mut h = Harness::new(EngineConfig::default());
    for i in 0..150 {
        let start = i as f64 * 10.0;
        h.engine.begin_render_at(start);
        h.engine.end_render_at(start + 2.0);
    }
    let history = h.engine.history(MetricKind::RenderDuration);
    assert_eq!(history.len(), 100);
    assert_relative_eq!(history[0].timestamp, 502.0);
}

#[test]
fn config_from_json_drives_the_engine() {
    let config = EngineConfig::from_json_str(
        r#"{ "sample_interval_ms": 250, "alerts": { "min_samples": 1 } }"#,
    )
    .unwrap();
    let mut h = Harness::new(config);
    h.run_until(1000.0);
    assert_eq!(h.engine.snapshot().ticks, 4);
}
