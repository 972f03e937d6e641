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

//! The performance engine facade.
//!
//! [`PerformanceEngine`] owns every sampler, the gesture recognizer and the
//! alert engine, and wires them to the injected platform services. It is a
//! plain `&mut self` owner: hosts that run it alongside other threads should
//! go through [`crate::EngineService`], which serializes all access onto one
//! worker.
//!
//! Each sampling tick runs in a fixed order:
//!
//! 1. sample the heap (pushes into the window, recomputes the trend)
//! 2. evaluate alert rules and dispatch new alerts
//! 3. dispatch a metrics update
//! 4. re-arm the sampling timer

use std::sync::Arc;

use vitals_control::{suggestions, AlertEngine, FrameScheduler, HealthScore, Observations};
use vitals_core::event::{CallbackId, CallbackRegistry};
use vitals_core::input::{InputEvent, InputKind, ListenerOptions, TouchEvent};
use vitals_core::telemetry::{Alert, MetricKind, Sample};
use vitals_core::{FrameHandle, PlatformServices, TimerHandle, Wakeup};
use vitals_input::{GestureEvent, GestureRecognizer, GestureState};
use vitals_telemetry::{
    MemoryMonitor, MemoryReading, RenderScope, RenderTimer, ScrollFpsTracker, TouchLatencyTracker,
};

use crate::config::EngineConfig;
use crate::snapshot::{DirtyMetrics, EngineSnapshot, MemoryStats, TrackerStats};

/// Runtime telemetry and gesture engine.
pub struct PerformanceEngine {
    config: EngineConfig,
    platform: Arc<dyn PlatformServices>,
    memory: MemoryMonitor,
    render: RenderTimer,
    scroll: ScrollFpsTracker,
    touch: TouchLatencyTracker,
    gestures: GestureRecognizer,
    alerts: AlertEngine,
    frames: FrameScheduler<DirtyMetrics>,
    published: TrackerStats,
    metrics_callbacks: CallbackRegistry<EngineSnapshot>,
    gesture_callbacks: CallbackRegistry<GestureEvent>,
    last_memory: Option<MemoryReading>,
    sampling_timer: Option<TimerHandle>,
    running: bool,
    ticks: u64,
}

impl PerformanceEngine {
    /// Builds an engine. The configuration is sanitized; nothing is scheduled
    /// until [`PerformanceEngine::start`].
    pub fn new(config: EngineConfig, platform: Arc<dyn PlatformServices>) -> Self {
        let config = config.sanitized();
        Self {
            memory: MemoryMonitor::new(config.memory.clone()),
            render: RenderTimer::new(config.render.clone()),
            scroll: ScrollFpsTracker::new(config.scroll.clone()),
            touch: TouchLatencyTracker::new(config.touch.clone()),
            gestures: GestureRecognizer::new(config.gesture.clone()),
            alerts: AlertEngine::new(config.alerts.clone()),
            frames: FrameScheduler::new(),
            published: TrackerStats::default(),
            metrics_callbacks: CallbackRegistry::new("metrics"),
            gesture_callbacks: CallbackRegistry::new("gesture"),
            last_memory: None,
            sampling_timer: None,
            running: false,
            ticks: 0,
            config,
            platform,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts a monitoring session: subscribes to input and arms the sampling timer.
    ///
    /// Calling `start` on a running engine does nothing.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.memory.reset_session();
        self.last_memory = None;
        self.ticks = 0;
        self.published = self.current_stats();

        let options = ListenerOptions { passive: true };
        for kind in [InputKind::Touch, InputKind::Scroll] {
            if !self.platform.add_input_listener(kind, options) {
                log::warn!("PerformanceEngine: platform does not deliver {kind:?} input.");
            }
        }
        self.arm_sampling();
        log::info!(
            "PerformanceEngine started (sampling every {}ms).",
            self.config.sample_interval_ms
        );
    }

    /// Stops the session and cancels every pending timer and frame request.
    ///
    /// Collected data is kept. Safe to call any number of times.
    pub fn stop(&mut self) {
        if let Some(handle) = self.sampling_timer.take() {
            self.platform.cancel(handle);
        }
        self.frames.cancel(&*self.platform);
        self.gestures.reset(&*self.platform);
        self.render.cancel_measurement();
        self.scroll.end_burst();
        if self.running {
            self.running = false;
            for kind in [InputKind::Touch, InputKind::Scroll] {
                self.platform.remove_input_listener(kind);
            }
            log::info!("PerformanceEngine stopped after {} tick(s).", self.ticks);
        }
    }

    /// Drops all collected samples, alerts and gesture state.
    ///
    /// Callbacks stay registered. A running engine keeps running and captures
    /// a fresh memory baseline on its next tick.
    pub fn clear(&mut self) {
        self.memory.reset_session();
        self.render.clear();
        self.scroll.clear();
        self.touch.clear();
        self.gestures.reset(&*self.platform);
        self.alerts.clear();
        self.frames.cancel(&*self.platform);
        self.last_memory = None;
        self.published = self.current_stats();
        log::debug!("PerformanceEngine cleared.");
    }

    // --- Host input ---

    /// Delivers a timer or frame callback previously requested from the platform.
    ///
    /// Wakeups for handles the engine no longer owns are ignored.
    pub fn handle_wakeup(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::Timer(handle) if self.sampling_timer == Some(handle) => {
                self.sampling_timer = None;
                self.tick();
                if self.running {
                    self.arm_sampling();
                }
            }
            Wakeup::Timer(handle) => {
                if let Some(gesture) = self.gestures.handle_timer(handle) {
                    self.emit_gesture(gesture);
                }
            }
            Wakeup::Frame(handle) => self.flush_frame(handle),
        }
    }

    /// Feeds one raw input event. Ignored while the engine is stopped.
    pub fn handle_input(&mut self, event: InputEvent) {
        if !self.running {
            log::trace!("PerformanceEngine: {:?} input while stopped, ignored.", event.kind());
            return;
        }
        let now = self.platform.now();
        match event {
            InputEvent::Touch(touch) => self.handle_touch(&touch, now),
            InputEvent::Scroll { timestamp } => {
                if self.scroll.record_frame(timestamp).is_some() {
                    self.frames.submit(DirtyMetrics::scroll(), &*self.platform);
                }
            }
        }
    }

    fn handle_touch(&mut self, event: &TouchEvent, now: f64) {
        // Without a contact there is no input timestamp to measure from.
        if !event.points.is_empty() {
            // The input rate sees every event, so touch stats change even
            // when the latency sample is gated out.
            self.touch.record(event.timestamp, now);
            self.frames.submit(DirtyMetrics::touch(), &*self.platform);
        }
        if let Some(gesture) = self.gestures.handle_touch(event, &*self.platform) {
            self.emit_gesture(gesture);
        }
    }

    /// Marks the start of a render. Returns `true` if this render is being timed.
    pub fn begin_render(&mut self) -> bool {
        self.begin_render_at(self.platform.now())
    }

    /// Like [`PerformanceEngine::begin_render`], with an explicit platform timestamp.
    pub fn begin_render_at(&mut self, at: f64) -> bool {
        self.running && self.render.start_measurement(at)
    }

    /// Marks the end of a render. Returns the measured duration, if any.
    pub fn end_render(&mut self) -> Option<f64> {
        self.end_render_at(self.platform.now())
    }

    pub fn end_render_at(&mut self, at: f64) -> Option<f64> {
        let duration = self.render.end_measurement(at)?;
        self.frames.submit(DirtyMetrics::render(), &*self.platform);
        Some(duration)
    }

    /// Times a render scope; the duration is recorded when the guard drops.
    ///
    /// Returns `None` while the engine is stopped.
    pub fn render_scope(&mut self) -> Option<RenderScope<'_, dyn PlatformServices>> {
        if !self.running {
            return None;
        }
        self.frames.submit(DirtyMetrics::render(), &*self.platform);
        Some(self.render.scope(&*self.platform))
    }

    // --- Callbacks ---

    pub fn on_alert<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&Alert) -> anyhow::Result<()> + Send + 'static,
    {
        self.alerts.on_alert(callback)
    }

    /// Registers a callback receiving a snapshot after every tick and at most
    /// once per frame while input is flowing.
    pub fn on_metrics_update<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&EngineSnapshot) -> anyhow::Result<()> + Send + 'static,
    {
        self.metrics_callbacks.register(callback)
    }

    pub fn on_gesture<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&GestureEvent) -> anyhow::Result<()> + Send + 'static,
    {
        self.gesture_callbacks.register(callback)
    }

    pub fn remove_alert_callback(&mut self, id: CallbackId) -> bool {
        self.alerts.remove_callback(id)
    }

    pub fn remove_metrics_callback(&mut self, id: CallbackId) -> bool {
        self.metrics_callbacks.unregister(id)
    }

    pub fn remove_gesture_callback(&mut self, id: CallbackId) -> bool {
        self.gesture_callbacks.unregister(id)
    }

    // --- Queries ---

    /// The current state of every tracker.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot_from(&self.current_stats())
    }

    /// The samples currently held for one metric, oldest first.
    pub fn history(&self, kind: MetricKind) -> Vec<Sample> {
        match kind {
            MetricKind::Memory => self.memory.window().to_vec(),
            MetricKind::RenderDuration => self.render.window().to_vec(),
            MetricKind::ScrollFps => self.scroll.window().to_vec(),
            MetricKind::TouchLatency => self.touch.window().to_vec(),
        }
    }

    /// The alert log, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.alerts().cloned().collect()
    }

    pub fn performance_score(&self) -> HealthScore {
        self.snapshot().score
    }

    /// Optimisation hints for every threshold currently exceeded.
    pub fn suggestions(&self) -> Vec<String> {
        let stats = self.current_stats();
        let obs = Observations {
            memory: self.last_memory.as_ref(),
            touch: &stats.touch,
            scroll: &stats.scroll,
            render: &stats.render,
            network: self.platform.network_tier(),
            timestamp: self.platform.now(),
        };
        let conditions: Vec<_> = self
            .alerts
            .conditions(&obs)
            .into_iter()
            .map(|(condition, _)| condition)
            .collect();
        suggestions(&conditions)
    }

    /// The live gesture state.
    pub fn gesture_state(&self) -> &GestureState {
        self.gestures.state()
    }

    /// Whether the memory monitor still has a heap source to sample.
    pub fn memory_supported(&self) -> bool {
        self.memory.is_supported()
    }

    // --- Internals ---

    fn arm_sampling(&mut self) {
        self.sampling_timer = Some(self.platform.schedule(self.config.sample_interval_ms));
    }

    fn tick(&mut self) {
        let now = self.platform.now();
        self.ticks += 1;

        // A tick without a heap reading keeps evaluating the other rules.
        let reading = self.memory.sample(&*self.platform, now);

        self.published = self.current_stats();
        let obs = Observations {
            memory: reading.as_ref(),
            touch: &self.published.touch,
            scroll: &self.published.scroll,
            render: &self.published.render,
            network: self.platform.network_tier(),
            timestamp: now,
        };
        let raised = self.alerts.evaluate(&obs);
        log::trace!("PerformanceEngine: tick {} raised {} alert(s).", self.ticks, raised.len());
        if reading.is_some() {
            self.last_memory = reading;
        }

        let snapshot = self.snapshot_from(&self.published);
        self.metrics_callbacks.dispatch(&snapshot);
    }

    /// Publishes a coalesced update, recomputing only the samplers that
    /// changed since the last one.
    fn flush_frame(&mut self, handle: FrameHandle) {
        let Some(dirty) = self.frames.on_frame(handle) else {
            return;
        };
        log::trace!("PerformanceEngine: frame flush {dirty:?}.");
        if dirty.touch {
            self.published.touch = self.touch.stats();
        }
        if dirty.scroll {
            self.published.scroll = self.scroll.stats();
        }
        if dirty.render {
            self.published.render = self.render.stats();
        }
        let snapshot = self.snapshot_from(&self.published);
        self.metrics_callbacks.dispatch(&snapshot);
    }

    fn current_stats(&self) -> TrackerStats {
        TrackerStats {
            touch: self.touch.stats(),
            scroll: self.scroll.stats(),
            render: self.render.stats(),
        }
    }

    fn snapshot_from(&self, stats: &TrackerStats) -> EngineSnapshot {
        let network = self.platform.network_tier();
        let timestamp = self.platform.now();
        let obs = Observations {
            memory: self.last_memory.as_ref(),
            touch: &stats.touch,
            scroll: &stats.scroll,
            render: &stats.render,
            network,
            timestamp,
        };
        let score = HealthScore::compute(&obs, self.alerts.thresholds());
        EngineSnapshot {
            timestamp,
            running: self.running,
            memory: self.last_memory.as_ref().map(MemoryStats::from),
            render: stats.render,
            scroll: stats.scroll,
            touch: stats.touch,
            network,
            grade: score.grade(),
            score,
            alert_count: self.alerts.len(),
            ticks: self.ticks,
        }
    }

    fn emit_gesture(&mut self, gesture: GestureEvent) {
        log::debug!("PerformanceEngine: {} recognized.", gesture.name());
        self.gesture_callbacks.dispatch(&gesture);
    }
}

impl Drop for PerformanceEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PerformanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceEngine")
            .field("running", &self.running)
            .field("ticks", &self.ticks)
            .field("alerts", &self.alerts.len())
            .finish()
    }
}
