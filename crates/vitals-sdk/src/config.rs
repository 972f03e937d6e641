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

//! Engine configuration.

use serde::{Deserialize, Serialize};
use vitals_control::AlertThresholds;
use vitals_core::platform::DEFAULT_FRAME_INTERVAL_MS;
use vitals_core::{sanitize, VitalsResult};
use vitals_input::GestureConfig;
use vitals_telemetry::{MemoryMonitorConfig, RenderTimerConfig, ScrollFpsConfig, TouchLatencyConfig};

/// Every recognized engine option. Missing fields take their defaults.
///
/// Thresholds shared between a tracker and an alert rule (touch latency
/// ceiling, FPS threshold, jank ceiling) are set once in [`AlertThresholds`]
/// and copied into the trackers when the configuration is sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Time between memory sampling and alert evaluation ticks.
    pub sample_interval_ms: f64,
    /// Display frame interval used by the platform for frame callbacks.
    pub frame_budget_ms: f64,
    /// Seed for the sampling gates. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    pub memory: MemoryMonitorConfig,
    pub render: RenderTimerConfig,
    pub scroll: ScrollFpsConfig,
    pub touch: TouchLatencyConfig,
    pub gesture: GestureConfig,
    pub alerts: AlertThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000.0,
            frame_budget_ms: DEFAULT_FRAME_INTERVAL_MS,
            rng_seed: None,
            memory: MemoryMonitorConfig::default(),
            render: RenderTimerConfig::default(),
            scroll: ScrollFpsConfig::default(),
            touch: TouchLatencyConfig::default(),
            gesture: GestureConfig::default(),
            alerts: AlertThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document and sanitizes the result.
    pub fn from_json_str(json: &str) -> VitalsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> VitalsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replaces invalid values with defaults and aligns shared thresholds.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let alerts = self.alerts.sanitized();

        let mut render = self.render.sanitized();
        render.jank_threshold_ms = alerts.jank_ceiling_ms;
        let mut scroll = self.scroll.sanitized();
        scroll.fps_threshold = alerts.fps_threshold;
        let mut touch = self.touch.sanitized();
        touch.latency_ceiling_ms = alerts.touch_latency_ceiling_ms;

        // Distinct streams per sampler, so both gates do not admit in lockstep.
        if let Some(seed) = self.rng_seed {
            render.seed.get_or_insert(seed);
            touch.seed.get_or_insert(seed.wrapping_add(1));
        }

        Self {
            sample_interval_ms: sanitize::positive(
                "sample_interval_ms",
                self.sample_interval_ms,
                d.sample_interval_ms,
            ),
            frame_budget_ms: sanitize::positive("frame_budget_ms", self.frame_budget_ms, d.frame_budget_ms),
            rng_seed: self.rng_seed,
            memory: self.memory.sanitized(),
            render,
            scroll,
            touch,
            gesture: self.gesture.sanitized(),
            alerts,
        }
    }
}
