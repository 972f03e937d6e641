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

//! Point-in-time views of the engine handed to hosts.

use serde::{Deserialize, Serialize};
use vitals_control::{Coalesce, Grade, HealthScore};
use vitals_core::telemetry::MetricSnapshot;
use vitals_core::NetworkTier;
use vitals_telemetry::{MemoryReading, RenderStats, ScrollStats, TouchStats};

/// Heap figures from the latest sampling tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub snapshot: MetricSnapshot,
    pub used_mb: f64,
    pub limit_mb: Option<f64>,
    pub baseline_mb: f64,
    pub increase_from_baseline: f64,
    pub peak_mb: f64,
}

impl From<&MemoryReading> for MemoryStats {
    fn from(reading: &MemoryReading) -> Self {
        Self {
            snapshot: reading.snapshot,
            used_mb: reading.used_mb,
            limit_mb: reading.limit_mb,
            baseline_mb: reading.baseline_mb,
            increase_from_baseline: reading.increase_from_baseline,
            peak_mb: reading.peak_mb,
        }
    }
}

/// Everything the engine currently knows, as one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// When the snapshot was taken, in milliseconds.
    pub timestamp: f64,
    pub running: bool,
    /// `None` before the first tick or when heap introspection is unavailable.
    pub memory: Option<MemoryStats>,
    pub render: RenderStats,
    pub scroll: ScrollStats,
    pub touch: TouchStats,
    pub network: NetworkTier,
    pub score: HealthScore,
    pub grade: Grade,
    /// Alerts currently held in the log.
    pub alert_count: usize,
    /// Sampling ticks run since start.
    pub ticks: u64,
}

/// Which trackers changed since the last metrics emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DirtyMetrics {
    pub touch: bool,
    pub scroll: bool,
    pub render: bool,
}

impl DirtyMetrics {
    pub fn touch() -> Self {
        Self {
            touch: true,
            ..Default::default()
        }
    }

    pub fn scroll() -> Self {
        Self {
            scroll: true,
            ..Default::default()
        }
    }

    pub fn render() -> Self {
        Self {
            render: true,
            ..Default::default()
        }
    }
}

/// Sampler statistics as last handed to metrics callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct TrackerStats {
    pub touch: TouchStats,
    pub scroll: ScrollStats,
    pub render: RenderStats,
}

impl Coalesce for DirtyMetrics {
    fn merge(&mut self, newer: Self) {
        self.touch |= newer.touch;
        self.scroll |= newer.scroll;
        self.render |= newer.render;
    }
}
