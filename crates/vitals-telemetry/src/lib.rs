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

//! # Vitals Telemetry
//!
//! Runtime health samplers. Each sampler owns its own bounded window and turns
//! raw measurements into snapshots and aggregate statistics:
//!
//! - [`MemoryMonitor`]: periodic heap sampling with baseline, high-usage and leak detection.
//! - [`RenderTimer`]: per-render durations with probabilistic sampling.
//! - [`ScrollFpsTracker`]: frame rate and dropped frames while scrolling.
//! - [`TouchLatencyTracker`]: delay between input and processing.

pub mod memory;
pub mod render;
pub mod sampling;
pub mod scroll;
pub mod touch;

pub use memory::{MemoryMonitor, MemoryMonitorConfig, MemoryReading};
pub use render::{RenderScope, RenderStats, RenderTimer, RenderTimerConfig};
pub use sampling::SamplingGate;
pub use scroll::{ScrollFpsConfig, ScrollFpsTracker, ScrollStats};
pub use touch::{TouchLatencyConfig, TouchLatencyTracker, TouchStats};

/// Maps `value` onto `[0, 1]` as `max(0, (value - floor) / range)`, capped at 1.
///
/// A non-positive range yields 1.0 when `value` reaches `floor`, else 0.0.
pub fn normalized_score(value: f64, floor: f64, range: f64) -> f64 {
    if range <= 0.0 || !range.is_finite() {
        return if value >= floor { 1.0 } else { 0.0 };
    }
    ((value - floor) / range).clamp(0.0, 1.0)
}
