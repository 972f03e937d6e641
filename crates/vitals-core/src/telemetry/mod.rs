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

//! Provides the foundational data structures for runtime telemetry.
//!
//! This module defines the "common language" shared by every sampler and by the
//! alerting layer: timestamped samples, the bounded window that holds them, the
//! derived trend classification, and the immutable alert record.
//!
//! `vitals-telemetry` provides the concrete samplers built on these types, and
//! `vitals-control` evaluates their output against thresholds.

pub mod alert;
pub mod window;

pub use self::alert::{Alert, AlertCondition, AlertKind, Severity};
pub use self::window::{
    MetricSnapshot, Sample, SampleWindow, Trend, TrendReading, DEFAULT_NOISE_FLOOR, TREND_SPAN,
};

/// The metrics tracked by the engine, used to address a sampler's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Heap usage in megabytes.
    Memory,
    /// Render duration in milliseconds.
    RenderDuration,
    /// Scroll frame rate in frames per second.
    ScrollFps,
    /// Touch input latency in milliseconds.
    TouchLatency,
}

impl MetricKind {
    /// Returns the unit the metric is recorded in.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Memory => "MB",
            MetricKind::RenderDuration | MetricKind::TouchLatency => "ms",
            MetricKind::ScrollFps => "fps",
        }
    }
}
