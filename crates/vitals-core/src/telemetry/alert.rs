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

//! Alert records raised when a monitored metric crosses a threshold.

use super::window::MetricSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// What condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Heap usage grew past the configured increase over the session baseline.
    RapidIncrease,
    /// Heap usage is close to the platform limit.
    HighUsage,
    /// Heap usage has been rising steadily for many consecutive samples.
    MemoryLeak,
    /// Touch input takes too long to be processed.
    HighTouchLatency,
    /// Scrolling runs below the frame-rate floor.
    FrameDrop,
    /// Renders exceed the frame budget.
    RenderJank,
    /// The network is slow or unavailable.
    SlowNetwork,
}

impl AlertKind {
    /// Returns the stable snake-case name of the alert kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::RapidIncrease => "rapid_increase",
            AlertKind::HighUsage => "high_usage",
            AlertKind::MemoryLeak => "memory_leak",
            AlertKind::HighTouchLatency => "high_touch_latency",
            AlertKind::FrameDrop => "frame_drop",
            AlertKind::RenderJank => "render_jank",
            AlertKind::SlowNetwork => "slow_network",
        }
    }
}

impl Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Degraded but tolerable.
    Warning,
    /// Needs immediate attention.
    Critical,
}

/// A threshold crossing detected by a sampler, before it is stamped into an [`Alert`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCondition {
    /// The condition detected.
    pub kind: AlertKind,
    /// How severe the crossing is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl AlertCondition {
    /// Creates a new condition.
    pub fn new(kind: AlertKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

/// An immutable record of a threshold crossing.
///
/// Alerts are created once by the alert engine and only ever read afterwards,
/// so their fields are exposed through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    kind: AlertKind,
    severity: Severity,
    message: String,
    snapshot: MetricSnapshot,
    timestamp: f64,
}

impl Alert {
    /// Stamps a condition with the metric snapshot that triggered it.
    pub fn new(condition: AlertCondition, snapshot: MetricSnapshot, timestamp: f64) -> Self {
        Self {
            kind: condition.kind,
            severity: condition.severity,
            message: condition.message,
            snapshot,
            timestamp,
        }
    }

    /// The condition reported.
    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    /// How severe the condition is.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The metric snapshot at the time the alert was raised.
    pub fn snapshot(&self) -> &MetricSnapshot {
        &self.snapshot
    }

    /// When the alert was raised, in milliseconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Returns `true` for critical alerts.
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.kind, self.message)
    }
}
