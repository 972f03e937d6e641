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

//! The aggregate performance score.
//!
//! Four axes of 25 points each: touch latency, scroll smoothness, render
//! jank and network tier. An axis without data scores its full 25 points.

use serde::{Deserialize, Serialize};
use vitals_core::NetworkTier;

use crate::alerts::AlertThresholds;
use crate::observations::Observations;

/// Points available on each axis.
pub const AXIS_POINTS: f64 = 25.0;

/// Coarse banding of the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn from_total(total: f64) -> Self {
        if total >= 90.0 {
            Grade::Excellent
        } else if total >= 75.0 {
            Grade::Good
        } else if total >= 50.0 {
            Grade::Fair
        } else {
            Grade::Poor
        }
    }
}

/// Per-axis breakdown and total, each axis in `[0, 25]`, total in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub touch: f64,
    pub scroll: f64,
    pub render: f64,
    pub network: f64,
    pub total: f64,
}

impl HealthScore {
    pub fn compute(obs: &Observations<'_>, thresholds: &AlertThresholds) -> Self {
        let touch = if obs.touch.sample_count == 0 {
            AXIS_POINTS
        } else {
            // Full marks at half the ceiling, nothing at twice the ceiling.
            let c = thresholds.touch_latency_ceiling_ms;
            AXIS_POINTS * unit((2.0 * c - obs.touch.average_ms) / (1.5 * c))
        };

        let scroll = if obs.scroll.sample_count == 0 {
            AXIS_POINTS
        } else {
            AXIS_POINTS * unit(obs.scroll.smoothness)
        };

        let render = if obs.render.sample_count == 0 {
            AXIS_POINTS
        } else {
            let j = thresholds.jank_ceiling_ms;
            AXIS_POINTS * unit((2.0 * j - obs.render.average_ms) / j)
        };

        let network = match obs.network {
            NetworkTier::Fast | NetworkTier::Unknown => AXIS_POINTS,
            NetworkTier::Moderate => 15.0,
            NetworkTier::Slow => 5.0,
            NetworkTier::Offline => 0.0,
        };

        Self {
            touch,
            scroll,
            render,
            network,
            total: (touch + scroll + render + network).clamp(0.0, 100.0),
        }
    }

    pub fn grade(&self) -> Grade {
        Grade::from_total(self.total)
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vitals_telemetry::{RenderStats, ScrollStats, TouchStats};

    fn score(
        touch: TouchStats,
        scroll: ScrollStats,
        render: RenderStats,
        network: NetworkTier,
    ) -> HealthScore {
        let obs = Observations {
            memory: None,
            touch: &touch,
            scroll: &scroll,
            render: &render,
            network,
            timestamp: 0.0,
        };
        HealthScore::compute(&obs, &AlertThresholds::default())
    }

    #[test]
    fn test_no_data_scores_full_marks() {
        let s = score(
            TouchStats::default(),
            ScrollStats::default(),
            RenderStats::default(),
            NetworkTier::Unknown,
        );
        assert_relative_eq!(s.total, 100.0);
        assert_eq!(s.grade(), Grade::Excellent);
    }

    #[test]
    fn test_axis_formulas() {
        let s = score(
            TouchStats {
                average_ms: 125.0,
                sample_count: 5,
                ..Default::default()
            },
            ScrollStats {
                smoothness: 0.4,
                sample_count: 5,
                ..Default::default()
            },
            RenderStats {
                average_ms: 25.0,
                sample_count: 5,
                ..Default::default()
            },
            NetworkTier::Moderate,
        );
        // (200 - 125) / 150 = 0.5
        assert_relative_eq!(s.touch, 12.5);
        assert_relative_eq!(s.scroll, 10.0);
        // (33.33 - 25) / 16.67 = 0.5
        assert_relative_eq!(s.render, 12.5, epsilon = 1e-9);
        assert_relative_eq!(s.network, 15.0);
        assert_relative_eq!(s.total, 50.0, epsilon = 1e-9);
        assert_eq!(s.grade(), Grade::Fair);
    }

    #[test]
    fn test_axes_clamp() {
        let s = score(
            TouchStats {
                average_ms: 10.0,
                sample_count: 5,
                ..Default::default()
            },
            ScrollStats {
                smoothness: 1.0,
                sample_count: 5,
                ..Default::default()
            },
            RenderStats {
                average_ms: 500.0,
                sample_count: 5,
                ..Default::default()
            },
            NetworkTier::Offline,
        );
        assert_relative_eq!(s.touch, 25.0);
        assert_relative_eq!(s.render, 0.0);
        assert_relative_eq!(s.total, 50.0);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(Grade::from_total(90.0), Grade::Excellent);
        assert_eq!(Grade::from_total(89.9), Grade::Good);
        assert_eq!(Grade::from_total(75.0), Grade::Good);
        assert_eq!(Grade::from_total(50.0), Grade::Fair);
        assert_eq!(Grade::from_total(49.9), Grade::Poor);
    }
}
