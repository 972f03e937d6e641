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

//! Optimisation hints derived from the thresholds currently exceeded.

use vitals_core::telemetry::{AlertCondition, AlertKind};

fn hint(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::RapidIncrease => {
            "Memory grew quickly since startup: release caches and large buffers that are no longer displayed"
        }
        AlertKind::HighUsage => {
            "Memory is close to its limit: lower image resolution and trim in-memory collections"
        }
        AlertKind::MemoryLeak => {
            "Memory keeps rising: check for listeners, timers or subscriptions that are never removed"
        }
        AlertKind::HighTouchLatency => {
            "Input handling is slow: keep touch handlers short and defer heavy work off the input path"
        }
        AlertKind::FrameDrop => {
            "Scrolling drops frames: virtualize long lists and avoid layout work in scroll handlers"
        }
        AlertKind::RenderJank => {
            "Renders exceed the frame budget: memoize expensive views and split work across frames"
        }
        AlertKind::SlowNetwork => {
            "Network is degraded: defer non-critical requests and serve cached content"
        }
    }
}

/// Maps conditions to hints, one per alert kind, in the order the conditions came.
pub fn suggestions(conditions: &[AlertCondition]) -> Vec<String> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for condition in conditions {
        if seen.contains(&condition.kind) {
            continue;
        }
        seen.push(condition.kind);
        out.push(hint(condition.kind).to_string());
    }
    out
}
