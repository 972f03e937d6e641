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

//! The view of every sampler that rules and scores are computed from.

use vitals_core::NetworkTier;
use vitals_telemetry::{MemoryReading, RenderStats, ScrollStats, TouchStats};

/// One tick's worth of sampler output.
#[derive(Debug, Clone, Copy)]
pub struct Observations<'a> {
    /// This tick's heap reading. `None` when memory sampling is off or unsupported.
    pub memory: Option<&'a MemoryReading>,
    pub touch: &'a TouchStats,
    pub scroll: &'a ScrollStats,
    pub render: &'a RenderStats,
    pub network: NetworkTier,
    /// When the observations were taken, in milliseconds.
    pub timestamp: f64,
}
