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

//! The public-facing API of the vitals performance engine.
//!
//! Hosts either own a [`PerformanceEngine`] directly and deliver timers,
//! frames and input themselves, or start an [`EngineService`] that runs the
//! engine on its own thread against the operating system.

pub mod config;
pub mod engine;
pub mod service;
pub mod snapshot;

pub use config::EngineConfig;
pub use engine::PerformanceEngine;
pub use service::{EngineCommand, EngineEvent, EngineService, ServiceConfig};
pub use snapshot::{EngineSnapshot, MemoryStats};

pub mod prelude {
    pub use crate::{EngineConfig, EngineEvent, EngineService, EngineSnapshot, PerformanceEngine};
    pub use vitals_control::{Grade, HealthScore};
    pub use vitals_core::input::{InputEvent, TouchEvent, TouchPhase, TouchPoint};
    pub use vitals_core::telemetry::{Alert, AlertKind, MetricKind, Severity};
    pub use vitals_core::{Clock, NetworkTier, PlatformServices, VitalsError, VitalsResult, Wakeup};
    pub use vitals_input::{Direction, GestureEvent};
}
