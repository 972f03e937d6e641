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

//! # Vitals Core
//!
//! Foundational crate containing the telemetry contracts, platform-service traits,
//! and shared data types that every other `vitals` crate builds on.

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod input;
pub mod platform;
pub mod sanitize;
pub mod telemetry;

pub use error::{VitalsError, VitalsResult};
pub use platform::{
    Clock, FrameHandle, HeapInfo, HeapInfoSource, InputSource, NetworkTier, PlatformServices,
    Scheduler, TimerHandle, Wakeup,
};
pub use telemetry::{Alert, AlertKind, MetricSnapshot, Sample, SampleWindow, Severity, Trend};
