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

//! # Vitals Control
//!
//! The decision layer sitting on top of the samplers.
//!
//! - [`AlertEngine`] evaluates threshold rules in a fixed order, keeps a
//!   bounded alert log and forwards new alerts to host callbacks.
//! - [`HealthScore`] condenses the current observations into a 0-100 score.
//! - [`suggestions`] turns exceeded thresholds into optimisation hints.
//! - [`FrameScheduler`] coalesces bursts of updates into one per display frame.

pub mod alerts;
pub mod frame;
pub mod observations;
pub mod score;
pub mod suggestions;

pub use alerts::{AlertEngine, AlertThresholds};
pub use frame::{Coalesce, FrameScheduler};
pub use observations::Observations;
pub use score::{Grade, HealthScore};
pub use suggestions::suggestions;
