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

//! Event delivery to the host: synchronous callbacks and a bounded channel.
//!
//! Callbacks suit hosts that drive the engine on their own thread; the
//! [`EventBus`] suits hosts that run the engine as a background service and
//! drain events from elsewhere. Both preserve per-tick ordering.

pub mod bus;
pub mod callbacks;

pub use bus::EventBus;
pub use callbacks::{Callback, CallbackId, CallbackRegistry};
