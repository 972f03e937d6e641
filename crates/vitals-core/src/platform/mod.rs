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

//! Provides abstractions over host platform services.
//!
//! The engine never reads a wall clock, arms an OS timer, or queries the heap
//! directly. Everything it needs from the host is expressed by the traits in
//! this module and injected at construction time, which keeps all engine
//! logic deterministic under a virtual clock.
//!
//! Timers and frame callbacks are handle-based: `schedule` and `request_frame`
//! return an opaque handle, and the host later delivers a [`Wakeup`] carrying
//! that handle back to the engine.

pub mod manual;
pub mod timer_queue;

pub use manual::ManualPlatform;
pub use timer_queue::{TimerQueue, DEFAULT_FRAME_INTERVAL_MS};

use crate::input::{InputKind, ListenerOptions};
use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Identifies a pending one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Identifies a pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// A timer or frame callback delivered back by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wakeup {
    /// A timer armed with [`Scheduler::schedule`] is due.
    Timer(TimerHandle),
    /// A frame requested with [`Scheduler::request_frame`] is being painted.
    Frame(FrameHandle),
}

/// A heap-usage reading, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeapInfo {
    /// Bytes currently in use.
    pub used: u64,
    /// Bytes currently reserved by the heap.
    pub total: u64,
    /// The most the heap is allowed to grow to.
    pub limit: u64,
}

impl HeapInfo {
    /// Builds a reading from megabyte figures.
    pub fn from_megabytes(used: f64, total: f64, limit: f64) -> Self {
        let to_bytes = |mb: f64| (mb.max(0.0) * BYTES_PER_MB) as u64;
        Self {
            used: to_bytes(used),
            total: to_bytes(total),
            limit: to_bytes(limit),
        }
    }

    /// Returns the bytes in use, in megabytes.
    pub fn used_mb(&self) -> f64 {
        self.used as f64 / BYTES_PER_MB
    }

    /// Returns the heap limit, in megabytes.
    pub fn limit_mb(&self) -> f64 {
        self.limit as f64 / BYTES_PER_MB
    }

    /// Returns `used / limit`, or `None` when the limit is unknown.
    pub fn usage_ratio(&self) -> Option<f64> {
        (self.limit > 0).then(|| self.used as f64 / self.limit as f64)
    }
}

/// A coarse classification of the current network connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkTier {
    /// Broadband or 4G-class connection.
    Fast,
    /// 3G-class connection.
    Moderate,
    /// 2G-class connection.
    Slow,
    /// No connection.
    Offline,
    /// The platform does not report connection quality.
    #[default]
    Unknown,
}

/// A monotonic millisecond clock.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds.
    fn now(&self) -> f64;
}

/// Arms and cancels deferred work.
///
/// Cancelling a handle that already fired, was already cancelled, or was never
/// issued must be a no-op.
pub trait Scheduler: Send + Sync {
    /// Arms a one-shot timer that becomes due after `delay_ms`.
    fn schedule(&self, delay_ms: f64) -> TimerHandle;
    /// Cancels a pending timer.
    fn cancel(&self, handle: TimerHandle);
    /// Requests a callback on the next display frame.
    fn request_frame(&self) -> FrameHandle;
    /// Cancels a pending frame request.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Gives access to heap introspection, where the platform supports it.
pub trait HeapInfoSource: Send + Sync {
    /// Returns the current heap usage, or `None` if the platform cannot tell.
    fn query_heap_info(&self) -> Option<HeapInfo>;

    /// Asks the platform to reclaim memory. Returns `true` if it did something.
    fn reclaim_memory(&self) -> bool {
        false
    }
}

/// Lets the engine subscribe to raw input streams.
pub trait InputSource: Send + Sync {
    /// Subscribes to an input stream. Returns `false` if the kind is unsupported.
    fn add_input_listener(&self, kind: InputKind, options: ListenerOptions) -> bool;

    /// Unsubscribes from an input stream.
    fn remove_input_listener(&self, _kind: InputKind) {}
}

/// The full set of services a host platform provides to the engine.
pub trait PlatformServices: Clock + Scheduler + HeapInfoSource + InputSource {
    /// Returns the current connection quality.
    fn network_tier(&self) -> NetworkTier {
        NetworkTier::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_heap_info_conversions() {
        let info = HeapInfo::from_megabytes(80.0, 100.0, 100.0);
        assert_relative_eq!(info.used_mb(), 80.0);
        assert_relative_eq!(info.limit_mb(), 100.0);
        assert_relative_eq!(info.usage_ratio().unwrap(), 0.8);
    }

    #[test]
    fn test_heap_info_without_limit() {
        let info = HeapInfo {
            used: 10,
            total: 10,
            limit: 0,
        };
        assert_eq!(info.usage_ratio(), None);
    }
}
