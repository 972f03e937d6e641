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

//! A virtual-clock platform for tests and for hosts that drive time themselves.

use super::{
    Clock, FrameHandle, HeapInfo, HeapInfoSource, InputSource, NetworkTier, PlatformServices,
    Scheduler, TimerHandle, TimerQueue, Wakeup, DEFAULT_FRAME_INTERVAL_MS,
};
use crate::input::{InputKind, ListenerOptions};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct ManualState {
    now: f64,
    queue: TimerQueue,
    heap: Option<HeapInfo>,
    reclaim_supported: bool,
    reclaim_calls: usize,
    network: NetworkTier,
    listeners: Vec<(InputKind, ListenerOptions)>,
}

/// A [`PlatformServices`] implementation whose clock only moves when told to.
///
/// Time advances through [`ManualPlatform::pop_due`], which steps the clock to
/// each due deadline in order, or explicitly via [`ManualPlatform::set_now`].
#[derive(Debug)]
pub struct ManualPlatform {
    state: Mutex<ManualState>,
}

impl ManualPlatform {
    /// Creates a platform at time zero with no heap introspection.
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL_MS)
    }

    /// Creates a platform with a custom frame interval.
    pub fn with_frame_interval(frame_interval_ms: f64) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: 0.0,
                queue: TimerQueue::new(frame_interval_ms),
                heap: None,
                reclaim_supported: false,
                reclaim_calls: 0,
                network: NetworkTier::Unknown,
                listeners: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Moves the clock to `now`. Moving backwards is ignored.
    pub fn set_now(&self, now: f64) {
        let mut state = self.state();
        if now > state.now {
            state.now = now;
        }
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: f64) {
        let now = self.state().now + delta_ms.max(0.0);
        self.set_now(now);
    }

    /// Pops the earliest wakeup due at or before `until`, stepping the clock to its deadline.
    pub fn pop_due(&self, until: f64) -> Option<Wakeup> {
        let mut state = self.state();
        let (deadline, wakeup) = state.queue.pop_due(until)?;
        if deadline > state.now {
            state.now = deadline;
        }
        Some(wakeup)
    }

    /// Returns the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<f64> {
        self.state().queue.next_deadline()
    }

    /// Returns `true` if the wakeup is still pending.
    pub fn is_pending(&self, wakeup: Wakeup) -> bool {
        self.state().queue.contains(wakeup)
    }

    /// Returns the number of pending timers and frame requests.
    pub fn pending_count(&self) -> usize {
        self.state().queue.len()
    }

    /// Sets the heap reading, or `None` to simulate a platform without introspection.
    pub fn set_heap_info(&self, heap: Option<HeapInfo>) {
        self.state().heap = heap;
    }

    /// Enables or disables forced reclamation.
    pub fn set_reclaim_supported(&self, supported: bool) {
        self.state().reclaim_supported = supported;
    }

    /// Returns how many times reclamation was requested.
    pub fn reclaim_calls(&self) -> usize {
        self.state().reclaim_calls
    }

    /// Sets the reported network tier.
    pub fn set_network_tier(&self, tier: NetworkTier) {
        self.state().network = tier;
    }

    /// Returns the currently registered input listeners.
    pub fn listeners(&self) -> Vec<(InputKind, ListenerOptions)> {
        self.state().listeners.clone()
    }
}

impl Default for ManualPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualPlatform {
    fn now(&self) -> f64 {
        self.state().now
    }
}

impl Scheduler for ManualPlatform {
    fn schedule(&self, delay_ms: f64) -> TimerHandle {
        let mut state = self.state();
        let now = state.now;
        state.queue.schedule(now, delay_ms)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.state().queue.cancel(handle);
    }

    fn request_frame(&self) -> FrameHandle {
        let mut state = self.state();
        let now = state.now;
        state.queue.request_frame(now)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.state().queue.cancel_frame(handle);
    }
}

impl HeapInfoSource for ManualPlatform {
    fn query_heap_info(&self) -> Option<HeapInfo> {
        self.state().heap
    }

    fn reclaim_memory(&self) -> bool {
        let mut state = self.state();
        state.reclaim_calls += 1;
        state.reclaim_supported
    }
}

impl InputSource for ManualPlatform {
    fn add_input_listener(&self, kind: InputKind, options: ListenerOptions) -> bool {
        let mut state = self.state();
        if !state.listeners.iter().any(|(k, _)| *k == kind) {
            state.listeners.push((kind, options));
        }
        true
    }

    fn remove_input_listener(&self, kind: InputKind) {
        self.state().listeners.retain(|(k, _)| *k != kind);
    }
}

impl PlatformServices for ManualPlatform {
    fn network_tier(&self) -> NetworkTier {
        self.state().network
    }
}
