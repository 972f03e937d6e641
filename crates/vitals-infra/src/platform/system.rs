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

//! sysinfo-backed implementation of the platform services.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, System};
use vitals_core::input::{InputKind, ListenerOptions};
use vitals_core::platform::{TimerQueue, DEFAULT_FRAME_INTERVAL_MS};
use vitals_core::{
    Clock, FrameHandle, HeapInfo, HeapInfoSource, InputSource, NetworkTier, PlatformServices,
    Scheduler, TimerHandle, Wakeup,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Platform services for a native host process.
///
/// Time is measured from construction. Timers and frame requests are kept in
/// a [`TimerQueue`] that the host drains with [`SystemPlatform::pop_due`].
/// Heap usage is the resident memory of the current process, with the
/// machine's total memory as the limit.
pub struct SystemPlatform {
    origin: Instant,
    queue: Mutex<TimerQueue>,
    system: Mutex<System>,
    pid: Option<Pid>,
    network: Mutex<NetworkTier>,
    listeners: Mutex<Vec<(InputKind, ListenerOptions)>>,
}

impl SystemPlatform {
    /// Creates a platform with a 60Hz frame interval.
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL_MS)
    }

    /// Creates a platform with a custom frame interval, in milliseconds.
    pub fn with_frame_interval(frame_interval_ms: f64) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("SystemPlatform: cannot resolve current pid ({e}), heap info disabled.");
                None
            }
        };
        Self {
            origin: Instant::now(),
            queue: Mutex::new(TimerQueue::new(frame_interval_ms)),
            system: Mutex::new(System::new()),
            pid,
            network: Mutex::new(NetworkTier::Unknown),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Pops the earliest wakeup that is due now.
    pub fn pop_due(&self) -> Option<Wakeup> {
        let now = self.now();
        lock(&self.queue).pop_due(now).map(|(_, wakeup)| wakeup)
    }

    /// Time until the earliest pending deadline. `Some(ZERO)` if one is already due.
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = lock(&self.queue).next_deadline()?;
        let remaining_ms = (deadline - self.now()).max(0.0);
        Some(Duration::from_secs_f64(remaining_ms / 1000.0))
    }

    /// Number of pending timers and frame requests.
    pub fn pending_count(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Sets the connection quality reported to the engine.
    pub fn set_network_tier(&self, tier: NetworkTier) {
        *lock(&self.network) = tier;
    }

    /// Input streams the engine has subscribed to.
    pub fn listeners(&self) -> Vec<(InputKind, ListenerOptions)> {
        lock(&self.listeners).clone()
    }
}

impl Default for SystemPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemPlatform")
            .field("pid", &self.pid)
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Clock for SystemPlatform {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

impl Scheduler for SystemPlatform {
    fn schedule(&self, delay_ms: f64) -> TimerHandle {
        let now = self.now();
        lock(&self.queue).schedule(now, delay_ms)
    }

    fn cancel(&self, handle: TimerHandle) {
        lock(&self.queue).cancel(handle);
    }

    fn request_frame(&self) -> FrameHandle {
        let now = self.now();
        lock(&self.queue).request_frame(now)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        lock(&self.queue).cancel_frame(handle);
    }
}

impl HeapInfoSource for SystemPlatform {
    fn query_heap_info(&self) -> Option<HeapInfo> {
        let pid = self.pid?;
        let mut system = lock(&self.system);
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.refresh_memory();
        let used = system.process(pid)?.memory();
        let total = system.total_memory();
        Some(HeapInfo {
            used,
            total,
            limit: total,
        })
    }
}

impl InputSource for SystemPlatform {
    fn add_input_listener(&self, kind: InputKind, options: ListenerOptions) -> bool {
        let mut listeners = lock(&self.listeners);
        if !listeners.iter().any(|(k, _)| *k == kind) {
            log::debug!("SystemPlatform: listening for {kind:?} input (passive: {}).", options.passive);
            listeners.push((kind, options));
        }
        true
    }

    fn remove_input_listener(&self, kind: InputKind) {
        lock(&self.listeners).retain(|(k, _)| *k != kind);
    }
}

impl PlatformServices for SystemPlatform {
    fn network_tier(&self) -> NetworkTier {
        *lock(&self.network)
    }
}
