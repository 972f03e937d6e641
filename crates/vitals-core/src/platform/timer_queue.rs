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

//! A deterministic deadline queue for timers and frame requests.
//!
//! Platform implementations keep one of these and drain it from their event
//! loop. Frame requests are aligned to the next frame boundary so that every
//! request issued within one frame window wakes up together.

use super::{FrameHandle, TimerHandle, Wakeup};

/// Frame interval of a 60 Hz display, in milliseconds.
pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

#[derive(Debug, Clone, Copy)]
struct Entry {
    deadline: f64,
    seq: u64,
    wakeup: Wakeup,
}

/// Pending timers and frame requests, ordered by `(deadline, issue order)`.
#[derive(Debug, Clone)]
pub struct TimerQueue {
    entries: Vec<Entry>,
    next_seq: u64,
    frame_interval_ms: f64,
}

impl TimerQueue {
    /// Creates an empty queue with the given frame interval.
    pub fn new(frame_interval_ms: f64) -> Self {
        let frame_interval_ms = if frame_interval_ms.is_finite() && frame_interval_ms > 0.0 {
            frame_interval_ms
        } else {
            DEFAULT_FRAME_INTERVAL_MS
        };
        Self {
            entries: Vec::new(),
            next_seq: 1,
            frame_interval_ms,
        }
    }

    /// Returns the frame interval in milliseconds.
    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    /// Arms a timer due at `now + delay_ms`. Negative delays fire immediately.
    pub fn schedule(&mut self, now: f64, delay_ms: f64) -> TimerHandle {
        let delay = if delay_ms.is_finite() {
            delay_ms.max(0.0)
        } else {
            0.0
        };
        let seq = self.bump();
        let handle = TimerHandle(seq);
        self.entries.push(Entry {
            deadline: now + delay,
            seq,
            wakeup: Wakeup::Timer(handle),
        });
        handle
    }

    /// Requests a wakeup at the first frame boundary strictly after `now`.
    pub fn request_frame(&mut self, now: f64) -> FrameHandle {
        let seq = self.bump();
        let handle = FrameHandle(seq);
        let deadline = ((now / self.frame_interval_ms).floor() + 1.0) * self.frame_interval_ms;
        self.entries.push(Entry {
            deadline,
            seq,
            wakeup: Wakeup::Frame(handle),
        });
        handle
    }

    /// Cancels a timer. Returns `true` if it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.remove(Wakeup::Timer(handle))
    }

    /// Cancels a frame request. Returns `true` if it was still pending.
    pub fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        self.remove(Wakeup::Frame(handle))
    }

    /// Returns `true` if the wakeup is still pending.
    pub fn contains(&self, wakeup: Wakeup) -> bool {
        self.entries.iter().any(|e| e.wakeup == wakeup)
    }

    /// Returns the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.deadline).reduce(f64::min)
    }

    /// Removes and returns the earliest entry due at or before `now`, with its deadline.
    pub fn pop_due(&mut self, now: f64) -> Option<(f64, Wakeup)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then_with(|| a.seq.cmp(&b.seq))
            })
            .map(|(i, _)| i)?;
        let entry = self.entries.remove(index);
        Some((entry.deadline, entry.wakeup))
    }

    /// Returns the number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn remove(&mut self, wakeup: Wakeup) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.wakeup != wakeup);
        self.entries.len() != before
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}
