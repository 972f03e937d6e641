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

//! Per-frame coalescing of high-frequency updates.
//!
//! The first update submitted in a frame window requests a frame callback.
//! Later updates in the same window are merged into the pending one. When the
//! frame callback arrives the merged update is handed back exactly once.

use vitals_core::{FrameHandle, Scheduler};

/// An update that can absorb a newer update of the same type.
pub trait Coalesce {
    /// Folds `newer` into `self`.
    fn merge(&mut self, newer: Self);
}

/// Holds at most one pending update and the frame request that will flush it.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    pending: Option<T>,
    frame: Option<FrameHandle>,
    submitted: u64,
    flushed: u64,
}

impl<T: Coalesce> FrameScheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            frame: None,
            submitted: 0,
            flushed: 0,
        }
    }

    /// Queues an update. Returns `true` if this call requested a new frame.
    pub fn submit<S>(&mut self, update: T, scheduler: &S) -> bool
    where
        S: Scheduler + ?Sized,
    {
        self.submitted += 1;
        match self.pending.as_mut() {
            Some(pending) => {
                pending.merge(update);
                false
            }
            None => {
                self.pending = Some(update);
                if self.frame.is_none() {
                    self.frame = Some(scheduler.request_frame());
                }
                true
            }
        }
    }

    /// Handles a frame callback. Returns the merged update if `handle` is ours.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<T> {
        if self.frame != Some(handle) {
            return None;
        }
        self.frame = None;
        let update = self.pending.take()?;
        self.flushed += 1;
        Some(update)
    }

    /// Drops the pending update and cancels its frame request. Idempotent.
    pub fn cancel<S>(&mut self, scheduler: &S)
    where
        S: Scheduler + ?Sized,
    {
        if let Some(handle) = self.frame.take() {
            scheduler.cancel_frame(handle);
        }
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns `(submitted, flushed)` update counts.
    pub fn counts(&self) -> (u64, u64) {
        (self.submitted, self.flushed)
    }
}

impl<T: Coalesce> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
