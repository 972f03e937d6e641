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

//! Host callback registration with per-callback failure isolation.

use std::panic::{self, AssertUnwindSafe};

/// A host-registered handler. Returning an error marks the delivery as failed.
pub type Callback<T> = Box<dyn FnMut(&T) -> anyhow::Result<()> + Send>;

/// Identifies a registered callback so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// An ordered list of callbacks for one event type.
///
/// Dispatch calls every callback in registration order. A callback that
/// returns an error or panics is logged and skipped; it never prevents
/// delivery to the callbacks after it.
pub struct CallbackRegistry<T> {
    name: &'static str,
    callbacks: Vec<(CallbackId, Callback<T>)>,
    next_id: u64,
}

impl<T> CallbackRegistry<T> {
    /// Creates an empty registry. `name` only appears in log messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            callbacks: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a callback.
    pub fn register<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&T) -> anyhow::Result<()> + Send + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        log::debug!("Registered {} callback {:?}", self.name, id);
        id
    }

    /// Removes a callback. Returns `false` if the id was unknown.
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _)| *cid != id);
        self.callbacks.len() != before
    }

    /// Returns the number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns `true` if no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Delivers `event` to every callback. Returns the number of failed deliveries.
    pub fn dispatch(&mut self, event: &T) -> usize {
        let mut failures = 0;
        for (id, callback) in self.callbacks.iter_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    log::warn!("{} callback {:?} failed: {e:#}", self.name, id);
                }
                Err(_) => {
                    failures += 1;
                    log::error!("{} callback {:?} panicked", self.name, id);
                }
            }
        }
        failures
    }
}

impl<T> std::fmt::Debug for CallbackRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("name", &self.name)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
