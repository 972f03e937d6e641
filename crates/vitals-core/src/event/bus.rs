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

/// Manages a generic, bounded event channel.
///
/// The bus is generic over the event type so that `vitals-core` stays
/// decoupled from the concrete events defined in higher-level crates. When the
/// channel is full, new events are dropped rather than blocking the producer.
#[derive(Debug, Clone)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new bus holding at most `capacity` undelivered events.
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity.max(1));
        log::debug!("EventBus initialized with capacity {}.", capacity.max(1));
        Self { sender, receiver }
    }

    /// Attempts to publish an event. Returns `false` if it was dropped.
    pub fn publish(&self, event: T) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(flume::TrySendError::Full(_)) => {
                log::warn!("EventBus full, dropping event.");
                false
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                log::error!("Failed to send event: receiver disconnected.");
                false
            }
        }
    }

    /// Returns a clone of the sender end of the channel.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a clone of the receiver end of the channel.
    pub fn receiver(&self) -> flume::Receiver<T> {
        self.receiver.clone()
    }

    /// Drains every event currently queued.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}
