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

//! Runs a [`PerformanceEngine`] on a dedicated worker thread.
//!
//! The engine itself is single-owner. The service gives it one thread, feeds
//! it host commands over a bounded channel, delivers due timers and frames
//! from a [`SystemPlatform`], and republishes alerts, metrics and gestures on
//! an [`EventBus`] that any number of host threads can read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use vitals_core::event::EventBus;
use vitals_core::input::InputEvent;
use vitals_core::telemetry::Alert;
use vitals_core::{Clock, VitalsError, VitalsResult};
use vitals_infra::SystemPlatform;
use vitals_input::GestureEvent;

use crate::config::EngineConfig;
use crate::engine::PerformanceEngine;
use crate::snapshot::EngineSnapshot;

/// Configuration for the worker thread and its channels.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum number of queued host commands.
    /// Input submitted while the queue is full is dropped.
    pub command_buffer: usize,
    /// Maximum number of undelivered engine events.
    /// If the buffer is full, new events are dropped.
    pub event_buffer: usize,
    /// Longest the worker sleeps when no timer is due.
    pub poll_interval_ms: u64,
    /// How long [`EngineService::snapshot`] waits for the worker to reply.
    pub reply_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command_buffer: 256,
            event_buffer: 1024,
            poll_interval_ms: 50,
            reply_timeout_ms: 1000,
        }
    }
}

/// Commands accepted by the worker.
#[derive(Debug)]
pub enum EngineCommand {
    Input(InputEvent),
    /// Render start, stamped on the platform clock by the caller.
    BeginRender { at: f64 },
    EndRender { at: f64 },
    Clear,
    Snapshot(Sender<EngineSnapshot>),
    Stop,
}

/// Everything the engine reports back to the host.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Alert(Alert),
    Metrics(EngineSnapshot),
    Gesture(GestureEvent),
}

/// A running engine on its own thread.
pub struct EngineService {
    config: ServiceConfig,
    platform: Arc<SystemPlatform>,
    events: EventBus<EngineEvent>,
    command_tx: Sender<EngineCommand>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl EngineService {
    /// Starts the worker thread and a monitoring session.
    pub fn start(engine_config: EngineConfig, config: ServiceConfig) -> VitalsResult<Self> {
        let platform = Arc::new(SystemPlatform::with_frame_interval(
            engine_config.frame_budget_ms,
        ));
        let events = EventBus::bounded(config.event_buffer);
        let (command_tx, command_rx) = crossbeam_channel::bounded(config.command_buffer.max(1));
        let running = Arc::new(AtomicBool::new(true));

        let mut engine = PerformanceEngine::new(engine_config, platform.clone());
        let bus = events.clone();
        engine.on_alert(move |alert| {
            bus.publish(EngineEvent::Alert(alert.clone()));
            Ok(())
        });
        let bus = events.clone();
        engine.on_metrics_update(move |snapshot| {
            bus.publish(EngineEvent::Metrics(snapshot.clone()));
            Ok(())
        });
        let bus = events.clone();
        engine.on_gesture(move |gesture| {
            bus.publish(EngineEvent::Gesture(*gesture));
            Ok(())
        });

        let worker = Worker {
            engine,
            platform: platform.clone(),
            commands: command_rx,
            running: Arc::clone(&running),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        };
        let handle = thread::Builder::new()
            .name("vitals-engine".into())
            .spawn(move || worker.run())
            .map_err(|e| VitalsError::Spawn(e.to_string()))?;

        Ok(Self {
            config,
            platform,
            events,
            command_tx,
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The platform the engine runs on. Hosts use it to report network quality.
    pub fn platform(&self) -> &Arc<SystemPlatform> {
        &self.platform
    }

    /// A receiver for engine events. Every clone competes for the same events.
    pub fn events(&self) -> flume::Receiver<EngineEvent> {
        self.events.receiver()
    }

    /// Queues a raw input event. Returns `false` if the queue was full and the
    /// event was dropped.
    pub fn input(&self, event: InputEvent) -> VitalsResult<bool> {
        self.ensure_running()?;
        match self.command_tx.try_send(EngineCommand::Input(event)) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                log::warn!("EngineService: command queue full, dropping input.");
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => Err(VitalsError::ChannelClosed),
        }
    }

    pub fn begin_render(&self) -> VitalsResult<()> {
        self.send(EngineCommand::BeginRender {
            at: self.platform.now(),
        })
    }

    pub fn end_render(&self) -> VitalsResult<()> {
        self.send(EngineCommand::EndRender {
            at: self.platform.now(),
        })
    }

    /// Drops all collected data. The session keeps running.
    pub fn clear(&self) -> VitalsResult<()> {
        self.send(EngineCommand::Clear)
    }

    /// Asks the worker for a snapshot and waits for the reply.
    pub fn snapshot(&self) -> VitalsResult<EngineSnapshot> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.send(EngineCommand::Snapshot(reply_tx))?;
        reply_rx
            .recv_timeout(Duration::from_millis(self.config.reply_timeout_ms))
            .map_err(|_| VitalsError::ChannelClosed)
    }

    /// Sends a command, blocking while the queue is full.
    pub fn send(&self, command: EngineCommand) -> VitalsResult<()> {
        self.ensure_running()?;
        self.command_tx
            .send(command)
            .map_err(|_| VitalsError::ChannelClosed)
    }

    /// Stops the session and joins the worker. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Wakes the worker if it is waiting; a full queue is fine, it polls.
        let _ = self.command_tx.try_send(EngineCommand::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("EngineService: worker thread panicked.");
            }
        }
    }

    fn ensure_running(&self) -> VitalsResult<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(VitalsError::ServiceStopped)
        }
    }
}

impl Drop for EngineService {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for EngineService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineService")
            .field("running", &self.is_running())
            .field("config", &self.config)
            .finish()
    }
}

struct Worker {
    engine: PerformanceEngine,
    platform: Arc<SystemPlatform>,
    commands: Receiver<EngineCommand>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl Worker {
    fn run(mut self) {
        self.engine.start();
        log::info!("EngineService thread started.");

        while self.running.load(Ordering::Relaxed) {
            // 1. Deliver due timers and frames
            while let Some(wakeup) = self.platform.pop_due() {
                self.engine.handle_wakeup(wakeup);
            }

            // 2. Wait for a command or the next deadline
            let wait = self
                .platform
                .time_until_next()
                .map_or(self.poll_interval, |d| d.min(self.poll_interval));
            match self.commands.recv_timeout(wait) {
                Ok(command) => {
                    if !self.apply(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }

            // 3. Drain whatever else queued up meanwhile
            while let Ok(command) = self.commands.try_recv() {
                if !self.apply(command) {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.engine.stop();
        log::info!("EngineService thread stopped.");
    }

    /// Applies one command. Returns `false` when the worker should exit.
    fn apply(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::Input(event) => self.engine.handle_input(event),
            EngineCommand::BeginRender { at } => {
                self.engine.begin_render_at(at);
            }
            EngineCommand::EndRender { at } => {
                self.engine.end_render_at(at);
            }
            EngineCommand::Clear => self.engine.clear(),
            EngineCommand::Snapshot(reply) => {
                // The caller may have timed out and gone away.
                let _ = reply.send(self.engine.snapshot());
            }
            EngineCommand::Stop => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::input::{TouchEvent, TouchPhase};
    use vitals_core::NetworkTier;

    fn fast_config() -> EngineConfig {
        EngineConfig {
            sample_interval_ms: 20.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_service_lifecycle() {
        let mut service = EngineService::start(fast_config(), ServiceConfig::default()).unwrap();
        assert!(service.is_running());
        thread::sleep(Duration::from_millis(120));

        let snapshot = service.snapshot().unwrap();
        assert!(snapshot.running);
        assert!(snapshot.ticks >= 1);

        service.stop();
        service.stop();
        assert!(!service.is_running());
        assert_eq!(service.platform().pending_count(), 0);
        assert!(matches!(service.snapshot(), Err(VitalsError::ServiceStopped)));
        assert!(matches!(
            service.input(InputEvent::Scroll { timestamp: 0.0 }),
            Err(VitalsError::ServiceStopped)
        ));
    }

    #[test]
    fn test_alerts_are_published_as_events() {
        let service = EngineService::start(fast_config(), ServiceConfig::default()).unwrap();
        service.platform().set_network_tier(NetworkTier::Offline);
        let events = service.events();

        let alert = events
            .iter()
            .take(200)
            .find_map(|event| match event {
                EngineEvent::Alert(alert) => Some(alert),
                _ => None,
            })
            .unwrap();
        assert_eq!(alert.kind(), vitals_core::AlertKind::SlowNetwork);
    }

    #[test]
    fn test_input_reaches_the_engine() {
        let service = EngineService::start(fast_config(), ServiceConfig::default()).unwrap();
        let now = service.platform().now();
        assert!(service
            .input(InputEvent::Touch(TouchEvent::single(TouchPhase::Start, 1.0, 1.0, now)))
            .unwrap());

        let snapshot = service.snapshot().unwrap();
        assert_eq!(snapshot.touch.sample_count, 1);
    }
}
