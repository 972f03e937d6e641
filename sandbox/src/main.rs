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

use std::thread;
use std::time::Duration;

use anyhow::Result;
use vitals_sdk::prelude::*;
use vitals_sdk::ServiceConfig;

/// Feeds the engine a scripted session: a scroll fling, a swipe, a long
/// press and a few slow renders.
struct SyntheticHost<'a> {
    service: &'a EngineService,
}

impl SyntheticHost<'_> {
    fn now(&self) -> f64 {
        self.service.platform().now()
    }

    fn touch(&self, phase: TouchPhase, x: f64, y: f64) -> Result<()> {
        let event = TouchEvent::single(phase, x, y, self.now());
        self.service.input(InputEvent::Touch(event))?;
        Ok(())
    }

    fn scroll_fling(&self, frames: u32, frame_ms: u64) -> Result<()> {
        for _ in 0..frames {
            self.service.input(InputEvent::Scroll {
                timestamp: self.now(),
            })?;
            thread::sleep(Duration::from_millis(frame_ms));
        }
        Ok(())
    }

    fn swipe(&self) -> Result<()> {
        self.touch(TouchPhase::Start, 20.0, 300.0)?;
        for step in 1..=5 {
            thread::sleep(Duration::from_millis(10));
            self.touch(TouchPhase::Move, 20.0 + step as f64 * 40.0, 300.0)?;
        }
        self.touch(TouchPhase::End, 220.0, 300.0)
    }

    fn long_press(&self) -> Result<()> {
        self.touch(TouchPhase::Start, 150.0, 150.0)?;
        thread::sleep(Duration::from_millis(600));
        self.touch(TouchPhase::End, 150.0, 150.0)
    }

    fn render(&self, work_ms: u64) -> Result<()> {
        self.service.begin_render()?;
        thread::sleep(Duration::from_millis(work_ms));
        self.service.end_render()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = EngineConfig {
        sample_interval_ms: 250.0,
        ..Default::default()
    };
    let mut service = EngineService::start(config, ServiceConfig::default())?;
    let events = service.events();
    let host = SyntheticHost { service: &service };

    host.scroll_fling(30, 16)?;
    host.scroll_fling(10, 45)?;
    host.swipe()?;
    host.long_press()?;
    for work_ms in [5, 12, 30, 40, 8, 25] {
        host.render(work_ms)?;
    }
    service.platform().set_network_tier(NetworkTier::Slow);
    thread::sleep(Duration::from_millis(600));

    let snapshot = service.snapshot()?;
    service.stop();

    let mut metric_updates = 0;
    for event in events.try_iter() {
        match event {
            EngineEvent::Alert(alert) => log::info!("Alert: {alert}"),
            EngineEvent::Gesture(gesture) => log::info!("Gesture: {}", serde_json::to_string(&gesture)?),
            EngineEvent::Metrics(_) => metric_updates += 1,
        }
    }
    log::info!("Received {metric_updates} metrics update(s).");
    log::info!(
        "Health: {:.0}/100 ({:?})",
        snapshot.score.total,
        snapshot.grade
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
