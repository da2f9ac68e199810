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

// Weft Sandbox
// Counts scripted key presses on a 30 fps loop, then quits.

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use weft_sdk::prelude::*;

/// Keys typed by the input thread, one every `KEY_INTERVAL`.
const SCRIPT: [Keys; 5] = [Keys::H, Keys::E, Keys::L, Keys::L, Keys::O];
const KEY_INTERVAL: Duration = Duration::from_millis(150);

struct CounterApp {
    presses: Rc<Cell<u32>>,
    frames: u64,
    _keys: EnableGuard,
}

impl Application for CounterApp {
    fn new(scheduler: &Scheduler) -> Result<Self> {
        let presses = Rc::new(Cell::new(0));

        let counter = Rc::clone(&presses);
        let on_key = HandlerRegistration::typed::<KeyDown, _>(scheduler, move |_, down| {
            counter.set(counter.get() + 1);
            log::info!("Key {:?} ({} so far)", down.key, counter.get());
            Ok(())
        })
        .with_label("count_keys");
        let mut keys = EnableGuard::empty();
        keys.push(on_key.enter());

        scheduler.on::<VideoResize, _>(|s, resize| {
            log::info!("Window is {}px wide, scale factor {:.2}", resize.w, s.scale_factor());
            Ok(())
        });

        // A stand-in for the native input source.
        let remote = scheduler.remote();
        thread::Builder::new().name("sandbox-input".into()).spawn(move || {
            for key in SCRIPT {
                thread::sleep(KEY_INTERVAL);
                remote.post_event(
                    KeyDown {
                        key,
                        modifiers: ModifierKeys::EMPTY,
                        unicode: String::new(),
                    }
                    .to_event(),
                );
            }
            remote.post_event(
                VideoResize {
                    size: (1600, 1200),
                    w: 1600,
                    h: 1200,
                }
                .to_event(),
            );
            remote.call_soon_threadsafe(|s| {
                log::info!("Input script finished at t={:.3}s", s.time());
                s.call_later(Duration::from_millis(200), |s| s.post_typed(&Quit {}));
            });
        })?;

        let checksum = scheduler.run_in_executor(|| (1..=1_000_000u64).fold(0u64, |acc, n| acc.wrapping_add(n * n)));
        scheduler.spawn(async move {
            match checksum.await {
                Ok(value) => log::info!("Background checksum: {value}"),
                Err(e) => log::error!("Background job failed: {e}"),
            }
        });

        Ok(Self {
            presses,
            frames: 0,
            _keys: keys,
        })
    }

    fn render(&mut self, _scheduler: &Scheduler, surface: &mut dyn RenderSurface) {
        self.frames += 1;
        if self.frames % 30 == 0 {
            let (width, height) = surface.size();
            log::debug!(
                "Frame {} on {}x{}, {} presses",
                self.frames,
                width,
                height,
                self.presses.get()
            );
        }
    }
}

fn main() -> Result<()> {
    init_logging("info");

    let app = match std::env::args().nth(1) {
        Some(path) => App::from_config_file(path)?,
        None => App::new(),
    };
    let stats = app.run::<CounterApp>()?;
    println!("{}", stats);
    Ok(())
}
