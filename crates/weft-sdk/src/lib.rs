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

//! The public-facing SDK for weft.
//!
//! [`App`] wires a scheduler to the default infrastructure (a channel-backed
//! native queue, the system clock and a headless surface) and runs an
//! [`Application`] on it.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use weft_core::builtin::Quit;
use weft_core::RenderSurface;
use weft_infra::{ChannelQueue, HeadlessSurface, SystemClock};
use weft_runtime::{LoopStats, Scheduler, SchedulerConfig};

pub mod prelude {
    pub use crate::{init_logging, App, Application};
    pub use weft_core::builtin::*;
    pub use weft_core::keyboard::{Keys, ModifierKeys};
    pub use weft_core::mouse::MouseButton;
    pub use weft_core::{Event, EventKind, EventSchema, NativeEvent, RenderSurface, TypedEvent, Value};
    pub use weft_runtime::{
        EnableGuard, Enableable, EventCallback, HandlerRegistration, LoopStats, MethodHandler,
        RemoteHandle, Scheduler, SchedulerConfig, SchedulerError, TimerHandle, Widget, WidgetGroup,
    };
}

/// The user's application.
pub trait Application: Sized + 'static {
    /// Called once, before the loop starts. Register handlers, timers and
    /// tasks here.
    fn new(scheduler: &Scheduler) -> Result<Self>;

    /// Called once per frame.
    fn render(&mut self, scheduler: &Scheduler, surface: &mut dyn RenderSurface);

    /// Frames per second requested from the renderer.
    fn frame_rate(&self) -> u32 {
        30
    }
}

/// Runs an [`Application`] on the default infrastructure.
pub struct App {
    config: SchedulerConfig,
    surface: HeadlessSurface,
}

impl App {
    /// Creates an app with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Creates an app from a configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        let (width, height) = config.unscaled_size;
        Self {
            surface: HeadlessSurface::new(width, height),
            config,
        }
    }

    /// Creates an app from a JSON configuration file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = SchedulerConfig::load(path)?;
        Ok(Self::with_config(config))
    }

    /// The surface frames are presented on. Clones share the frame counter.
    pub fn surface(&self) -> HeadlessSurface {
        self.surface.clone()
    }

    /// Builds the scheduler, lets `A` set itself up, and runs the loop until a
    /// [`Quit`] event arrives or something calls [`Scheduler::stop`].
    pub fn run<A: Application>(self) -> Result<LoopStats> {
        log::info!("Starting '{}'...", self.config.title);
        let scheduler = Scheduler::builder(Arc::new(ChannelQueue::new()), Arc::new(SystemClock::new()))
            .config(self.config)
            .surface(self.surface)
            .build()
            .context("failed to create the scheduler")?;

        scheduler.on::<Quit, _>(|s, _| {
            log::info!("Quit requested.");
            s.stop();
            Ok(())
        });

        let app = A::new(&scheduler).context("application setup failed")?;
        let fps = app.frame_rate();
        let app = Rc::new(RefCell::new(app));
        let frame = Rc::clone(&app);
        scheduler.start_renderer(fps, move |s, surface| frame.borrow_mut().render(s, surface))?;

        scheduler.run()?;
        let stats = scheduler.stats();
        log::info!("Application finished. {stats}");
        Ok(stats)
    }
}

/// Installs `env_logger` with `default_filter`, overridable through `RUST_LOG`.
/// Does nothing if a logger is already installed.
pub fn init_logging(default_filter: &str) {
    use env_logger::{Builder, Env};

    if Builder::from_env(Env::default().default_filter_or(default_filter))
        .try_init()
        .is_err()
    {
        log::debug!("A logger is already installed.");
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
