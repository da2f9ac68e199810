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


//! The fixed-rate renderer task.

use crate::error::{panic_message, SchedulerError};
use crate::exception::ExceptionContext;
use crate::scheduler::{Scheduler, WeakScheduler};
use crate::stats::bump;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;
use weft_core::step::{RunningAverage, Step};
use weft_core::RenderSurface;

/// Returns how long to wait before the next frame.
///
/// This is the frame budget `1 / fps` minus the time the frame took, floored
/// at zero: a frame that overruns its budget is followed immediately by the
/// next one.
pub fn frame_delay(fps: u32, elapsed: Duration) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1))).saturating_sub(elapsed)
}

#[derive(Debug)]
struct RendererState {
    running: Cell<bool>,
    fps: u32,
    frames: Cell<u64>,
    frame_time: RefCell<RunningAverage>,
}

/// Controls a renderer started with [`Scheduler::start_renderer`].
#[derive(Debug, Clone)]
pub struct RendererHandle {
    state: Rc<RendererState>,
}

impl RendererHandle {
    /// Stops the renderer after the frame in flight.
    pub fn stop(&self) {
        if self.state.running.replace(false) {
            log::info!(
                "Renderer stopped after {} frames ({:?} per frame).",
                self.state.frames.get(),
                self.mean_frame_time().unwrap_or_default()
            );
        }
    }

    /// Returns `true` until [`RendererHandle::stop`] is called.
    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    /// The target frame rate.
    pub fn fps(&self) -> u32 {
        self.state.fps
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.state.frames.get()
    }

    /// Mean time spent drawing and presenting a frame.
    pub fn mean_frame_time(&self) -> Option<Duration> {
        self.state.frame_time.borrow().mean().map(Duration::from_secs_f64)
    }
}

impl Scheduler {
    /// Starts calling `render` at `fps` frames per second.
    ///
    /// Each frame calls `render`, presents the surface, then sleeps for
    /// [`frame_delay`] so that the cadence accounts for the time spent
    /// rendering. A panic in `render` is reported to the exception handler and
    /// the next frame proceeds as usual.
    ///
    /// ## Errors
    ///
    /// [`SchedulerError::InvalidFrameRate`] if `fps` is zero, and
    /// [`SchedulerError::AlreadyRunning`] if another renderer is running.
    pub fn start_renderer<F>(&self, fps: u32, render: F) -> Result<RendererHandle, SchedulerError>
    where
        F: FnMut(&Scheduler, &mut dyn RenderSurface) + 'static,
    {
        if fps == 0 {
            return Err(SchedulerError::InvalidFrameRate);
        }
        let mut current = self.inner.renderer.borrow_mut();
        if current.as_ref().is_some_and(RendererHandle::is_running) {
            return Err(SchedulerError::AlreadyRunning("renderer"));
        }
        let state = Rc::new(RendererState {
            running: Cell::new(true),
            fps,
            frames: Cell::new(0),
            frame_time: RefCell::new(RunningAverage::new()),
        });
        let handle = RendererHandle {
            state: Rc::clone(&state),
        };
        *current = Some(handle.clone());
        drop(current);

        log::info!("Renderer started at {fps} fps.");
        drop(self.spawn(render_loop(self.downgrade(), state, render)));
        Ok(handle)
    }

    /// Returns the current renderer, running or not.
    pub fn renderer(&self) -> Option<RendererHandle> {
        self.inner.renderer.borrow().clone()
    }
}

async fn render_loop<F>(scheduler: WeakScheduler, state: Rc<RendererState>, mut render: F)
where
    F: FnMut(&Scheduler, &mut dyn RenderSurface) + 'static,
{
    while state.running.get() {
        let Some(s) = scheduler.upgrade() else {
            break;
        };
        let start = s.now();
        let drawn = s.with_surface(|surface| panic::catch_unwind(AssertUnwindSafe(|| render(&s, surface))));
        match drawn {
            Some(Ok(())) => {}
            Some(Err(payload)) => s.call_exception_handler(
                &ExceptionContext::new("Render callback panicked")
                    .with_error(anyhow::anyhow!(panic_message(&*payload)))
                    .with_handler(std::any::type_name::<F>()),
            ),
            None => log::warn!("Render surface is busy; skipping the draw call."),
        }
        s.with_surface(|surface| surface.present_frame());
        state.frames.set(state.frames.get() + 1);
        bump(&s.inner.counters.frames);
        let elapsed = s.now().saturating_sub(start);
        state.frame_time.borrow_mut().step(elapsed.as_secs_f64());

        let delay = frame_delay(state.fps, elapsed);
        log::trace!("Frame {} took {elapsed:?}, next in {delay:?}.", state.frames.get());
        let pause = s.sleep(delay);
        drop(s);
        pause.await;
    }
}
