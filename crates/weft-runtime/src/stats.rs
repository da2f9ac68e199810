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


//! Loop statistics.

use serde::Serialize;
use std::cell::Cell;

/// A snapshot of what the loop has done since it was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    /// Calls to `run_one_iteration`.
    pub iterations: u64,
    /// Events that reached dispatch, including synthetic ones.
    pub events_dispatched: u64,
    /// Handler invocations that returned an error or panicked.
    pub handler_failures: u64,
    /// Immediate, timer and cross-thread callbacks executed.
    pub callbacks_run: u64,
    /// Timers whose deadline passed and whose callback was posted.
    pub timers_fired: u64,
    /// Task polls.
    pub tasks_polled: u64,
    /// Frames presented by the renderer.
    pub frames: u64,
}

#[derive(Debug, Default)]
pub(crate) struct LoopCounters {
    pub(crate) iterations: Cell<u64>,
    pub(crate) events_dispatched: Cell<u64>,
    pub(crate) handler_failures: Cell<u64>,
    pub(crate) callbacks_run: Cell<u64>,
    pub(crate) tasks_polled: Cell<u64>,
    pub(crate) frames: Cell<u64>,
}

pub(crate) fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

impl LoopCounters {
    /// Timers are counted by the timer queue itself.
    pub(crate) fn snapshot(&self, timers_fired: u64) -> LoopStats {
        LoopStats {
            iterations: self.iterations.get(),
            events_dispatched: self.events_dispatched.get(),
            handler_failures: self.handler_failures.get(),
            callbacks_run: self.callbacks_run.get(),
            timers_fired,
            tasks_polled: self.tasks_polled.get(),
            frames: self.frames.get(),
        }
    }
}

impl std::fmt::Display for LoopStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} iterations, {} events ({} handler failures), {} callbacks, {} timers, {} task polls, {} frames",
            self.iterations,
            self.events_dispatched,
            self.handler_failures,
            self.callbacks_run,
            self.timers_fired,
            self.tasks_polled,
            self.frames
        )
    }
}
