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

//! # Weft Runtime
//!
//! The single-threaded event-loop scheduler. A [`Scheduler`] blocks on a native
//! event queue, marshals each event through its registry and dispatches it to
//! the registered handlers. Deferred callbacks, timers, async tasks, the frame
//! renderer and results from the worker pool all travel as synthetic events on
//! the same queue.
//!
//! Scheduler handles are `!Send`. Other threads reach the loop through a
//! [`RemoteHandle`].

#![warn(missing_docs)]

mod config;
mod error;
mod exception;
mod executor;
mod future;
mod handler;
mod registration;
mod remote;
mod renderer;
mod scheduler;
mod stats;
mod task;
mod timer;
mod unsupported;
mod widget;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use exception::{default_exception_handler, ExceptionContext, ExceptionHandler};
pub use executor::{Blocking, WorkerPool};
pub use future::{EventFuture, Sleep};
pub use handler::EventCallback;
pub use registration::{HandlerRegistration, MethodHandler, RegistrationGuard};
pub use remote::RemoteHandle;
pub use renderer::{frame_delay, RendererHandle};
pub use scheduler::{Handle, LoopState, Scheduler, SchedulerBuilder, WeakScheduler};
pub use stats::LoopStats;
pub use task::JoinHandle;
pub use timer::{TimerHandle, TimerQueue};
pub use widget::{EnableGuard, Enableable, Widget, WidgetGroup};
