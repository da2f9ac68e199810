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


//! Exception containment.
//!
//! Failures inside handlers, callbacks, tasks and the render callback never
//! unwind through the loop. They are packaged into an [`ExceptionContext`] and
//! handed to the scheduler's exception handler, which logs them by default.

use crate::scheduler::Scheduler;
use std::fmt::Write as _;
use std::rc::Rc;
use weft_core::Event;

/// Everything known about a contained failure.
#[derive(Debug)]
pub struct ExceptionContext {
    /// A one-line description of what failed.
    pub message: String,
    /// The underlying error, if there is one.
    pub error: Option<anyhow::Error>,
    /// The event being dispatched when the failure happened.
    pub event: Option<Event>,
    /// The label of the failing handler.
    pub handler: Option<String>,
}

impl ExceptionContext {
    /// Creates a context with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            event: None,
            handler: None,
        }
    }

    /// Attaches the underlying error.
    #[must_use]
    pub fn with_error(mut self, error: anyhow::Error) -> Self {
        self.error = Some(error);
        self
    }

    /// Attaches the event being dispatched.
    #[must_use]
    pub fn with_event(mut self, event: &Event) -> Self {
        self.event = Some(event.clone());
        self
    }

    /// Attaches the failing handler's label.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }
}

/// A custom exception handler.
pub type ExceptionHandler = Rc<dyn Fn(&Scheduler, &ExceptionContext)>;

/// Logs the failure with its event, handler and error chain, and returns.
pub fn default_exception_handler(_scheduler: &Scheduler, context: &ExceptionContext) {
    let mut report = context.message.clone();
    if let Some(event) = &context.event {
        let _ = write!(report, "\nevent: {} ({})", event.name(), event.kind());
        for (name, value) in event.fields() {
            let _ = write!(report, "\n    {name}: {:?}", value.to_raw());
        }
    }
    if let Some(handler) = &context.handler {
        let _ = write!(report, "\nhandler: {handler}");
    }
    if let Some(error) = &context.error {
        let _ = write!(report, "\nerror: {error:?}");
    }
    log::error!("{report}");
}
