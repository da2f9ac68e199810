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


//! Defines the error type of the scheduler.

use thiserror::Error;
use weft_core::{EventError, EventKind};

/// An error returned by the scheduler's public operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A scheduler is already live on this thread.
    #[error("a scheduler is already initialized on this thread")]
    AlreadyInitialized,

    /// The handler is not registered for the kind.
    #[error("handler '{handler}' is not registered for event kind {kind}")]
    NotRegistered {
        /// The kind the handler was expected under.
        kind: EventKind,
        /// The handler's label.
        handler: String,
    },

    /// The loop or the renderer is already running.
    #[error("the {0} is already running")]
    AlreadyRunning(&'static str),

    /// A renderer was started with a frame rate of zero.
    #[error("frame rate must be at least 1 fps")]
    InvalidFrameRate,

    /// The operation has no backing in the native event queue.
    #[error("'{operation}' is not supported by this event loop")]
    Unsupported {
        /// The name of the unsupported operation.
        operation: &'static str,
    },

    /// A dispatched handler returned an error or panicked.
    ///
    /// This is never returned from a scheduler call. It is attached as context
    /// to the error handed to the exception handler.
    #[error("handler '{handler}' failed while handling {event}")]
    HandlerExecution {
        /// The failing handler's label.
        handler: String,
        /// The schema name of the event being dispatched.
        event: &'static str,
    },

    /// The loop stopped before the awaited future finished.
    #[error("the event loop stopped before the future completed")]
    NotComplete,

    /// The producer of a result went away without producing it.
    #[error("the operation was cancelled before it completed")]
    Cancelled,

    /// The default executor was shut down.
    #[error("the default executor has been shut down")]
    ExecutorShutdown,

    /// A job running on the worker pool panicked.
    #[error("a blocking job panicked: {0}")]
    WorkerPanicked(String),

    /// A worker thread could not be spawned.
    #[error("failed to spawn a worker thread")]
    Spawn(#[from] std::io::Error),

    /// Registering or marshaling an event failed.
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
