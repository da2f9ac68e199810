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

use crate::error::EventError;
use crate::event::{EventKind, NativeEvent};
use std::time::Duration;

/// A blocking, single-consumer native event queue.
///
/// Only the scheduler's thread waits on the queue, but any thread may post to
/// it. Implementations must therefore make [`NativeQueue::post_event`]
/// thread-safe and wake a pending [`NativeQueue::wait_for_event`].
pub trait NativeQueue: Send + Sync {
    /// Blocks until an event is available or the timeout elapses.
    ///
    /// ## Arguments
    ///
    /// * `timeout` - How long to wait. `None` waits indefinitely.
    ///
    /// ## Returns
    ///
    /// The next event in FIFO order, or `None` on timeout.
    fn wait_for_event(&self, timeout: Option<Duration>) -> Option<NativeEvent>;

    /// Enqueues an event behind every event already queued.
    fn post_event(&self, event: NativeEvent);

    /// Returns a process-unique kind for a dynamically declared event.
    fn allocate_kind(&self) -> Result<EventKind, EventError>;
}
