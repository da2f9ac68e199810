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


//! Handing work to the loop from other threads.

use crate::scheduler::Scheduler;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use weft_core::builtin::RemoteCallback;
use weft_core::{AnyEvent, NativeQueue, TypedEvent};

type RemoteFn = Box<dyn FnOnce(&Scheduler) + Send>;

/// Callbacks waiting for the loop thread to pick them up.
#[derive(Default)]
pub(crate) struct RemoteInbox {
    next: AtomicU64,
    pending: Mutex<HashMap<u64, RemoteFn>>,
}

impl RemoteInbox {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, RemoteFn>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn park(&self, callback: RemoteFn) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, callback);
        id
    }

    pub(crate) fn take(&self, id: u64) -> Option<RemoteFn> {
        self.lock().remove(&id)
    }
}

/// A thread-safe handle to a scheduler.
///
/// Obtained from [`Scheduler::remote`]. It can post events and schedule
/// callbacks from any thread; the callbacks themselves always run on the loop
/// thread.
#[derive(Clone)]
pub struct RemoteHandle {
    queue: Arc<dyn NativeQueue>,
    inbox: Arc<RemoteInbox>,
}

impl RemoteHandle {
    pub(crate) fn new(queue: Arc<dyn NativeQueue>, inbox: Arc<RemoteInbox>) -> Self {
        Self { queue, inbox }
    }

    /// Schedules `callback` to run on the loop thread, after every event
    /// already queued.
    pub fn call_soon_threadsafe<F>(&self, callback: F)
    where
        F: FnOnce(&Scheduler) + Send + 'static,
    {
        let id = self.inbox.park(Box::new(callback));
        self.queue
            .post_event(RemoteCallback { handle: id as i64 }.to_event().to_native());
    }

    /// Posts an event to the native queue.
    pub fn post_event(&self, event: impl Into<AnyEvent>) {
        self.queue.post_event(event.into().into_native());
    }
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn remote_handle_crosses_threads() {
        assert_send_sync::<RemoteHandle>();
    }

    #[test]
    fn parked_callbacks_are_taken_once() {
        let inbox = RemoteInbox::default();
        let id = inbox.park(Box::new(|_| {}));
        assert!(inbox.take(id).is_some());
        assert!(inbox.take(id).is_none());
    }
}
