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


//! Cooperative tasks.
//!
//! A task is a `!Send` future owned by the loop. Its waker does not poll
//! anything itself: it posts a `TASK_WAKE` event carrying the task id, so task
//! progress is ordered with every other event in the native queue.

use crate::error::SchedulerError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake};
use tokio::sync::oneshot;
use weft_core::builtin::TaskWake;
use weft_core::{NativeQueue, TypedEvent};

pub(crate) type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

/// The tasks that are waiting to be polled again.
#[derive(Default)]
pub(crate) struct TaskSet {
    tasks: HashMap<u64, LocalFuture>,
}

impl TaskSet {
    pub(crate) fn insert(&mut self, id: u64, future: LocalFuture) {
        self.tasks.insert(id, future);
    }

    /// Takes a task out for polling. A task being polled is not in the set.
    pub(crate) fn take(&mut self, id: u64) -> Option<LocalFuture> {
        self.tasks.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }
}

/// Wakes a task by posting a `TASK_WAKE` event.
pub(crate) struct TaskWaker {
    pub(crate) id: u64,
    pub(crate) queue: Arc<dyn NativeQueue>,
}

impl TaskWaker {
    pub(crate) fn post(queue: &dyn NativeQueue, id: u64) {
        queue.post_event(TaskWake { task: id as i64 }.to_event().to_native());
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        log::trace!("Waking task {}.", self.id);
        Self::post(&*self.queue, self.id);
    }
}

/// The output of a task started with [`Scheduler::spawn`](crate::Scheduler::spawn).
///
/// Resolves to `Err(Cancelled)` if the task was dropped before finishing, which
/// happens when it panics.
#[derive(Debug)]
pub struct JoinHandle<T> {
    id: u64,
    receiver: oneshot::Receiver<T>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(id: u64, receiver: oneshot::Receiver<T>) -> Self {
        Self { id, receiver }
    }

    /// The id of the task.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, SchedulerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| SchedulerError::Cancelled))
    }
}
