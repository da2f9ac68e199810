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


//! Futures resolved by the loop: timed sleeps and awaited events.

use crate::error::SchedulerError;
use crate::handler::EventCallback;
use crate::scheduler::WeakScheduler;
use crate::timer::TimerHandle;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use tokio::sync::oneshot;
use weft_core::{Event, EventKind};

#[derive(Default)]
pub(crate) struct SleepState {
    fired: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl SleepState {
    pub(crate) fn fire(&self) {
        self.fired.set(true);
        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// A future that completes once a deadline has passed.
///
/// Created by [`Scheduler::sleep`](crate::Scheduler::sleep). Dropping it
/// cancels the underlying timer.
pub struct Sleep {
    state: Rc<SleepState>,
    timer: TimerHandle,
}

impl Sleep {
    pub(crate) fn new(state: Rc<SleepState>, timer: TimerHandle) -> Self {
        Self { state, timer }
    }

    /// The instant this sleep ends at.
    pub fn deadline(&self) -> std::time::Duration {
        self.timer.when()
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.state.fired.get() {
            return Poll::Ready(());
        }
        *self.state.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if !self.state.fired.get() {
            self.timer.cancel();
        }
    }
}

/// A future resolving to the next event of one kind.
///
/// Created by [`Scheduler::await_event`](crate::Scheduler::await_event). The
/// one-shot handler behind it unregisters itself when it fires, or when this
/// future is dropped first.
pub struct EventFuture {
    kind: EventKind,
    receiver: oneshot::Receiver<Event>,
    hook: Rc<RefCell<Option<EventCallback>>>,
    scheduler: WeakScheduler,
}

impl EventFuture {
    pub(crate) fn new(
        kind: EventKind,
        receiver: oneshot::Receiver<Event>,
        hook: Rc<RefCell<Option<EventCallback>>>,
        scheduler: WeakScheduler,
    ) -> Self {
        Self {
            kind,
            receiver,
            hook,
            scheduler,
        }
    }

    /// The kind being awaited.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Future for EventFuture {
    type Output = Result<Event, SchedulerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| SchedulerError::Cancelled))
    }
}

impl Drop for EventFuture {
    fn drop(&mut self) {
        let hook = self.hook.borrow_mut().take();
        if let (Some(hook), Some(scheduler)) = (hook, self.scheduler.upgrade()) {
            log::trace!("Dropping unresolved wait for {}.", self.kind);
            let _ = scheduler.unregister_handler(self.kind, &hook);
        }
    }
}
