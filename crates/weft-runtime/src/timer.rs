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


//! Deferred callbacks keyed by absolute deadline.

use crate::scheduler::WeakScheduler;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use weft_core::builtin::ExecuteCallback;
use weft_core::{NativeQueue, TypedEvent};

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    id: u64,
    deadline: Duration,
    seq: u64,
}

/// The pending timers of a scheduler.
///
/// Insertion is O(1) and keeps no order. Ordering is computed when timers fire:
/// overdue timers are posted by `(deadline, insertion order)`, so timers sharing
/// a deadline fire in the order they were created.
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<TimerEntry>,
    next_seq: u64,
    fired: u64,
}

impl TimerQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the timer `id` with the given deadline.
    pub fn append(&mut self, id: u64, deadline: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(TimerEntry { id, deadline, seq });
    }

    /// Removes the timer `id`. Returns `false` if it already fired or was
    /// already cancelled.
    pub fn cancel(&mut self, id: u64) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                self.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Posts every overdue timer, then returns the time until the next deadline.
    ///
    /// ## Arguments
    ///
    /// * `now` - The current instant.
    /// * `queue` - Where the synthetic execute events are posted.
    ///
    /// ## Returns
    ///
    /// The delay until the soonest remaining deadline, or `None` if no timer is
    /// left.
    pub fn soonest(&mut self, now: Duration, queue: &dyn NativeQueue) -> Option<Duration> {
        let (mut overdue, pending): (Vec<_>, Vec<_>) =
            self.entries.iter().copied().partition(|entry| entry.deadline <= now);
        if !overdue.is_empty() {
            overdue.sort_by_key(|entry| (entry.deadline, entry.seq));
            for entry in &overdue {
                log::trace!("Timer {} fired at {:?}.", entry.id, now);
                queue.post_event(ExecuteCallback { handle: entry.id as i64 }.to_event().to_native());
            }
            self.fired += overdue.len() as u64;
            self.entries = pending;
        }
        self.entries
            .iter()
            .map(|entry| entry.deadline - now)
            .min()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of timers fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

/// A handle to a timer created by [`Scheduler::call_at`](crate::Scheduler::call_at)
/// or [`Scheduler::call_later`](crate::Scheduler::call_later).
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    deadline: Duration,
    cancelled: Rc<Cell<bool>>,
    scheduler: WeakScheduler,
}

impl TimerHandle {
    pub(crate) fn new(id: u64, deadline: Duration, scheduler: WeakScheduler) -> Self {
        Self {
            id,
            deadline,
            cancelled: Rc::new(Cell::new(false)),
            scheduler,
        }
    }

    /// The instant the timer fires at.
    pub fn when(&self) -> Duration {
        self.deadline
    }

    /// Returns `true` once [`TimerHandle::cancel`] has been called.
    pub fn cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Cancels the timer.
    ///
    /// Idempotent. Once the timer's deadline has passed and its callback has
    /// been posted, cancelling has no effect and the callback still runs.
    pub fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.cancel_timer(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weft_core::{Clock, EventKind};
    use weft_infra::{ManualClock, ScriptedQueue};

    fn queue() -> (Arc<ManualClock>, ScriptedQueue) {
        let clock = Arc::new(ManualClock::new());
        let queue = ScriptedQueue::new(Arc::clone(&clock));
        (clock, queue)
    }

    fn posted_handles(queue: &ScriptedQueue) -> Vec<i64> {
        std::iter::from_fn(|| queue.wait_for_event(Some(Duration::ZERO)))
            .map(|event| {
                assert_eq!(event.kind, EventKind::EXECUTE_CALLBACK);
                event.get("handle").and_then(|v| v.as_int()).unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_queue_has_no_deadline() {
        let (_, native) = queue();
        assert_eq!(TimerQueue::new().soonest(Duration::ZERO, &native), None);
    }

    #[test]
    fn soonest_fires_overdue_timers_once() {
        let (clock, native) = queue();
        let mut timers = TimerQueue::new();
        timers.append(1, Duration::from_secs(1));
        timers.append(2, Duration::from_secs(2));
        timers.append(5, Duration::from_secs(5));

        assert_eq!(timers.soonest(clock.now(), &native), Some(Duration::from_secs(1)));
        assert_eq!(native.pending(), 0);

        clock.advance(Duration::from_secs(1));
        assert_eq!(timers.soonest(clock.now(), &native), Some(Duration::from_secs(1)));
        assert_eq!(posted_handles(&native), [1]);

        assert_eq!(timers.soonest(clock.now(), &native), Some(Duration::from_secs(1)));
        assert_eq!(native.pending(), 0, "a fired timer must not fire again");
        assert_eq!(timers.fired(), 1);
        assert_eq!(timers.len(), 2);
    }

    #[test]
    fn equal_deadlines_fire_in_insertion_order() {
        let (clock, native) = queue();
        let mut timers = TimerQueue::new();
        for id in [30, 10, 20] {
            timers.append(id, Duration::from_millis(5));
        }
        timers.append(99, Duration::from_millis(1));
        clock.advance(Duration::from_millis(5));
        assert_eq!(timers.soonest(clock.now(), &native), None);
        assert_eq!(posted_handles(&native), [99, 30, 10, 20]);
    }

    #[test]
    fn cancel_is_idempotent() {
        let (clock, native) = queue();
        let mut timers = TimerQueue::new();
        timers.append(7, Duration::from_secs(1));
        assert!(timers.cancel(7));
        assert!(!timers.cancel(7));
        clock.advance(Duration::from_secs(2));
        assert_eq!(timers.soonest(clock.now(), &native), None);
        assert_eq!(native.pending(), 0);
        assert!(timers.is_empty());
    }
}
