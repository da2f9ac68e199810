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


use crate::clock::ManualClock;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use weft_core::{EventError, EventKind, KindAllocator, NativeEvent, NativeQueue};

/// Real time an infinite wait on an empty scripted queue blocks for before
/// giving up. Only worker threads can still post at that point.
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// A deterministic native queue driven by virtual time.
///
/// Pre-loaded and posted events come out in FIFO order. When the queue is
/// empty, a wait with a timeout advances the shared [`ManualClock`] by that
/// timeout and returns `None` immediately, so timers fire without any real
/// sleeping. Every timeout the queue is asked to wait for is recorded.
#[derive(Debug)]
pub struct ScriptedQueue {
    events: Mutex<VecDeque<NativeEvent>>,
    ready: Condvar,
    waits: Mutex<Vec<Option<Duration>>>,
    clock: Arc<ManualClock>,
}

impl ScriptedQueue {
    /// Creates an empty queue driving `clock`.
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            waits: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Creates a queue pre-loaded with `events`.
    pub fn with_events(clock: Arc<ManualClock>, events: impl IntoIterator<Item = NativeEvent>) -> Self {
        let queue = Self::new(clock);
        lock(&queue.events).extend(events);
        queue
    }

    /// Returns the clock this queue advances.
    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    /// Returns every timeout passed to [`NativeQueue::wait_for_event`], in order.
    pub fn waits(&self) -> Vec<Option<Duration>> {
        lock(&self.waits).clone()
    }

    /// Returns the number of queued events.
    pub fn pending(&self) -> usize {
        lock(&self.events).len()
    }

    /// Returns the kinds of the queued events, front first.
    pub fn pending_kinds(&self) -> Vec<EventKind> {
        lock(&self.events).iter().map(|e| e.kind).collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NativeQueue for ScriptedQueue {
    fn wait_for_event(&self, timeout: Option<Duration>) -> Option<NativeEvent> {
        lock(&self.waits).push(timeout);
        let mut events = lock(&self.events);
        if let Some(event) = events.pop_front() {
            return Some(event);
        }
        match timeout {
            Some(timeout) => {
                drop(events);
                self.clock.advance(timeout);
                None
            }
            None => {
                let (mut events, _) = self
                    .ready
                    .wait_timeout_while(events, IDLE_WAIT, |events| events.is_empty())
                    .unwrap_or_else(PoisonError::into_inner);
                events.pop_front()
            }
        }
    }

    fn post_event(&self, event: NativeEvent) {
        lock(&self.events).push_back(event);
        self.ready.notify_one();
    }

    fn allocate_kind(&self) -> Result<EventKind, EventError> {
        KindAllocator::global().allocate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::Clock;

    #[test]
    fn preloaded_events_come_first() {
        let clock = Arc::new(ManualClock::new());
        let queue = ScriptedQueue::with_events(
            Arc::clone(&clock),
            [NativeEvent::new(EventKind::KEY_DOWN)],
        );
        queue.post_event(NativeEvent::new(EventKind::KEY_UP));
        assert_eq!(queue.pending_kinds(), [EventKind::KEY_DOWN, EventKind::KEY_UP]);
        assert_eq!(queue.wait_for_event(None).map(|e| e.kind), Some(EventKind::KEY_DOWN));
        assert_eq!(queue.wait_for_event(None).map(|e| e.kind), Some(EventKind::KEY_UP));
        assert_eq!(clock.now(), Duration::ZERO, "no virtual time passes while events are queued");
    }

    #[test]
    fn empty_timed_wait_advances_virtual_time() {
        let clock = Arc::new(ManualClock::new());
        let queue = ScriptedQueue::new(Arc::clone(&clock));
        assert!(queue.wait_for_event(Some(Duration::from_millis(40))).is_none());
        assert!(queue.wait_for_event(Some(Duration::from_millis(2))).is_none());
        assert_eq!(clock.now(), Duration::from_millis(42));
        assert_eq!(
            queue.waits(),
            [Some(Duration::from_millis(40)), Some(Duration::from_millis(2))]
        );
    }

    #[test]
    fn empty_infinite_wait_gives_up() {
        let queue = ScriptedQueue::new(Arc::new(ManualClock::new()));
        assert!(queue.wait_for_event(None).is_none());
        assert_eq!(queue.waits(), [None]);
    }
}
