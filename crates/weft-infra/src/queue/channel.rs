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


use std::time::{Duration, Instant};
use weft_core::{EventError, EventKind, KindAllocator, NativeEvent, NativeQueue};

/// A blocking native queue over an unbounded `flume` channel.
///
/// The queue keeps both ends of the channel, so waiting never observes a
/// disconnect. Other threads post either through a shared reference to the
/// queue or through a [`ChannelQueue::sender`].
#[derive(Debug)]
pub struct ChannelQueue {
    sender: flume::Sender<NativeEvent>,
    receiver: flume::Receiver<NativeEvent>,
}

impl ChannelQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::info!("Native event channel initialized.");
        Self { sender, receiver }
    }

    /// Returns a clone of the sending end of the channel.
    pub fn sender(&self) -> flume::Sender<NativeEvent> {
        self.sender.clone()
    }

    /// Returns the number of queued events.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no event is queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for ChannelQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeQueue for ChannelQueue {
    fn wait_for_event(&self, timeout: Option<Duration>) -> Option<NativeEvent> {
        match timeout {
            Some(timeout) => match Instant::now().checked_add(timeout) {
                Some(deadline) => self.receiver.recv_deadline(deadline).ok(),
                None => self.receiver.recv().ok(),
            },
            None => self.receiver.recv().ok(),
        }
    }

    fn post_event(&self, event: NativeEvent) {
        log::trace!("Posting native event {}.", event.kind);
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to post event: {e}. Receiver likely disconnected.");
        }
    }

    fn allocate_kind(&self) -> Result<EventKind, EventError> {
        KindAllocator::global().allocate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn events_come_out_in_fifo_order() {
        let queue = ChannelQueue::new();
        for i in 0..3 {
            queue.post_event(NativeEvent::new(EventKind::user(i)));
        }
        assert_eq!(queue.len(), 3);
        for i in 0..3 {
            let event = queue.wait_for_event(Some(Duration::ZERO)).expect("event queued");
            assert_eq!(event.kind, EventKind::user(i));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn wait_times_out_when_empty() {
        let queue = ChannelQueue::new();
        let start = Instant::now();
        assert!(queue.wait_for_event(Some(Duration::from_millis(20))).is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn unbounded_timeouts_still_return_posted_events() {
        let queue = ChannelQueue::new();
        queue.post_event(NativeEvent::new(EventKind::QUIT));
        let event = queue.wait_for_event(Some(Duration::MAX));
        assert_eq!(event.map(|e| e.kind), Some(EventKind::QUIT));
    }

    #[test]
    fn posting_from_another_thread_wakes_an_infinite_wait() {
        let queue = Arc::new(ChannelQueue::new());
        let poster = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            poster.post_event(NativeEvent::new(EventKind::QUIT));
        });
        let event = queue.wait_for_event(None);
        handle.join().unwrap();
        assert_eq!(event.map(|e| e.kind), Some(EventKind::QUIT));
    }

    #[test]
    fn sender_feeds_the_same_queue() {
        let queue = ChannelQueue::new();
        queue.sender().send(NativeEvent::new(EventKind::KEY_UP)).unwrap();
        assert_eq!(
            queue.wait_for_event(Some(Duration::ZERO)).map(|e| e.kind),
            Some(EventKind::KEY_UP)
        );
    }

    #[test]
    fn allocated_kinds_are_dynamic() {
        let queue = ChannelQueue::new();
        let kind = queue.allocate_kind().unwrap();
        assert!(kind.raw() >= EventKind::DYNAMIC_BASE);
    }
}
