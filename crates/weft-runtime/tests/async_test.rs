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

use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use weft_core::builtin::{KeyDown, Quit};
use weft_core::keyboard::{Keys, ModifierKeys};
use weft_core::{Clock, EventKind, TypedEvent};
use weft_infra::{ChannelQueue, ManualClock, ScriptedQueue, SystemClock};
use weft_runtime::{LoopState, Scheduler, SchedulerConfig, SchedulerError, WorkerPool};

fn scripted() -> (Arc<ManualClock>, Arc<ScriptedQueue>, Scheduler) {
    let clock = Arc::new(ManualClock::new());
    let queue = Arc::new(ScriptedQueue::new(Arc::clone(&clock)));
    let scheduler = Scheduler::builder(queue.clone(), clock.clone()).build().unwrap();
    (clock, queue, scheduler)
}

fn threaded(workers: usize) -> Scheduler {
    let config = SchedulerConfig {
        executor_workers: workers,
        ..SchedulerConfig::default()
    };
    Scheduler::builder(Arc::new(ChannelQueue::new()), Arc::new(SystemClock::new()))
        .config(config)
        .build()
        .unwrap()
}

#[test]
fn test_await_event_resolves_once_and_cleans_up() {
    // --- ARRANGE ---
    let (_, queue, scheduler) = scripted();
    let resolved = Rc::new(Cell::new(0));
    let pending = scheduler.await_event(EventKind::QUIT);
    assert_eq!(scheduler.handler_count(EventKind::QUIT), 1);

    let counter = Rc::clone(&resolved);
    let task = scheduler.spawn(async move {
        let event = pending.await.unwrap();
        counter.set(counter.get() + 1);
        event.kind()
    });

    // --- ACT ---
    scheduler.post_typed(&Quit {});
    scheduler.post_typed(&Quit {});
    while queue.pending() > 0 {
        scheduler.run_one_iteration().unwrap();
    }

    // --- ASSERT ---
    assert_eq!(resolved.get(), 1);
    assert_eq!(scheduler.handler_count(EventKind::QUIT), 0);
    assert_eq!(scheduler.pending_tasks(), 0);
    assert_eq!(scheduler.run_until_complete(task).unwrap().unwrap(), EventKind::QUIT);
}

#[test]
fn test_dropping_an_unresolved_wait_unregisters_it() {
    let (_, _, scheduler) = scripted();
    let pending = scheduler.await_event(EventKind::KEY_DOWN);
    assert_eq!(pending.kind(), EventKind::KEY_DOWN);
    assert_eq!(scheduler.handler_count(EventKind::KEY_DOWN), 1);
    drop(pending);
    assert_eq!(scheduler.handler_count(EventKind::KEY_DOWN), 0);
}

#[test]
fn test_await_typed_converts_the_event() {
    let (_, _, scheduler) = scripted();
    let pending = scheduler.await_typed::<KeyDown>();
    scheduler.post_typed(&KeyDown {
        key: Keys::Escape,
        modifiers: ModifierKeys::LALT,
        unicode: String::new(),
    });
    let down = scheduler.run_until_complete(pending).unwrap().unwrap();
    assert_eq!(down.key, Keys::Escape);
    assert!(down.modifiers.intersects(ModifierKeys::ALT));
}

#[test]
fn test_run_until_complete_returns_the_output() {
    let (clock, _, scheduler) = scripted();
    let pause = scheduler.sleep(Duration::from_secs(2));
    assert_eq!(pause.deadline(), Duration::from_secs(2));

    let output = scheduler
        .run_until_complete(async move {
            pause.await;
            7
        })
        .unwrap();

    assert_eq!(output, 7);
    assert_eq!(clock.now(), Duration::from_secs(2));
    assert_eq!(scheduler.state(), LoopState::Stopped);
    assert!(!scheduler.is_running());
}

#[test]
fn test_run_until_complete_reports_an_early_stop() {
    let (_, _, scheduler) = scripted();
    let pause = scheduler.sleep(Duration::from_secs(10));
    scheduler.call_later(Duration::from_secs(1), |s| s.stop());

    let result = scheduler.run_until_complete(pause);

    assert!(matches!(result, Err(SchedulerError::NotComplete)));
}

#[test]
fn test_dropped_sleep_cancels_its_timer() {
    let (_, _, scheduler) = scripted();
    let pause = scheduler.sleep(Duration::from_secs(1));
    assert_eq!(scheduler.pending_timers(), 1);
    drop(pause);
    assert_eq!(scheduler.pending_timers(), 0);
}

#[test]
fn test_nested_run_is_rejected() {
    let (_, _, scheduler) = scripted();
    let nested = Rc::new(Cell::new(None));
    let sink = Rc::clone(&nested);
    scheduler.call_soon(move |s| {
        sink.set(Some(matches!(s.run(), Err(SchedulerError::AlreadyRunning(_)))));
        s.stop();
    });
    scheduler.run().unwrap();
    assert_eq!(nested.get(), Some(true));
}

#[test]
fn test_nested_run_until_complete_leaves_the_outer_loop_alone() {
    // --- ARRANGE ---
    let (_, _, scheduler) = scripted();
    let nested = Rc::new(Cell::new(None));
    let late = Rc::new(Cell::new(false));
    let (nested_sink, late_sink) = (Rc::clone(&nested), Rc::clone(&late));
    scheduler.call_soon(move |s| {
        let result = s.run_until_complete(async { 1 });
        nested_sink.set(Some(matches!(result, Err(SchedulerError::AlreadyRunning(_)))));
        s.call_later(Duration::from_secs(1), move |s| {
            late_sink.set(true);
            s.stop();
        });
    });

    // --- ACT ---
    scheduler.run().unwrap();

    // --- ASSERT ---
    assert_eq!(nested.get(), Some(true));
    assert!(late.get(), "the rejected call must not stop the running loop");
    assert_eq!(scheduler.pending_tasks(), 0);
    assert_eq!(scheduler.pending_timers(), 0);
}

#[test]
fn test_far_future_timers_never_fire() {
    let (clock, _, scheduler) = scripted();
    clock.advance(Duration::from_secs(1));
    let fired = Rc::new(Cell::new(false));
    let sink = Rc::clone(&fired);

    let never = scheduler.call_later(Duration::MAX, move |_| sink.set(true));
    assert_eq!(never.when(), Duration::MAX);
    scheduler.call_later(Duration::from_secs(2), |s| s.stop());
    scheduler.run().unwrap();
    scheduler.run_one_iteration().unwrap();

    assert!(!fired.get());
    assert_eq!(scheduler.pending_timers(), 1);
    assert!(clock.now() >= Duration::from_secs(3), "the clock must never run backwards");
}

#[test]
fn test_task_panics_are_reported_and_cancel_the_join() {
    let (_, _, scheduler) = scripted();
    let reports = Rc::new(Cell::new(0));
    let sink = Rc::clone(&reports);
    scheduler.set_exception_handler(move |_, _| sink.set(sink.get() + 1));

    let doomed = scheduler.spawn(async {
        panic!("task failed");
    });
    let result: Result<(), _> = scheduler.run_until_complete(doomed).unwrap();

    assert!(matches!(result, Err(SchedulerError::Cancelled)));
    assert_eq!(reports.get(), 1);
}

#[test]
fn test_blocking_work_resolves_on_the_loop_thread() {
    // --- ARRANGE ---
    let scheduler = threaded(2);
    let loop_thread = thread::current().id();
    let job = scheduler.run_in_executor(|| {
        thread::sleep(Duration::from_millis(20));
        thread::current().name().map(str::to_owned)
    });

    // --- ACT ---
    let (worker, resumed_on) = scheduler
        .run_until_complete(async move {
            let worker = job.await;
            (worker, thread::current().id())
        })
        .unwrap();

    // --- ASSERT ---
    let worker = worker.unwrap().unwrap();
    assert!(worker.starts_with("weft-worker-"), "ran on {worker}");
    assert_eq!(resumed_on, loop_thread);
}

#[test]
fn test_blocking_panics_and_shutdown_are_errors() {
    let scheduler = threaded(1);
    let job = scheduler.run_in_executor(|| -> u32 { panic!("worker exploded") });
    let result = scheduler.run_until_complete(job).unwrap();
    assert!(matches!(result, Err(SchedulerError::WorkerPanicked(ref message)) if message.contains("exploded")));

    scheduler.shutdown_default_executor();
    let refused = scheduler.run_until_complete(scheduler.run_in_executor(|| 1)).unwrap();
    assert!(matches!(refused, Err(SchedulerError::ExecutorShutdown)));

    scheduler.set_default_executor(WorkerPool::new(1, 4).unwrap());
    let accepted = scheduler.run_until_complete(scheduler.run_in_executor(|| 2)).unwrap();
    assert_eq!(accepted.unwrap(), 2);
}

#[test]
fn test_saturated_executor_does_not_block_the_loop() {
    // --- ARRANGE ---
    let config = SchedulerConfig {
        executor_workers: 1,
        executor_queue_capacity: 1,
        ..SchedulerConfig::default()
    };
    let scheduler = Scheduler::builder(Arc::new(ChannelQueue::new()), Arc::new(SystemClock::new()))
        .config(config)
        .build()
        .unwrap();
    let (open, gate) = std::sync::mpsc::channel::<()>();
    let held = scheduler.run_in_executor(move || gate.recv().is_ok());

    // --- ACT ---
    let queued: Vec<_> = (0..4u32).map(|i| scheduler.run_in_executor(move || i * 2)).collect();
    open.send(()).unwrap();
    let (held, results) = scheduler
        .run_until_complete(async move {
            let held = held.await.unwrap();
            let mut results = Vec::new();
            for job in queued {
                results.push(job.await.unwrap());
            }
            (held, results)
        })
        .unwrap();

    // --- ASSERT ---
    assert!(held);
    assert_eq!(results, [0, 2, 4, 6]);
}

#[test]
fn test_remote_callbacks_run_on_the_loop_thread() {
    // --- ARRANGE ---
    let scheduler = threaded(1);
    let remote = scheduler.remote();
    let ran_on = Arc::new(Mutex::new(None));
    let presses = Rc::new(Cell::new(0));

    let counter = Rc::clone(&presses);
    scheduler.on::<KeyDown, _>(move |_, _| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    // --- ACT ---
    let sink = Arc::clone(&ran_on);
    let producer = thread::spawn(move || {
        for key in [Keys::Left, Keys::Right] {
            remote.post_event(
                KeyDown {
                    key,
                    modifiers: ModifierKeys::EMPTY,
                    unicode: String::new(),
                }
                .to_event(),
            );
        }
        remote.call_soon_threadsafe(move |s| {
            *sink.lock().unwrap() = Some(thread::current().id());
            s.stop();
        });
    });
    scheduler.run().unwrap();
    producer.join().unwrap();

    // --- ASSERT ---
    assert_eq!(presses.get(), 2);
    assert_eq!(*ran_on.lock().unwrap(), Some(thread::current().id()));
}

#[test]
fn test_platform_io_is_unsupported() {
    let (_, _, scheduler) = scripted();
    let unsupported = |result: Result<(), SchedulerError>| {
        matches!(result, Err(SchedulerError::Unsupported { .. }))
    };
    assert!(unsupported(scheduler.add_reader(0, |_| {})));
    assert!(unsupported(scheduler.add_writer(1, |_| {})));
    assert!(unsupported(scheduler.subprocess_exec("ls", &[])));
    assert!(unsupported(scheduler.create_connection("localhost", 80)));
    assert!(unsupported(scheduler.create_server("0.0.0.0", 8080)));
    assert!(matches!(
        scheduler.remove_reader(0),
        Err(SchedulerError::Unsupported { operation: "remove_reader" })
    ));
}

#[test]
fn test_a_stopped_loop_can_run_again() {
    let (_, _, scheduler) = scripted();
    let runs = Rc::new(Cell::new(0));
    for _ in 0..2 {
        let counter = Rc::clone(&runs);
        scheduler.call_soon(move |s| {
            counter.set(counter.get() + 1);
            assert!(s.is_running());
            s.stop();
        });
        scheduler.run().unwrap();
        assert_eq!(scheduler.state(), LoopState::Stopped);
    }
    assert_eq!(runs.get(), 2);
}
