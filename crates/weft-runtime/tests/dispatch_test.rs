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

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use weft_core::builtin::{KeyDown, Quit};
use weft_core::keyboard::{Keys, ModifierKeys};
use weft_core::{EventKind, NativeEvent, TypedEvent, Value};
use weft_infra::{ManualClock, ScriptedQueue};
use weft_runtime::{
    EventCallback, HandlerRegistration, MethodHandler, Scheduler, SchedulerError,
};

weft_core::typed_event! {
    struct Ping [EventKind::user(1)] {
        seq: i64 => "seq",
        label: String => "label",
        ratio: f64 => "ratio",
    }
}

fn scripted(events: Vec<NativeEvent>) -> (Arc<ScriptedQueue>, Scheduler) {
    let clock = Arc::new(ManualClock::new());
    let queue = Arc::new(ScriptedQueue::with_events(Arc::clone(&clock), events));
    let scheduler = Scheduler::builder(queue.clone(), clock).build().unwrap();
    (queue, scheduler)
}

fn drain(scheduler: &Scheduler, queue: &ScriptedQueue) {
    while queue.pending() > 0 {
        scheduler.run_one_iteration().unwrap();
    }
}

fn key(key: Keys) -> KeyDown {
    KeyDown {
        key,
        modifiers: ModifierKeys::EMPTY,
        unicode: String::new(),
    }
}

#[test]
fn test_single_native_event_reaches_its_handler_with_the_payload() {
    // --- ARRANGE ---
    let payload = NativeEvent::new(Ping::KIND)
        .with("seq", 42)
        .with("label", "hello")
        .with("ratio", 0.5);
    let (queue, scheduler) = scripted(vec![payload.clone()]);
    scheduler.register_event::<Ping>().unwrap();

    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    let callback = EventCallback::new(move |_, event| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    });
    scheduler.register_handler(Ping::KIND, &callback);

    // --- ACT ---
    scheduler.run_one_iteration().unwrap();

    // --- ASSERT ---
    let received = received.borrow();
    assert_eq!(received.len(), 1, "handler should run exactly once");
    let event = &received[0];
    assert_eq!(event.kind(), Ping::KIND);
    assert_eq!(event.raw("seq"), Some(Value::Int(42)));
    assert_eq!(event.raw("label"), Some(Value::Text("hello".into())));
    assert_eq!(event.raw("ratio"), Some(Value::Float(0.5)));
    assert_eq!(event.origin(), Some(&payload));
    assert_eq!(
        Ping::from_event(event).unwrap(),
        Ping {
            seq: 42,
            label: "hello".into(),
            ratio: 0.5,
        }
    );
    assert_eq!(queue.pending(), 0);
}

#[test]
fn test_events_are_dispatched_in_queue_order() {
    let (queue, scheduler) = scripted(Vec::new());
    let order = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&order);
    scheduler.on::<KeyDown, _>(move |_, down| {
        sink.borrow_mut().push(down.key);
        Ok(())
    });

    for k in [Keys::A, Keys::B, Keys::C] {
        scheduler.post_typed(&key(k));
    }
    drain(&scheduler, &queue);

    assert_eq!(*order.borrow(), [Keys::A, Keys::B, Keys::C]);
}

#[test]
fn test_handlers_of_one_kind_run_in_registration_order() {
    let (queue, scheduler) = scripted(Vec::new());
    let order = Rc::new(RefCell::new(Vec::new()));
    let callbacks: Vec<_> = ["first", "second", "third"]
        .into_iter()
        .map(|name| {
            let sink = Rc::clone(&order);
            EventCallback::new(move |_, _| {
                sink.borrow_mut().push(name);
                Ok(())
            })
        })
        .collect();
    for callback in &callbacks {
        scheduler.register_handler(EventKind::QUIT, callback);
    }

    scheduler.post_typed(&Quit {});
    drain(&scheduler, &queue);

    assert_eq!(*order.borrow(), ["first", "second", "third"]);
}

#[test]
fn test_register_is_idempotent_and_unregister_reports_absence() {
    let (queue, scheduler) = scripted(Vec::new());
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let callback = EventCallback::new(move |_, _| {
        counter.set(counter.get() + 1);
        Ok(())
    })
    .with_label("counter");

    scheduler.register_handler(EventKind::QUIT, &callback);
    scheduler.register_handler(EventKind::QUIT, &callback);
    assert_eq!(scheduler.handler_count(EventKind::QUIT), 1);

    scheduler.post_typed(&Quit {});
    drain(&scheduler, &queue);
    assert_eq!(calls.get(), 1);

    scheduler.unregister_handler(EventKind::QUIT, &callback).unwrap();
    assert!(!scheduler.is_registered(EventKind::QUIT, &callback));
    let again = scheduler.unregister_handler(EventKind::QUIT, &callback);
    assert!(matches!(
        again,
        Err(SchedulerError::NotRegistered { kind, ref handler }) if kind == EventKind::QUIT && handler == "counter"
    ));

    scheduler.post_typed(&Quit {});
    drain(&scheduler, &queue);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_equal_closures_are_distinct_handlers() {
    let (_, scheduler) = scripted(Vec::new());
    let a = EventCallback::new(|_, _| Ok(()));
    let b = EventCallback::new(|_, _| Ok(()));
    scheduler.register_handler(EventKind::QUIT, &a);
    scheduler.register_handler(EventKind::QUIT, &b);
    assert_eq!(scheduler.handler_count(EventKind::QUIT), 2);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}

#[test]
fn test_scoped_registration_lasts_for_the_guard() {
    let (queue, scheduler) = scripted(Vec::new());
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let registration = HandlerRegistration::typed::<Quit, _>(&scheduler, move |_, _| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    {
        let _guard = registration.enter();
        assert!(registration.is_registered());
        scheduler.post_typed(&Quit {});
        drain(&scheduler, &queue);
    }
    assert!(!registration.is_registered());

    scheduler.post_typed(&Quit {});
    drain(&scheduler, &queue);
    assert_eq!(calls.get(), 1);

    // Unregistering an absent registration is a no-op.
    registration.unregister();
}

#[test]
#[should_panic(expected = "was unregistered while its scope was active")]
fn test_scoped_registration_detects_external_removal() {
    let (_, scheduler) = scripted(Vec::new());
    let registration = HandlerRegistration::new(&scheduler, EventKind::QUIT, |_, _| Ok(()));
    let _guard = registration.enter();
    scheduler
        .unregister_handler(EventKind::QUIT, registration.callback())
        .unwrap();
}

#[test]
fn test_guards_owned_by_the_loop_do_not_keep_it_alive() {
    // --- ARRANGE ---
    let (_, scheduler) = scripted(Vec::new());
    let registration = HandlerRegistration::new(&scheduler, EventKind::QUIT, |_, _| Ok(()));
    let guard = registration.enter();
    scheduler.call_later(std::time::Duration::from_secs(60), move |_| drop(guard));
    assert!(registration.is_registered());

    // --- ACT ---
    drop(scheduler);

    // --- ASSERT ---
    assert!(!Scheduler::has_instance(), "the scheduler must be released");
    assert!(!registration.is_registered());
    registration.register();
    registration.unregister();
}

struct Counter {
    hits: Cell<u32>,
}

#[test]
fn test_method_handler_binds_once_per_instance() {
    // --- ARRANGE ---
    let (queue, scheduler) = scripted(Vec::new());
    let counter = Rc::new(Counter { hits: Cell::new(0) });
    let on_quit = MethodHandler::<Counter>::typed::<Quit, _>(|this, _, _| {
        this.hits.set(this.hits.get() + 1);
        Ok(())
    });

    // --- ACT ---
    let first = on_quit.bind(&scheduler, &counter).clone();
    let second = on_quit.bind(&scheduler, &counter).clone();
    first.register();
    second.register();
    scheduler.post_typed(&Quit {});
    drain(&scheduler, &queue);

    // --- ASSERT ---
    assert_eq!(first.callback(), second.callback());
    assert_eq!(scheduler.handler_count(EventKind::QUIT), 1);
    assert_eq!(counter.hits.get(), 1);

    // The instance is held weakly.
    drop(counter);
    scheduler.post_typed(&Quit {});
    drain(&scheduler, &queue);
    first.unregister();
    assert!(on_quit.bound().is_some_and(|bound| !bound.is_registered()));
}

#[test]
fn test_unknown_enum_values_use_the_fallback_and_keep_the_raw_code() {
    let native = NativeEvent::new(EventKind::KEY_DOWN)
        .with("key", 0x5555_i64)
        .with("mod", 0x0041_i64)
        .with("unicode", "");
    let (queue, scheduler) = scripted(vec![native]);
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    scheduler.register_handler(
        EventKind::KEY_DOWN,
        &EventCallback::new(move |_, event| {
            *sink.borrow_mut() = Some((KeyDown::from_event(event)?, event.raw("key")));
            Ok(())
        }),
    );

    drain(&scheduler, &queue);

    let (down, raw) = seen.borrow_mut().take().unwrap();
    assert_eq!(down.key, Keys::ErrorKey);
    assert_eq!(raw, Some(Value::Int(0x5555)));
    assert!(down.modifiers.contains(ModifierKeys::LSHIFT));
    assert!(down.modifiers.contains(ModifierKeys::LCTRL));
    assert!(!down.modifiers.contains(ModifierKeys::RSHIFT));
}

#[test]
fn test_scope_exit_unregisters_even_when_the_handler_failed() {
    let (queue, scheduler) = scripted(Vec::new());
    let failures = Rc::new(Cell::new(0));
    let sink = Rc::clone(&failures);
    scheduler.set_exception_handler(move |_, _| sink.set(sink.get() + 1));
    let registration = HandlerRegistration::new(&scheduler, EventKind::QUIT, |_, _| {
        anyhow::bail!("handler failed")
    });

    {
        let _guard = registration.enter();
        scheduler.post_typed(&Quit {});
        drain(&scheduler, &queue);
    }

    assert_eq!(failures.get(), 1);
    assert!(!registration.is_registered());
}
