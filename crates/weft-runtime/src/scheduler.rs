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

//! The event-loop scheduler.
//!
//! A [`Scheduler`] owns one native queue, one clock and one render surface. It
//! blocks on the queue, marshals each native event into a typed [`Event`] and
//! dispatches it to the handlers registered for its kind, in registration
//! order. Callbacks, timers, tasks and cross-thread work are all expressed as
//! synthetic events on the same queue, so that everything runs on the loop
//! thread, one dispatch at a time.

use crate::config::SchedulerConfig;
use crate::error::{panic_message, SchedulerError};
use crate::exception::{default_exception_handler, ExceptionContext, ExceptionHandler};
use crate::executor::{Blocking, WorkerPool};
use crate::future::{EventFuture, Sleep, SleepState};
use crate::handler::{EventCallback, HandlerTable};
use crate::remote::{RemoteHandle, RemoteInbox};
use crate::renderer::RendererHandle;
use crate::stats::{bump, LoopCounters, LoopStats};
use crate::task::{JoinHandle, LocalFuture, TaskSet, TaskWaker};
use crate::timer::{TimerHandle, TimerQueue};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;
use tokio::sync::oneshot;
use weft_core::builtin::{ExecuteCallback, RemoteCallback, TaskWake, VideoResize};
use weft_core::{
    AnyEvent, Clock, Event, EventKind, EventRegistry, EventSchema, NativeEvent, NativeQueue,
    RenderSurface, TypedEvent,
};

thread_local! {
    static ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Handlers slower than this are reported in debug mode.
const SLOW_CALLBACK: Duration = Duration::from_millis(100);

/// Where a scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Built, never run.
    Initialized,
    /// Inside [`Scheduler::run`] or [`Scheduler::run_until_complete`].
    Running,
    /// Returned from a run.
    Stopped,
}

/// The handle returned by [`Scheduler::call_soon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    id: u64,
}

impl Handle {
    /// The id carried by the `EXECUTE_CALLBACK` event.
    pub fn id(&self) -> u64 {
        self.id
    }
}

type Parked = Box<dyn FnOnce(&Scheduler)>;

enum ExecutorSlot {
    Lazy,
    Ready(WorkerPool),
    Shutdown,
}

/// The surface used when none is supplied. Draws nowhere.
struct DetachedSurface {
    size: (u32, u32),
}

impl RenderSurface for DetachedSurface {
    fn present_frame(&mut self) {}

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

pub(crate) struct SchedulerInner {
    pub(crate) queue: Arc<dyn NativeQueue>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    registry: RefCell<EventRegistry>,
    handlers: RefCell<HandlerTable>,
    timers: RefCell<TimerQueue>,
    parked: RefCell<HashMap<u64, Parked>>,
    tasks: RefCell<TaskSet>,
    remote: Arc<RemoteInbox>,
    executor: RefCell<ExecutorSlot>,
    exception_handler: RefCell<Option<ExceptionHandler>>,
    surface: RefCell<Box<dyn RenderSurface>>,
    surface_size: Cell<(u32, u32)>,
    pub(crate) renderer: RefCell<Option<RendererHandle>>,
    running: Cell<bool>,
    state: Cell<LoopState>,
    debug: Cell<bool>,
    next_id: Cell<u64>,
    pub(crate) counters: LoopCounters,
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        let _ = ACTIVE.try_with(|active| active.set(false));
        log::debug!("Scheduler '{}' released.", self.config.title);
    }
}

/// The single-threaded event-loop scheduler.
///
/// Cloning is cheap and yields another handle to the same loop. At most one
/// scheduler exists per thread at a time; see [`SchedulerBuilder::build`].
#[derive(Clone)]
pub struct Scheduler {
    pub(crate) inner: Rc<SchedulerInner>,
}

/// A non-owning handle to a [`Scheduler`].
#[derive(Clone, Default)]
pub struct WeakScheduler {
    inner: Weak<SchedulerInner>,
}

impl WeakScheduler {
    /// Returns the scheduler if it is still alive.
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }
}

impl fmt::Debug for WeakScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakScheduler")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("title", &self.inner.config.title)
            .field("state", &self.inner.state.get())
            .field("running", &self.inner.running.get())
            .finish_non_exhaustive()
    }
}

/// Configures and creates a [`Scheduler`].
pub struct SchedulerBuilder {
    queue: Arc<dyn NativeQueue>,
    clock: Arc<dyn Clock>,
    surface: Option<Box<dyn RenderSurface>>,
    config: SchedulerConfig,
    registry: Option<EventRegistry>,
}

impl SchedulerBuilder {
    /// Sets the surface the renderer draws on.
    #[must_use]
    pub fn surface(mut self, surface: impl RenderSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Replaces the default configuration.
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts from `registry` instead of [`EventRegistry::with_builtins`].
    /// The scheduler's own event kinds are added if missing.
    #[must_use]
    pub fn registry(mut self, registry: EventRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Creates the scheduler.
    ///
    /// ## Errors
    ///
    /// [`SchedulerError::AlreadyInitialized`] if a scheduler is alive on this
    /// thread, and [`SchedulerError::Event`] if the supplied registry maps one
    /// of the internal kinds to a foreign schema.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        if ACTIVE.with(Cell::get) {
            return Err(SchedulerError::AlreadyInitialized);
        }
        let mut registry = self.registry.unwrap_or_else(EventRegistry::with_builtins);
        ensure_registered::<ExecuteCallback>(&mut registry)?;
        ensure_registered::<TaskWake>(&mut registry)?;
        ensure_registered::<RemoteCallback>(&mut registry)?;
        ensure_registered::<VideoResize>(&mut registry)?;

        let config = self.config;
        let surface = self.surface.unwrap_or_else(|| {
            Box::new(DetachedSurface {
                size: config.unscaled_size,
            })
        });
        let size = surface.size();
        let debug = config.debug;

        ACTIVE.with(|active| active.set(true));
        let scheduler = Scheduler {
            inner: Rc::new(SchedulerInner {
                queue: self.queue,
                clock: self.clock,
                config,
                registry: RefCell::new(registry),
                handlers: RefCell::new(HandlerTable::default()),
                timers: RefCell::new(TimerQueue::new()),
                parked: RefCell::new(HashMap::new()),
                tasks: RefCell::new(TaskSet::default()),
                remote: Arc::new(RemoteInbox::default()),
                executor: RefCell::new(ExecutorSlot::Lazy),
                exception_handler: RefCell::new(None),
                surface: RefCell::new(surface),
                surface_size: Cell::new(size),
                renderer: RefCell::new(None),
                running: Cell::new(false),
                state: Cell::new(LoopState::Initialized),
                debug: Cell::new(debug),
                next_id: Cell::new(1),
                counters: LoopCounters::default(),
            }),
        };
        scheduler.install_internal_handlers();
        log::info!(
            "Created scheduler '{}' with a {}x{} surface.",
            scheduler.inner.config.title,
            size.0,
            size.1
        );
        Ok(scheduler)
    }
}

fn ensure_registered<E: TypedEvent>(registry: &mut EventRegistry) -> Result<(), SchedulerError> {
    match registry.schema(E::KIND) {
        Some(schema) if schema.name == E::schema().name => Ok(()),
        Some(_) => Err(weft_core::EventError::DuplicateKind(E::KIND).into()),
        None => Ok(registry.register_typed::<E>()?),
    }
}

impl Scheduler {
    /// Starts configuring a scheduler over `queue` and `clock`.
    pub fn builder(queue: Arc<dyn NativeQueue>, clock: Arc<dyn Clock>) -> SchedulerBuilder {
        SchedulerBuilder {
            queue,
            clock,
            surface: None,
            config: SchedulerConfig::default(),
            registry: None,
        }
    }

    /// Returns `true` if a scheduler is alive on this thread.
    pub fn has_instance() -> bool {
        ACTIVE.with(Cell::get)
    }

    /// Returns a handle that does not keep the scheduler alive.
    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// The current time on the scheduler's clock.
    pub fn now(&self) -> Duration {
        self.inner.clock.now()
    }

    /// The current time in seconds.
    pub fn time(&self) -> f64 {
        self.now().as_secs_f64()
    }

    fn next_id(&self) -> u64 {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        id
    }

    // --- Event kinds ---

    /// Registers `schema` under a fixed `kind`.
    ///
    /// ## Errors
    ///
    /// Fails if `kind` already has a schema.
    pub fn register_kind(&self, kind: EventKind, schema: EventSchema) -> Result<(), SchedulerError> {
        self.inner.registry.borrow_mut().register(kind, schema)?;
        log::debug!("Registered event kind {kind}.");
        Ok(())
    }

    /// Allocates a fresh kind from the native queue and registers `schema`
    /// under it.
    ///
    /// ## Errors
    ///
    /// Fails when the queue has no kinds left.
    pub fn declare_kind(&self, schema: EventSchema) -> Result<EventKind, SchedulerError> {
        let name = schema.name;
        let kind = self
            .inner
            .registry
            .borrow_mut()
            .register_new(schema, || self.inner.queue.allocate_kind())?;
        log::debug!("Declared event kind {kind} for '{name}'.");
        Ok(kind)
    }

    /// Registers the schema of a typed event.
    ///
    /// ## Errors
    ///
    /// Fails if its kind already has a schema.
    pub fn register_event<E: TypedEvent>(&self) -> Result<(), SchedulerError> {
        self.register_kind(E::KIND, E::schema())
    }

    /// Returns `true` if `kind` has a schema.
    pub fn is_kind_registered(&self, kind: EventKind) -> bool {
        self.inner.registry.borrow().is_registered(kind)
    }

    /// Marshals a native event through this scheduler's registry.
    ///
    /// ## Errors
    ///
    /// Fails when a required field is missing or an enumeration value is unknown.
    pub fn marshal(&self, native: &NativeEvent) -> Result<Option<Event>, SchedulerError> {
        Ok(self.inner.registry.borrow().marshal(native)?)
    }

    // --- Handlers ---

    /// Adds `callback` to the handlers of `kind`. Registering twice has no
    /// further effect.
    pub fn register_handler(&self, kind: EventKind, callback: &EventCallback) {
        if self.inner.handlers.borrow_mut().insert(kind, callback) {
            log::debug!("Registered handler '{}' for {kind}.", callback.label());
        }
    }

    /// Removes `callback` from the handlers of `kind`.
    ///
    /// ## Errors
    ///
    /// [`SchedulerError::NotRegistered`] if it was not registered.
    pub fn unregister_handler(&self, kind: EventKind, callback: &EventCallback) -> Result<(), SchedulerError> {
        if self.inner.handlers.borrow_mut().remove(kind, callback) {
            log::debug!("Unregistered handler '{}' for {kind}.", callback.label());
            Ok(())
        } else {
            Err(SchedulerError::NotRegistered {
                kind,
                handler: callback.label().to_owned(),
            })
        }
    }

    /// Returns `true` if `callback` is registered for `kind`.
    pub fn is_registered(&self, kind: EventKind, callback: &EventCallback) -> bool {
        self.inner.handlers.borrow().contains(kind, callback)
    }

    /// The number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner.handlers.borrow().count(kind)
    }

    /// Registers a typed handler and returns the callback, for unregistering.
    pub fn on<E, F>(&self, handler: F) -> EventCallback
    where
        E: TypedEvent,
        F: Fn(&Scheduler, E) -> anyhow::Result<()> + 'static,
    {
        let callback = EventCallback::typed::<E, F>(handler);
        self.register_handler(E::KIND, &callback);
        callback
    }

    /// Posts an event to the native queue. It is dispatched after every event
    /// already queued.
    pub fn post_event(&self, event: impl Into<AnyEvent>) {
        self.inner.queue.post_event(event.into().into_native());
    }

    /// Posts a typed event.
    pub fn post_typed<E: TypedEvent>(&self, event: &E) {
        self.post_event(event.to_event());
    }

    /// Returns a future resolving with the next event of `kind`.
    ///
    /// A one-shot handler is registered at once and removed when the event
    /// arrives, or when the future is dropped unresolved.
    pub fn await_event(&self, kind: EventKind) -> EventFuture {
        let (sender, receiver) = oneshot::channel();
        let sender = RefCell::new(Some(sender));
        let hook: Rc<RefCell<Option<EventCallback>>> = Rc::new(RefCell::new(None));
        let own = Rc::downgrade(&hook);
        let callback = EventCallback::new(move |scheduler, event| {
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(event.clone());
            }
            let this = match own.upgrade() {
                Some(hook) => {
                    let taken = hook.borrow_mut().take();
                    taken
                }
                None => None,
            };
            if let Some(this) = this {
                scheduler.unregister_handler(event.kind(), &this)?;
            }
            Ok(())
        })
        .with_label("await_event");
        *hook.borrow_mut() = Some(callback.clone());
        self.register_handler(kind, &callback);
        EventFuture::new(kind, receiver, hook, self.downgrade())
    }

    /// Returns a future resolving with the next event of type `E`.
    pub fn await_typed<E: TypedEvent>(&self) -> impl Future<Output = Result<E, SchedulerError>> {
        let pending = self.await_event(E::KIND);
        async move {
            let event = pending.await?;
            Ok(E::from_event(&event)?)
        }
    }

    // --- Callbacks and timers ---

    /// Schedules `callback` to run after every event already queued.
    pub fn call_soon<F>(&self, callback: F) -> Handle
    where
        F: FnOnce(&Scheduler) + 'static,
    {
        let id = self.next_id();
        self.inner.parked.borrow_mut().insert(id, Box::new(callback));
        self.inner
            .queue
            .post_event(ExecuteCallback { handle: id as i64 }.to_event().to_native());
        Handle { id }
    }

    /// Schedules `callback` to run once the clock reaches `deadline`.
    pub fn call_at<F>(&self, deadline: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce(&Scheduler) + 'static,
    {
        let id = self.next_id();
        self.inner.parked.borrow_mut().insert(id, Box::new(callback));
        self.inner.timers.borrow_mut().append(id, deadline);
        log::trace!("Timer {id} armed for {deadline:?}.");
        TimerHandle::new(id, deadline, self.downgrade())
    }

    /// Schedules `callback` to run `delay` from now.
    ///
    /// A delay reaching past the end of the clock's range never fires.
    pub fn call_later<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce(&Scheduler) + 'static,
    {
        let deadline = self.now().checked_add(delay).unwrap_or(Duration::MAX);
        self.call_at(deadline, callback)
    }

    pub(crate) fn cancel_timer(&self, id: u64) {
        let queued = self.inner.timers.borrow_mut().cancel(id);
        if queued {
            let callback = self.inner.parked.borrow_mut().remove(&id);
            drop(callback);
            log::trace!("Timer {id} cancelled.");
        }
    }

    /// The number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Returns a future completing `duration` from now.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        let state = Rc::new(SleepState::default());
        let fired = Rc::clone(&state);
        let timer = self.call_later(duration, move |_| fired.fire());
        Sleep::new(state, timer)
    }

    fn run_parked(&self, id: u64) {
        let callback = self.inner.parked.borrow_mut().remove(&id);
        let Some(callback) = callback else {
            log::trace!("Callback {id} is gone; skipped.");
            return;
        };
        bump(&self.inner.counters.callbacks_run);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(self))) {
            self.call_exception_handler(
                &ExceptionContext::new(format!("Callback {id} panicked"))
                    .with_error(anyhow::anyhow!(panic_message(&*payload))),
            );
        }
    }

    // --- Cross-thread entry points ---

    /// Returns a `Send` handle for reaching this loop from other threads.
    pub fn remote(&self) -> RemoteHandle {
        RemoteHandle::new(Arc::clone(&self.inner.queue), Arc::clone(&self.inner.remote))
    }

    /// Schedules `callback` on the loop thread. Callable from any thread
    /// through [`Scheduler::remote`].
    pub fn call_soon_threadsafe<F>(&self, callback: F)
    where
        F: FnOnce(&Scheduler) + Send + 'static,
    {
        self.remote().call_soon_threadsafe(callback);
    }

    fn run_remote(&self, id: u64) {
        let Some(callback) = self.inner.remote.take(id) else {
            log::warn!("Remote callback {id} was already taken.");
            return;
        };
        bump(&self.inner.counters.callbacks_run);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(self))) {
            self.call_exception_handler(
                &ExceptionContext::new(format!("Remote callback {id} panicked"))
                    .with_error(anyhow::anyhow!(panic_message(&*payload))),
            );
        }
    }

    // --- Tasks ---

    /// Starts driving `future` on the loop. Its first poll happens after every
    /// event already queued.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let id = self.next_id();
        let (sender, receiver) = oneshot::channel();
        let task: LocalFuture = Box::pin(async move {
            let _ = sender.send(future.await);
        });
        self.inner.tasks.borrow_mut().insert(id, task);
        TaskWaker::post(&*self.inner.queue, id);
        log::trace!("Spawned task {id}.");
        JoinHandle::new(id, receiver)
    }

    /// The number of tasks that have not completed.
    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    pub(crate) fn poll_task(&self, id: u64) {
        let task = self.inner.tasks.borrow_mut().take(id);
        let Some(mut task) = task else {
            log::trace!("Task {id} already finished; wake ignored.");
            return;
        };
        bump(&self.inner.counters.tasks_polled);
        let waker = Waker::from(Arc::new(TaskWaker {
            id,
            queue: Arc::clone(&self.inner.queue),
        }));
        let mut cx = Context::from_waker(&waker);
        match panic::catch_unwind(AssertUnwindSafe(|| task.as_mut().poll(&mut cx))) {
            Ok(Poll::Pending) => self.inner.tasks.borrow_mut().insert(id, task),
            Ok(Poll::Ready(())) => log::trace!("Task {id} finished."),
            Err(payload) => {
                drop(task);
                self.call_exception_handler(
                    &ExceptionContext::new(format!("Task {id} panicked"))
                        .with_error(anyhow::anyhow!(panic_message(&*payload))),
                );
            }
        }
    }

    // --- Running ---

    /// Runs one iteration: arms overdue timers, blocks on the queue until the
    /// next event or timer deadline, then dispatches at most one event.
    ///
    /// ## Errors
    ///
    /// [`SchedulerError::Event`] when a native event does not fit its schema.
    pub fn run_one_iteration(&self) -> Result<(), SchedulerError> {
        bump(&self.inner.counters.iterations);
        let timeout = {
            let now = self.now();
            self.inner.timers.borrow_mut().soonest(now, &*self.inner.queue)
        };
        let Some(native) = self.inner.queue.wait_for_event(timeout) else {
            return Ok(());
        };
        let event = self.inner.registry.borrow().marshal(&native)?;
        match event {
            Some(event) => self.dispatch(&event),
            None => log::trace!("No schema for event kind {}; skipped.", native.kind),
        }
        Ok(())
    }

    /// Dispatches `event` to the handlers registered for its kind.
    ///
    /// The handler list is copied first, so registrations made while
    /// dispatching apply from the next event on. A handler that fails or
    /// panics is reported to the exception handler and the rest still run.
    pub fn dispatch(&self, event: &Event) {
        bump(&self.inner.counters.events_dispatched);
        let handlers = self.inner.handlers.borrow().snapshot(event.kind());
        for handler in &handlers {
            let started = self.now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.call(self, event)));
            if self.inner.debug.get() {
                let took = self.now().saturating_sub(started);
                if took >= SLOW_CALLBACK {
                    log::warn!("Handler '{}' took {took:?} on {}.", handler.label(), event.name());
                }
            }
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(payload) => anyhow::anyhow!("panicked: {}", panic_message(&*payload)),
            };
            bump(&self.inner.counters.handler_failures);
            let error = error.context(SchedulerError::HandlerExecution {
                handler: handler.label().to_owned(),
                event: event.name(),
            });
            self.call_exception_handler(
                &ExceptionContext::new(format!("Handler '{}' failed on {}", handler.label(), event.name()))
                    .with_error(error)
                    .with_event(event)
                    .with_handler(handler.label()),
            );
        }
    }

    /// Runs iterations until [`Scheduler::stop`] is called.
    ///
    /// ## Errors
    ///
    /// [`SchedulerError::AlreadyRunning`] when called from inside the loop, and
    /// any error from [`Scheduler::run_one_iteration`], which ends the run.
    pub fn run(&self) -> Result<(), SchedulerError> {
        if self.inner.state.get() == LoopState::Running {
            return Err(SchedulerError::AlreadyRunning("event loop"));
        }
        self.inner.running.set(true);
        self.inner.state.set(LoopState::Running);
        log::info!("Event loop '{}' started.", self.inner.config.title);

        let mut result = Ok(());
        while self.inner.running.get() {
            if let Err(error) = self.run_one_iteration() {
                log::error!("Event loop aborted: {error}");
                result = Err(error);
                break;
            }
        }

        self.inner.running.set(false);
        self.inner.state.set(LoopState::Stopped);
        log::info!("Event loop stopped. {}", self.stats());
        result
    }

    /// Runs the loop until `future` completes and returns its output.
    ///
    /// ## Errors
    ///
    /// [`SchedulerError::NotComplete`] if the loop was stopped before the
    /// future finished, plus the errors of [`Scheduler::run`].
    pub fn run_until_complete<F>(&self, future: F) -> Result<F::Output, SchedulerError>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        if self.inner.state.get() == LoopState::Running {
            return Err(SchedulerError::AlreadyRunning("event loop"));
        }
        let output = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&output);
        let weak = self.downgrade();
        drop(self.spawn(async move {
            let value = future.await;
            *slot.borrow_mut() = Some(value);
            if let Some(scheduler) = weak.upgrade() {
                scheduler.stop();
            }
        }));
        self.run()?;
        let value = output.borrow_mut().take();
        value.ok_or(SchedulerError::NotComplete)
    }

    /// Asks the loop to return after the current iteration.
    pub fn stop(&self) {
        if self.inner.running.replace(false) {
            log::debug!("Stop requested.");
        }
    }

    /// Returns `true` while the loop is running and not asked to stop.
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Where the loop is in its lifecycle.
    pub fn state(&self) -> LoopState {
        self.inner.state.get()
    }

    /// Accepted for compatibility. The scheduler is released when its last
    /// handle is dropped.
    pub fn close(&self) {
        log::debug!("close() has no effect; drop the scheduler to release it.");
    }

    /// Always `false`; see [`Scheduler::close`].
    pub fn is_closed(&self) -> bool {
        false
    }

    /// Returns the debug flag.
    pub fn get_debug(&self) -> bool {
        self.inner.debug.get()
    }

    /// Sets the debug flag. In debug mode, slow handlers are logged.
    pub fn set_debug(&self, enabled: bool) {
        self.inner.debug.set(enabled);
    }

    /// Counters describing the work done so far.
    pub fn stats(&self) -> LoopStats {
        self.inner.counters.snapshot(self.inner.timers.borrow().fired())
    }

    // --- Exceptions ---

    /// Installs a custom exception handler.
    pub fn set_exception_handler<F>(&self, handler: F)
    where
        F: Fn(&Scheduler, &ExceptionContext) + 'static,
    {
        *self.inner.exception_handler.borrow_mut() = Some(Rc::new(handler));
    }

    /// Restores the default exception handler.
    pub fn clear_exception_handler(&self) {
        let previous = self.inner.exception_handler.borrow_mut().take();
        drop(previous);
    }

    /// The custom exception handler, if one is installed.
    pub fn exception_handler(&self) -> Option<ExceptionHandler> {
        self.inner.exception_handler.borrow().clone()
    }

    /// Reports a contained failure to the exception handler. If a custom
    /// handler panics, the default one reports the original failure.
    pub fn call_exception_handler(&self, context: &ExceptionContext) {
        let Some(handler) = self.exception_handler() else {
            default_exception_handler(self, context);
            return;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(self, context))) {
            log::error!("Exception handler panicked: {}", panic_message(&*payload));
            default_exception_handler(self, context);
        }
    }

    // --- Blocking work ---

    /// Runs `job` on the default worker pool and returns a future for its
    /// result. The pool is created on first use from the configuration.
    pub fn run_in_executor<T, F>(&self, job: F) -> Blocking<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let mut slot = self.inner.executor.borrow_mut();
        if let ExecutorSlot::Lazy = *slot {
            let config = &self.inner.config;
            match WorkerPool::new(config.executor_workers, config.executor_queue_capacity) {
                Ok(pool) => *slot = ExecutorSlot::Ready(pool),
                Err(error) => return Blocking::failed(error),
            }
        }
        match &*slot {
            ExecutorSlot::Ready(pool) => match pool.submit(job) {
                Ok(receiver) => Blocking::waiting(receiver),
                Err(error) => Blocking::failed(error),
            },
            ExecutorSlot::Lazy | ExecutorSlot::Shutdown => Blocking::failed(SchedulerError::ExecutorShutdown),
        }
    }

    /// Replaces the default worker pool. The previous pool is shut down.
    pub fn set_default_executor(&self, pool: WorkerPool) {
        let previous = self.inner.executor.replace(ExecutorSlot::Ready(pool));
        drop(previous);
    }

    /// Shuts the default worker pool down. Later calls to
    /// [`Scheduler::run_in_executor`] fail with
    /// [`SchedulerError::ExecutorShutdown`].
    pub fn shutdown_default_executor(&self) {
        let previous = self.inner.executor.replace(ExecutorSlot::Shutdown);
        drop(previous);
        log::debug!("Default executor shut down.");
    }

    // --- Surface ---

    /// Calls `f` with the render surface. Returns `None` if the surface is
    /// already in use further up the stack.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut dyn RenderSurface) -> R) -> Option<R> {
        let Ok(mut surface) = self.inner.surface.try_borrow_mut() else {
            return None;
        };
        let result = f(&mut **surface);
        self.inner.surface_size.set(surface.size());
        Some(result)
    }

    /// The surface size as of the last access.
    pub fn surface_size(&self) -> (u32, u32) {
        self.inner.surface_size.get()
    }

    /// Current surface width over the configured unscaled width.
    pub fn scale_factor(&self) -> f64 {
        let (width, _) = self.inner.surface_size.get();
        let (unscaled, _) = self.inner.config.unscaled_size;
        if unscaled == 0 {
            return 1.0;
        }
        f64::from(width) / f64::from(unscaled)
    }

    /// Resizes the surface to `width`, keeping the configured aspect ratio.
    fn resize_surface(&self, width: i64) {
        let (unscaled_w, unscaled_h) = self.inner.config.unscaled_size;
        if unscaled_w == 0 {
            return;
        }
        let width = u32::try_from(width.max(0)).unwrap_or(u32::MAX);
        let height = (f64::from(width) * f64::from(unscaled_h) / f64::from(unscaled_w)).round() as u32;
        if self.with_surface(|surface| surface.resize(width, height)).is_some() {
            log::debug!("Surface resized to {width}x{height}.");
        } else {
            log::warn!("Surface busy; resize to {width}x{height} dropped.");
        }
    }

    fn install_internal_handlers(&self) {
        let internal = [
            (
                EventKind::EXECUTE_CALLBACK,
                EventCallback::typed::<ExecuteCallback, _>(|s, e| {
                    s.run_parked(e.handle as u64);
                    Ok(())
                })
                .with_label("execute_callback"),
            ),
            (
                EventKind::TASK_WAKE,
                EventCallback::typed::<TaskWake, _>(|s, e| {
                    s.poll_task(e.task as u64);
                    Ok(())
                })
                .with_label("poll_task"),
            ),
            (
                EventKind::REMOTE_CALLBACK,
                EventCallback::typed::<RemoteCallback, _>(|s, e| {
                    s.run_remote(e.handle as u64);
                    Ok(())
                })
                .with_label("remote_callback"),
            ),
            (
                EventKind::VIDEO_RESIZE,
                EventCallback::typed::<VideoResize, _>(|s, e| {
                    s.resize_surface(e.w);
                    Ok(())
                })
                .with_label("video_resize"),
            ),
        ];
        for (kind, callback) in &internal {
            self.register_handler(*kind, callback);
        }
    }
}
