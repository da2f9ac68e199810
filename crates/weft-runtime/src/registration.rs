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


//! Scoped handler registrations.

use crate::handler::EventCallback;
use crate::scheduler::{Scheduler, WeakScheduler};
use std::cell::OnceCell;
use std::rc::Rc;
use std::thread;
use weft_core::{Event, EventKind, TypedEvent};

/// An `(event kind, callback)` pair bound to a scheduler.
///
/// Cloning shares the callback, so clones register and unregister the same
/// handler. The scheduler is held weakly: once it is gone, every operation is
/// a no-op and [`HandlerRegistration::is_registered`] is `false`.
#[derive(Debug, Clone)]
pub struct HandlerRegistration {
    scheduler: WeakScheduler,
    kind: EventKind,
    callback: EventCallback,
}

impl HandlerRegistration {
    /// Creates an unregistered registration for `kind`.
    pub fn new<F>(scheduler: &Scheduler, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&Scheduler, &Event) -> anyhow::Result<()> + 'static,
    {
        Self::from_callback(scheduler, kind, EventCallback::new(handler))
    }

    /// Creates an unregistered registration from an existing callback.
    pub fn from_callback(scheduler: &Scheduler, kind: EventKind, callback: EventCallback) -> Self {
        Self {
            scheduler: scheduler.downgrade(),
            kind,
            callback,
        }
    }

    /// Creates an unregistered registration whose kind comes from the event type.
    pub fn typed<E, F>(scheduler: &Scheduler, handler: F) -> Self
    where
        E: TypedEvent,
        F: Fn(&Scheduler, E) -> anyhow::Result<()> + 'static,
    {
        Self::from_callback(scheduler, E::KIND, EventCallback::typed(handler))
    }

    /// Replaces the callback's label.
    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.callback = self.callback.with_label(label);
        self
    }

    /// Registers the handler. No-op if it is already registered.
    pub fn register(&self) {
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.register_handler(self.kind, &self.callback);
        }
    }

    /// Unregisters the handler. No-op if it is not registered.
    pub fn unregister(&self) {
        if let Some(scheduler) = self.scheduler.upgrade() {
            if scheduler.is_registered(self.kind, &self.callback) {
                let _ = scheduler.unregister_handler(self.kind, &self.callback);
            }
        }
    }

    /// Returns `true` while the handler is registered.
    pub fn is_registered(&self) -> bool {
        self.scheduler
            .upgrade()
            .is_some_and(|scheduler| scheduler.is_registered(self.kind, &self.callback))
    }

    /// The kind this registration handles.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The wrapped callback.
    pub fn callback(&self) -> &EventCallback {
        &self.callback
    }

    /// Registers the handler for the lifetime of the returned guard.
    pub fn enter(&self) -> RegistrationGuard {
        self.register();
        RegistrationGuard {
            registration: self.clone(),
        }
    }
}

/// Keeps a handler registered until dropped.
///
/// # Panics
///
/// Dropping the guard panics if the handler was unregistered behind its back
/// while the scope was active. If the thread is already panicking, this is
/// logged instead. Nothing is checked once the scheduler itself is gone.
#[must_use = "the handler is unregistered as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RegistrationGuard {
    registration: HandlerRegistration,
}

impl RegistrationGuard {
    /// The guarded registration.
    pub fn registration(&self) -> &HandlerRegistration {
        &self.registration
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        let registration = &self.registration;
        let Some(scheduler) = registration.scheduler.upgrade() else {
            return;
        };
        if !scheduler.is_registered(registration.kind, &registration.callback) {
            if thread::panicking() {
                log::error!(
                    "Handler '{}' for {} was unregistered while its scope was active.",
                    registration.callback.label(),
                    registration.kind
                );
                return;
            }
            panic!(
                "handler '{}' for {} was unregistered while its scope was active",
                registration.callback.label(),
                registration.kind
            );
        }
        registration.unregister();
    }
}

type Method<T> = Rc<dyn Fn(&T, &Scheduler, &Event) -> anyhow::Result<()>>;

/// A handler that calls a method on an instance.
///
/// The bound registration is built on first [`MethodHandler::bind`] and cached,
/// so every later call returns the same registration. The instance is held
/// weakly; events arriving after it is dropped are ignored.
pub struct MethodHandler<T: 'static> {
    kind: EventKind,
    method: Method<T>,
    bound: OnceCell<HandlerRegistration>,
}

impl<T: 'static> MethodHandler<T> {
    /// Creates a method handler for `kind`.
    pub fn new<F>(kind: EventKind, method: F) -> Self
    where
        F: Fn(&T, &Scheduler, &Event) -> anyhow::Result<()> + 'static,
    {
        Self {
            kind,
            method: Rc::new(method),
            bound: OnceCell::new(),
        }
    }

    /// Creates a method handler whose kind comes from the event type.
    pub fn typed<E, F>(method: F) -> Self
    where
        E: TypedEvent,
        F: Fn(&T, &Scheduler, E) -> anyhow::Result<()> + 'static,
    {
        Self::new(E::KIND, move |this: &T, scheduler: &Scheduler, event: &Event| {
            method(this, scheduler, E::from_event(event)?)
        })
    }

    /// Returns the registration bound to `instance`, building it on first use.
    ///
    /// Later calls return the same registration whatever instance they pass.
    pub fn bind(&self, scheduler: &Scheduler, instance: &Rc<T>) -> &HandlerRegistration {
        self.bound.get_or_init(|| {
            let this = Rc::downgrade(instance);
            let method = Rc::clone(&self.method);
            let callback = EventCallback::new(move |scheduler, event| match this.upgrade() {
                Some(this) => method(&*this, scheduler, event),
                None => Ok(()),
            })
            .with_label(std::any::type_name::<T>());
            HandlerRegistration::from_callback(scheduler, self.kind, callback)
        })
    }

    /// Returns the bound registration, if [`MethodHandler::bind`] was called.
    pub fn bound(&self) -> Option<&HandlerRegistration> {
        self.bound.get()
    }

    /// The kind this handler handles.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl<T: 'static> std::fmt::Debug for MethodHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodHandler")
            .field("kind", &self.kind)
            .field("bound", &self.bound.get().is_some())
            .finish()
    }
}
