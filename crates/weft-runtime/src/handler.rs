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


//! Event callbacks and the per-kind handler table.

use crate::scheduler::Scheduler;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use weft_core::{Event, EventKind, TypedEvent};

type HandlerFn = dyn Fn(&Scheduler, &Event) -> anyhow::Result<()>;

/// A handler for dispatched events.
///
/// Callbacks compare by identity: two clones of the same callback are equal,
/// two callbacks built from identical closures are not. This is what makes
/// registration a set operation.
#[derive(Clone)]
pub struct EventCallback {
    func: Rc<HandlerFn>,
    label: Rc<str>,
}

impl EventCallback {
    /// Wraps a closure. The label defaults to the closure's type name.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Scheduler, &Event) -> anyhow::Result<()> + 'static,
    {
        Self {
            label: Rc::from(std::any::type_name::<F>()),
            func: Rc::new(func),
        }
    }

    /// Wraps a closure taking a typed event. Events that fail to convert are
    /// reported as handler failures.
    pub fn typed<E, F>(func: F) -> Self
    where
        E: TypedEvent,
        F: Fn(&Scheduler, E) -> anyhow::Result<()> + 'static,
    {
        let label = Rc::from(std::any::type_name::<F>());
        Self {
            func: Rc::new(move |scheduler: &Scheduler, event: &Event| func(scheduler, E::from_event(event)?)),
            label,
        }
    }

    /// Replaces the label used in logs and error reports.
    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Rc::from(label);
        self
    }

    /// The label used in logs and error reports.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Invokes the callback.
    pub fn call(&self, scheduler: &Scheduler, event: &Event) -> anyhow::Result<()> {
        (self.func)(scheduler, event)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.func) as *const ()
    }
}

impl PartialEq for EventCallback {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for EventCallback {}

impl fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallback")
            .field("label", &self.label)
            .field("addr", &self.addr())
            .finish()
    }
}

/// The registered handlers, per kind, in registration order.
#[derive(Debug, Default)]
pub(crate) struct HandlerTable {
    by_kind: HashMap<EventKind, Vec<EventCallback>>,
}

impl HandlerTable {
    /// Adds `callback` under `kind`. Returns `false` if it was already there.
    pub(crate) fn insert(&mut self, kind: EventKind, callback: &EventCallback) -> bool {
        let handlers = self.by_kind.entry(kind).or_default();
        if handlers.contains(callback) {
            return false;
        }
        handlers.push(callback.clone());
        true
    }

    /// Removes `callback` from `kind`. Returns `false` if it was not there.
    pub(crate) fn remove(&mut self, kind: EventKind, callback: &EventCallback) -> bool {
        let Some(handlers) = self.by_kind.get_mut(&kind) else {
            return false;
        };
        let Some(index) = handlers.iter().position(|h| h == callback) else {
            return false;
        };
        handlers.remove(index);
        if handlers.is_empty() {
            self.by_kind.remove(&kind);
        }
        true
    }

    pub(crate) fn contains(&self, kind: EventKind, callback: &EventCallback) -> bool {
        self.by_kind
            .get(&kind)
            .is_some_and(|handlers| handlers.contains(callback))
    }

    /// Copies the handlers for `kind`, so dispatch is unaffected by handlers
    /// that register or unregister others.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<EventCallback> {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }
}
