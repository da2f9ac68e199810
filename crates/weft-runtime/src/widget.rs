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


//! Capabilities for UI components composed under the renderer.
//!
//! A widget subscribes its handlers in [`Enableable::enable`] and draws itself
//! in [`Widget::draw`]. It needs nothing else from the scheduler.

use crate::registration::{HandlerRegistration, RegistrationGuard};
use crate::scheduler::Scheduler;
use std::rc::Rc;
use weft_core::RenderSurface;

/// Keeps a component's handlers registered until dropped.
#[must_use = "the component is disabled as soon as the guard is dropped"]
#[derive(Debug, Default)]
pub struct EnableGuard {
    guards: Vec<RegistrationGuard>,
}

impl EnableGuard {
    /// A guard holding nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Enters every registration and holds the resulting guards.
    pub fn from_registrations<'a>(registrations: impl IntoIterator<Item = &'a HandlerRegistration>) -> Self {
        Self {
            guards: registrations.into_iter().map(HandlerRegistration::enter).collect(),
        }
    }

    /// Adds a registration guard.
    pub fn push(&mut self, guard: RegistrationGuard) {
        self.guards.push(guard);
    }

    /// Takes over every guard held by `other`.
    pub fn merge(&mut self, mut other: EnableGuard) {
        self.guards.append(&mut other.guards);
    }

    /// Number of registrations held.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Returns `true` if no registration is held.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Unregisters everything now. Same as dropping the guard.
    pub fn disable(self) {}
}

/// Something that can subscribe its handlers to a scheduler.
pub trait Enableable {
    /// Registers the component's handlers until the returned guard is dropped.
    fn enable(&self, scheduler: &Scheduler) -> EnableGuard;
}

/// A drawable component.
pub trait Widget: Enableable {
    /// Draws the component. `scale` is the scheduler's current scale factor.
    fn draw(&self, surface: &mut dyn RenderSurface, scale: f64);
}

/// A list of widgets enabled and drawn together, in insertion order.
#[derive(Default)]
pub struct WidgetGroup {
    children: Vec<Rc<dyn Widget>>,
}

impl WidgetGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child.
    pub fn push(&mut self, widget: Rc<dyn Widget>) {
        self.children.push(widget);
    }

    /// Adds a child, builder style.
    #[must_use]
    pub fn with(mut self, widget: Rc<dyn Widget>) -> Self {
        self.push(widget);
        self
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Enableable for WidgetGroup {
    fn enable(&self, scheduler: &Scheduler) -> EnableGuard {
        let mut guard = EnableGuard::empty();
        for child in &self.children {
            guard.merge(child.enable(scheduler));
        }
        guard
    }
}

impl Widget for WidgetGroup {
    fn draw(&self, surface: &mut dyn RenderSurface, scale: f64) {
        for child in &self.children {
            child.draw(surface, scale);
        }
    }
}
