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

//! The schema table and the marshaler built on it.

use super::builtin;
use super::kind::EventKind;
use super::record::Event;
use super::schema::{EventSchema, FieldValue};
use super::typed::TypedEvent;
use super::value::NativeEvent;
use crate::error::EventError;
use std::collections::HashMap;

/// Maps event kinds to their schemas and converts native events into typed ones.
#[derive(Debug, Default, Clone)]
pub struct EventRegistry {
    schemas: HashMap<EventKind, EventSchema>,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in input events and the scheduler's
    /// synthetic events.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (kind, schema) in builtin::schemas() {
            // Built-in kinds are distinct constants.
            let _ = registry.register(kind, schema);
        }
        registry
    }

    /// Registers the schema for `kind`.
    ///
    /// ## Errors
    ///
    /// Fails with [`EventError::DuplicateKind`] if `kind` already has a schema.
    pub fn register(&mut self, kind: EventKind, schema: EventSchema) -> Result<(), EventError> {
        if self.schemas.contains_key(&kind) {
            return Err(EventError::DuplicateKind(kind));
        }
        log::debug!("Registered event kind {kind} as '{}'", schema.name);
        self.schemas.insert(kind, schema);
        Ok(())
    }

    /// Registers a schema under a kind obtained from `allocate`.
    ///
    /// This is the path for kinds declared at runtime; `allocate` is usually the
    /// native queue's kind allocator.
    pub fn register_new(
        &mut self,
        schema: EventSchema,
        allocate: impl FnOnce() -> Result<EventKind, EventError>,
    ) -> Result<EventKind, EventError> {
        let kind = allocate()?;
        self.register(kind, schema)?;
        Ok(kind)
    }

    /// Registers the schema of a typed event under its declared kind.
    pub fn register_typed<E: TypedEvent>(&mut self) -> Result<(), EventError> {
        self.register(E::KIND, E::schema())
    }

    /// Returns `true` if `kind` has a schema.
    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.schemas.contains_key(&kind)
    }

    /// Returns the schema registered for `kind`.
    pub fn schema(&self, kind: EventKind) -> Option<&EventSchema> {
        self.schemas.get(&kind)
    }

    /// Converts a native event into a typed one.
    ///
    /// ## Returns
    ///
    /// `Ok(None)` if the kind is not registered, otherwise the typed event with
    /// every declared field copied and coerced. The result keeps a copy of
    /// `native` as its origin.
    ///
    /// ## Errors
    ///
    /// [`EventError::MissingField`] if a declared field is absent, and
    /// [`EventError::UnknownEnumValue`] or [`EventError::FieldType`] if a raw
    /// value cannot be coerced.
    pub fn marshal(&self, native: &NativeEvent) -> Result<Option<Event>, EventError> {
        let Some(schema) = self.schemas.get(&native.kind) else {
            return Ok(None);
        };
        let mut event = Event::new(native.kind, schema.name);
        for field in &schema.fields {
            let raw = native.get(field.name).ok_or_else(|| EventError::MissingField {
                kind: native.kind,
                field: field.name.to_owned(),
            })?;
            event = event.with(field.name, FieldValue::coerce(field, raw)?);
        }
        Ok(Some(event.with_origin(native.clone())))
    }
}
