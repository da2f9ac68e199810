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

use super::kind::EventKind;
use super::schema::FieldValue;
use super::value::{NativeEvent, Value};
use std::collections::BTreeMap;

/// A schema-typed event, as seen by handlers.
///
/// Events produced by the marshaler keep the native event they came from, so
/// [`Event::to_native`] can hand it back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    name: &'static str,
    fields: BTreeMap<&'static str, FieldValue>,
    origin: Option<NativeEvent>,
}

impl Event {
    /// Creates an event with no fields and no origin.
    pub fn new(kind: EventKind, name: &'static str) -> Self {
        Self {
            kind,
            name,
            fields: BTreeMap::new(),
            origin: None,
        }
    }

    /// Sets a field, builder style.
    #[must_use]
    pub fn with(mut self, field: &'static str, value: FieldValue) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub(crate) fn with_origin(mut self, origin: NativeEvent) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The schema name of this event.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns a coerced field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns a field's raw value, whatever its declared type.
    pub fn raw(&self, field: &str) -> Option<Value> {
        self.get(field).map(FieldValue::to_raw)
    }

    /// Iterates over the coerced fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    /// The native event this one was marshaled from, if retained.
    pub fn origin(&self) -> Option<&NativeEvent> {
        self.origin.as_ref()
    }

    /// Returns a copy without its origin, forcing [`Event::to_native`] to
    /// synthesise the native fields.
    #[must_use]
    pub fn without_origin(&self) -> Self {
        Self {
            origin: None,
            ..self.clone()
        }
    }

    /// Converts back to a native event.
    ///
    /// Returns the retained origin unchanged, or synthesises one from the kind
    /// and the declared fields with enumerations and flags turned back into
    /// raw integers.
    pub fn to_native(&self) -> NativeEvent {
        if let Some(origin) = &self.origin {
            return origin.clone();
        }
        NativeEvent {
            kind: self.kind,
            fields: self
                .fields
                .iter()
                .map(|(name, value)| ((*name).to_owned(), value.to_raw()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_native_prefers_the_origin() {
        let origin = NativeEvent::new(EventKind::QUIT).with("extra", 1);
        let event = Event::new(EventKind::QUIT, "Quit").with_origin(origin.clone());
        assert_eq!(event.to_native(), origin);
    }

    #[test]
    fn to_native_synthesises_without_origin() {
        let event = Event::new(EventKind::TEXT_INPUT, "TextInput")
            .with("text", FieldValue::Plain(Value::from("hi")))
            .with_origin(NativeEvent::new(EventKind::TEXT_INPUT));
        let native = event.without_origin().to_native();
        assert_eq!(native.kind, EventKind::TEXT_INPUT);
        assert_eq!(native.get("text"), Some(&Value::from("hi")));
        assert!(event.origin().is_some(), "the original keeps its origin");
    }
}
