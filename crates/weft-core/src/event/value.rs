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
use super::record::Event;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An untyped field value as carried by the native queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An absent or null value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// An integer. Enumerations and flag-sets travel in this form.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Text(String),
    /// An ordered group of values, e.g. a position `(x, y)`.
    Tuple(Vec<Value>),
}

impl Value {
    /// Returns the integer if this is an [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the number as a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string if this is a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::Tuple`].
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<(i64, i64)> for Value {
    fn from((a, b): (i64, i64)) -> Self {
        Value::Tuple(vec![Value::Int(a), Value::Int(b)])
    }
}

/// An opaque record produced by (or posted to) the native event queue.
///
/// A native event is just a kind tag and an untyped field map. The registry's
/// marshaler turns it into a schema-typed [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEvent {
    /// The kind tag.
    pub kind: EventKind,
    /// The untyped fields, keyed by name.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl NativeEvent {
    /// Creates a native event with no fields.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Either representation of an event, selected by an explicit variant.
///
/// This is what callers hand to the scheduler's `post_event`: typed events are
/// converted with [`Event::to_native`] before they are enqueued.
#[derive(Debug, Clone)]
pub enum AnyEvent {
    /// A raw event, posted as-is.
    Native(NativeEvent),
    /// A typed event, converted back to its native form first.
    Typed(Event),
}

impl AnyEvent {
    /// Returns the kind of the wrapped event.
    pub fn kind(&self) -> EventKind {
        match self {
            AnyEvent::Native(native) => native.kind,
            AnyEvent::Typed(event) => event.kind(),
        }
    }

    /// Converts to the native representation.
    pub fn into_native(self) -> NativeEvent {
        match self {
            AnyEvent::Native(native) => native,
            AnyEvent::Typed(event) => event.to_native(),
        }
    }
}

impl From<NativeEvent> for AnyEvent {
    fn from(event: NativeEvent) -> Self {
        AnyEvent::Native(event)
    }
}

impl From<Event> for AnyEvent {
    fn from(event: Event) -> Self {
        AnyEvent::Typed(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_event_builder_collects_fields() {
        let event = NativeEvent::new(EventKind::KEY_DOWN)
            .with("key", 97)
            .with("unicode", "a")
            .with("pos", (3i64, 4i64));
        assert_eq!(event.get("key"), Some(&Value::Int(97)));
        assert_eq!(event.get("unicode").and_then(Value::as_text), Some("a"));
        assert_eq!(
            event.get("pos").and_then(Value::as_tuple).map(<[Value]>::len),
            Some(2)
        );
        assert!(event.get("missing").is_none());
    }

    #[test]
    fn native_event_round_trips_through_json() {
        let event = NativeEvent::new(EventKind::MOUSE_WHEEL)
            .with("x", 1)
            .with("precise_y", 0.5)
            .with("touch", false);
        let json = serde_json::to_string(&event).unwrap();
        let back: NativeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn any_event_reports_kind_of_either_variant() {
        let native = AnyEvent::from(NativeEvent::new(EventKind::QUIT));
        assert_eq!(native.kind(), EventKind::QUIT);
        assert_eq!(native.into_native().kind, EventKind::QUIT);
    }
}
