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

//! Compile-time typed events.
//!
//! A [`TypedEvent`] ties a Rust struct to an event kind and its schema, so a
//! handler can name the event type and get the kind for free. The
//! [`typed_event!`](crate::typed_event), [`event_enum!`](crate::event_enum) and
//! [`event_flags!`](crate::event_flags) macros generate the boilerplate.

use super::kind::EventKind;
use super::record::Event;
use super::schema::{EventSchema, FieldType, FieldValue};
use super::value::Value;
use crate::error::EventError;

/// An event with a statically known kind and schema.
pub trait TypedEvent: Sized + 'static {
    /// The kind this event is registered under.
    const KIND: EventKind;

    /// Returns the schema describing the native fields of this event.
    fn schema() -> EventSchema;

    /// Extracts the typed fields from a marshaled event.
    fn from_event(event: &Event) -> Result<Self, EventError>;

    /// Builds an event carrying this value's fields. The result has no origin.
    fn to_event(&self) -> Event;
}

/// A Rust type that can be stored in a typed event field.
pub trait FieldCodec: Sized {
    /// The declared type of the field in the schema.
    fn field_type() -> FieldType {
        FieldType::Plain
    }

    /// Reads the value back from a coerced field.
    fn decode(field: &str, value: &FieldValue) -> Result<Self, EventError>;

    /// Converts the value into a field.
    fn encode(&self) -> FieldValue;
}

fn mismatch(field: &str, expected: &'static str) -> EventError {
    EventError::FieldType {
        field: field.to_owned(),
        expected,
    }
}

fn plain<'a>(field: &str, value: &'a FieldValue, expected: &'static str) -> Result<&'a Value, EventError> {
    value.as_plain().ok_or_else(|| mismatch(field, expected))
}

impl FieldCodec for i64 {
    fn decode(field: &str, value: &FieldValue) -> Result<Self, EventError> {
        plain(field, value, "an integer")?
            .as_int()
            .ok_or_else(|| mismatch(field, "an integer"))
    }

    fn encode(&self) -> FieldValue {
        FieldValue::Plain(Value::Int(*self))
    }
}

impl FieldCodec for f64 {
    fn decode(field: &str, value: &FieldValue) -> Result<Self, EventError> {
        plain(field, value, "a number")?
            .as_float()
            .ok_or_else(|| mismatch(field, "a number"))
    }

    fn encode(&self) -> FieldValue {
        FieldValue::Plain(Value::Float(*self))
    }
}

impl FieldCodec for bool {
    fn decode(field: &str, value: &FieldValue) -> Result<Self, EventError> {
        let value = plain(field, value, "a boolean")?;
        // The native queue reports some flags as 0/1 integers.
        value
            .as_bool()
            .or_else(|| value.as_int().map(|v| v != 0))
            .ok_or_else(|| mismatch(field, "a boolean"))
    }

    fn encode(&self) -> FieldValue {
        FieldValue::Plain(Value::Bool(*self))
    }
}

impl FieldCodec for String {
    fn decode(field: &str, value: &FieldValue) -> Result<Self, EventError> {
        plain(field, value, "a string")?
            .as_text()
            .map(str::to_owned)
            .ok_or_else(|| mismatch(field, "a string"))
    }

    fn encode(&self) -> FieldValue {
        FieldValue::Plain(Value::Text(self.clone()))
    }
}

fn ints<const N: usize>(field: &str, value: &FieldValue) -> Result<[i64; N], EventError> {
    const EXPECTED: &str = "a tuple of integers";
    let items = plain(field, value, EXPECTED)?
        .as_tuple()
        .ok_or_else(|| mismatch(field, EXPECTED))?;
    if items.len() != N {
        return Err(mismatch(field, EXPECTED));
    }
    let mut out = [0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_int().ok_or_else(|| mismatch(field, EXPECTED))?;
    }
    Ok(out)
}

impl FieldCodec for (i64, i64) {
    fn decode(field: &str, value: &FieldValue) -> Result<Self, EventError> {
        let [a, b] = ints(field, value)?;
        Ok((a, b))
    }

    fn encode(&self) -> FieldValue {
        FieldValue::Plain(Value::from(*self))
    }
}

impl FieldCodec for (i64, i64, i64) {
    fn decode(field: &str, value: &FieldValue) -> Result<Self, EventError> {
        let [a, b, c] = ints(field, value)?;
        Ok((a, b, c))
    }

    fn encode(&self) -> FieldValue {
        FieldValue::Plain(Value::Tuple(vec![
            Value::Int(self.0),
            Value::Int(self.1),
            Value::Int(self.2),
        ]))
    }
}

/// Reads a declared field out of `event`. Used by [`typed_event!`](crate::typed_event).
#[doc(hidden)]
pub fn decode_field<T: FieldCodec>(event: &Event, field: &'static str) -> Result<T, EventError> {
    let value = event.get(field).ok_or_else(|| EventError::MissingField {
        kind: event.kind(),
        field: field.to_owned(),
    })?;
    T::decode(field, value)
}

/// Declares a struct as a [`TypedEvent`].
///
/// Each field names the native field it is read from. The kind goes in square
/// brackets after the struct name.
///
/// ```
/// use weft_core::{typed_event, EventKind, TypedEvent};
///
/// typed_event! {
///     /// A score update.
///     pub struct Scored [EventKind::user(0)] {
///         points: i64 => "points",
///         player: String => "who",
///     }
/// }
///
/// assert_eq!(Scored::KIND, EventKind::user(0));
/// assert_eq!(Scored::schema().fields.len(), 2);
/// ```
#[macro_export]
macro_rules! typed_event {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident [$kind:expr] {
            $(
                $(#[$field_attr:meta])*
                $field:ident : $ty:ty => $native:literal
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_attr])*
                pub $field: $ty,
            )*
        }

        impl $crate::event::TypedEvent for $name {
            const KIND: $crate::event::EventKind = $kind;

            fn schema() -> $crate::event::EventSchema {
                $crate::event::EventSchema::new(stringify!($name))
                    $( .field($native, <$ty as $crate::event::FieldCodec>::field_type()) )*
            }

            #[allow(unused_variables)]
            fn from_event(event: &$crate::event::Event) -> Result<Self, $crate::EventError> {
                Ok(Self {
                    $( $field: $crate::event::typed::decode_field::<$ty>(event, $native)?, )*
                })
            }

            fn to_event(&self) -> $crate::event::Event {
                $crate::event::Event::new(<Self as $crate::event::TypedEvent>::KIND, stringify!($name))
                    $( .with($native, $crate::event::FieldCodec::encode(&self.$field)) )*
            }
        }
    };
}

/// Declares an enumeration carried as a raw integer.
///
/// An optional `fallback = Variant;` clause names the member that absorbs raw
/// values with no exact match. Without it, unknown values fail to marshal.
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_attr:meta])*
                $variant:ident = $raw:expr
            ),+ $(,)?
        }
        $( fallback = $fallback:ident; )?
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i64)]
        $vis enum $name {
            $(
                $(#[$variant_attr])*
                $variant = $raw,
            )+
        }

        impl $name {
            /// Returns the static description used by event schemas.
            pub fn spec() -> &'static $crate::event::EnumSpec {
                static SPEC: $crate::event::EnumSpec = $crate::event::EnumSpec {
                    name: stringify!($name),
                    members: &[ $( (stringify!($variant), $raw) ),+ ],
                    fallback: $crate::__event_enum_fallback!($($fallback)?),
                };
                &SPEC
            }

            /// Returns the member with exactly this raw value.
            pub fn from_raw(raw: i64) -> Option<Self> {
                $( if raw == $raw { return Some(Self::$variant); } )+
                None
            }

            /// Returns the raw value of this member.
            pub const fn raw(self) -> i64 {
                self as i64
            }

            /// Returns the member name.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }

            fn from_member(member: &str) -> Option<Self> {
                $( if member == stringify!($variant) { return Some(Self::$variant); } )+
                None
            }
        }

        impl $crate::event::FieldCodec for $name {
            fn field_type() -> $crate::event::FieldType {
                $crate::event::FieldType::Enum(Self::spec())
            }

            fn decode(field: &str, value: &$crate::event::FieldValue) -> Result<Self, $crate::EventError> {
                let member = match value {
                    $crate::event::FieldValue::Enum { member, .. } => *member,
                    $crate::event::FieldValue::Plain(raw) => {
                        let raw = raw.as_int().ok_or_else(|| $crate::EventError::FieldType {
                            field: field.to_owned(),
                            expected: "an integer",
                        })?;
                        Self::spec().coerce(field, raw)?
                    }
                    $crate::event::FieldValue::Flags { raw, .. } => Self::spec().coerce(field, *raw)?,
                };
                Self::from_member(member).ok_or_else(|| $crate::EventError::UnknownEnumValue {
                    type_name: stringify!($name),
                    field: field.to_owned(),
                    value: value.to_raw().as_int().unwrap_or_default(),
                })
            }

            fn encode(&self) -> $crate::event::FieldValue {
                $crate::event::FieldValue::Enum {
                    spec: Self::spec(),
                    member: self.name(),
                    raw: self.raw(),
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __event_enum_fallback {
    () => {
        None
    };
    ($fallback:ident) => {
        Some(stringify!($fallback))
    };
}

/// Declares a flag-set carried as a raw integer.
///
/// The generated type is a thin wrapper over the raw bits with the usual set
/// operations. Raw values with undeclared bits fail to marshal.
#[macro_export]
macro_rules! event_flags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$flag_attr:meta])*
                const $flag:ident = $bits:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: i64,
        }

        impl $name {
            /// No flags set.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag: Self = Self { bits: $bits };
            )*

            /// Returns the static description used by event schemas.
            pub fn spec() -> &'static $crate::event::FlagSpec {
                static SPEC: $crate::event::FlagSpec = $crate::event::FlagSpec {
                    name: stringify!($name),
                    members: &[ $( (stringify!($flag), $bits) ),* ],
                };
                &SPEC
            }

            /// Builds a set from raw bits, rejecting undeclared bits.
            pub fn from_bits(bits: i64) -> Option<Self> {
                (bits & !Self::spec().all_bits() == 0).then_some(Self { bits })
            }

            /// Returns the raw bits.
            pub const fn bits(&self) -> i64 {
                self.bits
            }

            /// Returns `true` if every flag in `other` is set.
            pub const fn contains(&self, other: Self) -> bool {
                self.bits & other.bits == other.bits
            }

            /// Returns `true` if any flag in `other` is set.
            pub const fn intersects(&self, other: Self) -> bool {
                self.bits & other.bits != 0
            }

            /// Returns `true` if no flag is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns a copy with `other` set.
            #[must_use]
            pub const fn with(mut self, other: Self) -> Self {
                self.bits |= other.bits;
                self
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl $crate::event::FieldCodec for $name {
            fn field_type() -> $crate::event::FieldType {
                $crate::event::FieldType::Flags(Self::spec())
            }

            fn decode(field: &str, value: &$crate::event::FieldValue) -> Result<Self, $crate::EventError> {
                let raw = value.to_raw().as_int().ok_or_else(|| $crate::EventError::FieldType {
                    field: field.to_owned(),
                    expected: "an integer",
                })?;
                Self::spec().decompose(field, raw)?;
                Ok(Self { bits: raw })
            }

            fn encode(&self) -> $crate::event::FieldValue {
                let spec = Self::spec();
                $crate::event::FieldValue::Flags {
                    spec,
                    members: spec
                        .members
                        .iter()
                        .filter(|(_, bits)| *bits != 0 && self.bits & bits == *bits)
                        .map(|(name, _)| *name)
                        .collect(),
                    raw: self.bits,
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::registry::EventRegistry;
    use crate::event::value::NativeEvent;

    crate::event_enum! {
        enum Direction {
            Up = 1,
            Down = 2,
        }
    }

    crate::event_enum! {
        enum Tool {
            Unknown = 0,
            Pen = 1,
        }
        fallback = Unknown;
    }

    crate::event_flags! {
        struct Layers {
            const BACK = 0x1;
            const FRONT = 0x2;
        }
    }

    crate::typed_event! {
        struct Moved [EventKind::user(1)] {
            direction: Direction => "dir",
            tool: Tool => "tool",
            layers: Layers => "layers",
            at: (i64, i64) => "pos",
            label: String => "label",
        }
    }

    crate::typed_event! {
        struct Ping [EventKind::user(2)] {}
    }

    fn registry() -> EventRegistry {
        let mut registry = EventRegistry::new();
        registry.register_typed::<Moved>().unwrap();
        registry.register_typed::<Ping>().unwrap();
        registry
    }

    #[test]
    fn typed_event_reads_marshaled_fields() {
        let native = NativeEvent::new(Moved::KIND)
            .with("dir", 2)
            .with("tool", 1)
            .with("layers", 0x3)
            .with("pos", (10i64, 20i64))
            .with("label", "x");
        let event = registry().marshal(&native).unwrap().unwrap();
        let moved = Moved::from_event(&event).unwrap();
        assert_eq!(moved.direction, Direction::Down);
        assert_eq!(moved.tool, Tool::Pen);
        assert!(moved.layers.contains(Layers::BACK | Layers::FRONT));
        assert_eq!(moved.at, (10, 20));
        assert_eq!(moved.label, "x");
    }

    #[test]
    fn to_event_synthesises_the_same_native_fields() {
        let moved = Moved {
            direction: Direction::Up,
            tool: Tool::Pen,
            layers: Layers::FRONT,
            at: (1, 2),
            label: "y".into(),
        };
        let native = moved.to_event().to_native();
        assert_eq!(native.get("dir"), Some(&Value::Int(1)));
        assert_eq!(native.get("layers"), Some(&Value::Int(0x2)));
        let back = registry().marshal(&native).unwrap().unwrap();
        assert_eq!(Moved::from_event(&back).unwrap(), moved);
    }

    #[test]
    fn enum_without_fallback_rejects_unknown_raw_values() {
        let native = NativeEvent::new(Moved::KIND)
            .with("dir", 9)
            .with("tool", 1)
            .with("layers", 0)
            .with("pos", (0i64, 0i64))
            .with("label", "");
        assert!(matches!(
            registry().marshal(&native),
            Err(EventError::UnknownEnumValue { type_name: "Direction", value: 9, .. })
        ));
    }

    #[test]
    fn enum_with_fallback_absorbs_unknown_raw_values() {
        let native = NativeEvent::new(Moved::KIND)
            .with("dir", 1)
            .with("tool", 77)
            .with("layers", 0)
            .with("pos", (0i64, 0i64))
            .with("label", "");
        let event = registry().marshal(&native).unwrap().unwrap();
        assert_eq!(Moved::from_event(&event).unwrap().tool, Tool::Unknown);
        assert_eq!(event.raw("tool"), Some(Value::Int(77)));
    }

    #[test]
    fn fieldless_events_work() {
        let event = registry()
            .marshal(&NativeEvent::new(Ping::KIND))
            .unwrap()
            .unwrap();
        assert_eq!(Ping::from_event(&event).unwrap(), Ping {});
        assert!(Ping::schema().fields.is_empty());
    }

    #[test]
    fn flags_reject_undeclared_bits() {
        assert_eq!(Layers::from_bits(0x3), Some(Layers::BACK | Layers::FRONT));
        assert_eq!(Layers::from_bits(0x4), None);
        assert!(Layers::EMPTY.is_empty());
    }

    #[test]
    fn bool_fields_accept_integer_flags() {
        let value = FieldValue::Plain(Value::Int(1));
        assert!(bool::decode("touch", &value).unwrap());
    }
}
