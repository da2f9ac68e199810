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

//! Field schemas and the coercion between raw values and declared field types.

use super::value::Value;
use crate::error::EventError;

/// The static description of an enumeration carried as a raw integer.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumSpec {
    /// The type name, used in error messages.
    pub name: &'static str,
    /// `(member name, raw value)` pairs.
    pub members: &'static [(&'static str, i64)],
    /// A member that absorbs raw values with no exact match.
    ///
    /// Must name one of `members`. When `None`, unknown values are an error.
    pub fallback: Option<&'static str>,
}

impl EnumSpec {
    /// Returns the member with the given raw value, ignoring the fallback.
    pub fn member(&self, raw: i64) -> Option<&'static str> {
        self.members
            .iter()
            .find(|(_, value)| *value == raw)
            .map(|(name, _)| *name)
    }

    /// Returns the raw value of a member.
    pub fn raw(&self, member: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(name, _)| *name == member)
            .map(|(_, value)| *value)
    }

    /// Coerces a raw value, falling back to the declared fallback member if any.
    pub fn coerce(&self, field: &str, raw: i64) -> Result<&'static str, EventError> {
        self.member(raw)
            .or(self.fallback)
            .ok_or_else(|| EventError::UnknownEnumValue {
                type_name: self.name,
                field: field.to_owned(),
                value: raw,
            })
    }
}

/// The static description of a flag-set carried as a raw integer.
#[derive(Debug, PartialEq, Eq)]
pub struct FlagSpec {
    /// The type name, used in error messages.
    pub name: &'static str,
    /// `(member name, bit mask)` pairs.
    pub members: &'static [(&'static str, i64)],
}

impl FlagSpec {
    /// Returns the union of every declared member.
    pub fn all_bits(&self) -> i64 {
        self.members.iter().fold(0, |acc, (_, bits)| acc | bits)
    }

    /// Splits a raw value into the members it contains.
    ///
    /// Any bit not covered by a declared member fails with
    /// [`EventError::UnknownEnumValue`]. Zero decomposes into an empty set.
    pub fn decompose(&self, field: &str, raw: i64) -> Result<Vec<&'static str>, EventError> {
        if raw & !self.all_bits() != 0 {
            return Err(EventError::UnknownEnumValue {
                type_name: self.name,
                field: field.to_owned(),
                value: raw,
            });
        }
        Ok(self
            .members
            .iter()
            .filter(|(_, bits)| *bits != 0 && raw & bits == *bits)
            .map(|(name, _)| *name)
            .collect())
    }
}

/// How a declared field is coerced from its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Copied through unchanged.
    Plain,
    /// A raw integer coerced into an enumeration member.
    Enum(&'static EnumSpec),
    /// A raw integer decomposed into flag members.
    Flags(&'static FlagSpec),
}

/// One declared field of an event schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// The field name, as it appears in the native field map.
    pub name: &'static str,
    /// The declared type.
    pub ty: FieldType,
}

/// The fixed field list of an event kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSchema {
    /// A human readable name for the kind, e.g. `KeyDown`.
    pub name: &'static str,
    /// The declared fields, in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl EventSchema {
    /// Creates a schema with no fields.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Declares a field, builder style.
    #[must_use]
    pub fn field(mut self, name: &'static str, ty: FieldType) -> Self {
        self.fields.push(FieldSpec { name, ty });
        self
    }

    /// Declares a plain field.
    #[must_use]
    pub fn plain(self, name: &'static str) -> Self {
        self.field(name, FieldType::Plain)
    }
}

/// A field value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An uncoerced value.
    Plain(Value),
    /// An enumeration member, with the raw value it came from.
    Enum {
        /// The enumeration the member belongs to.
        spec: &'static EnumSpec,
        /// The member name.
        member: &'static str,
        /// The raw value. Differs from the member's value when the fallback was used.
        raw: i64,
    },
    /// A flag-set.
    Flags {
        /// The flag-set the members belong to.
        spec: &'static FlagSpec,
        /// The contained members, in declaration order.
        members: Vec<&'static str>,
        /// The raw value.
        raw: i64,
    },
}

impl FieldValue {
    /// Coerces a raw value into the declared type of `field`.
    pub fn coerce(field: &FieldSpec, value: &Value) -> Result<Self, EventError> {
        let raw_int = || {
            value.as_int().ok_or_else(|| EventError::FieldType {
                field: field.name.to_owned(),
                expected: "an integer",
            })
        };
        match field.ty {
            FieldType::Plain => Ok(FieldValue::Plain(value.clone())),
            FieldType::Enum(spec) => {
                let raw = raw_int()?;
                let member = spec.coerce(field.name, raw)?;
                Ok(FieldValue::Enum { spec, member, raw })
            }
            FieldType::Flags(spec) => {
                let raw = raw_int()?;
                let members = spec.decompose(field.name, raw)?;
                Ok(FieldValue::Flags { spec, members, raw })
            }
        }
    }

    /// Converts back to the raw representation.
    pub fn to_raw(&self) -> Value {
        match self {
            FieldValue::Plain(value) => value.clone(),
            FieldValue::Enum { raw, .. } | FieldValue::Flags { raw, .. } => Value::Int(*raw),
        }
    }

    /// Returns the value if the field is plain.
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            FieldValue::Plain(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the member name if the field is an enumeration.
    pub fn as_member(&self) -> Option<&'static str> {
        match self {
            FieldValue::Enum { member, .. } => Some(member),
            _ => None,
        }
    }

    /// Returns `true` if the field is a flag-set containing `member`.
    pub fn has_flag(&self, member: &str) -> bool {
        match self {
            FieldValue::Flags { members, .. } => members.contains(&member),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLOR: EnumSpec = EnumSpec {
        name: "Color",
        members: &[("Red", 1), ("Green", 2)],
        fallback: None,
    };

    static SHAPE: EnumSpec = EnumSpec {
        name: "Shape",
        members: &[("Unknown", 0), ("Circle", 1)],
        fallback: Some("Unknown"),
    };

    static STYLE: FlagSpec = FlagSpec {
        name: "Style",
        members: &[("Bold", 0x1), ("Italic", 0x2), ("Underline", 0x8)],
    };

    fn spec(name: &'static str, ty: FieldType) -> FieldSpec {
        FieldSpec { name, ty }
    }

    #[test]
    fn enum_coercion_maps_known_values() {
        let value = FieldValue::coerce(&spec("c", FieldType::Enum(&COLOR)), &Value::Int(2)).unwrap();
        assert_eq!(value.as_member(), Some("Green"));
        assert_eq!(value.to_raw(), Value::Int(2));
    }

    #[test]
    fn enum_coercion_rejects_unknown_values_without_fallback() {
        let err = FieldValue::coerce(&spec("c", FieldType::Enum(&COLOR)), &Value::Int(9)).unwrap_err();
        assert_eq!(
            err,
            EventError::UnknownEnumValue {
                type_name: "Color",
                field: "c".into(),
                value: 9
            }
        );
    }

    #[test]
    fn enum_fallback_keeps_the_raw_value() {
        let value = FieldValue::coerce(&spec("s", FieldType::Enum(&SHAPE)), &Value::Int(42)).unwrap();
        assert_eq!(value.as_member(), Some("Unknown"));
        assert_eq!(value.to_raw(), Value::Int(42), "fallback must not lose the raw value");
    }

    #[test]
    fn flags_decompose_into_members() {
        let value = FieldValue::coerce(&spec("f", FieldType::Flags(&STYLE)), &Value::Int(0x9)).unwrap();
        assert!(value.has_flag("Bold"));
        assert!(value.has_flag("Underline"));
        assert!(!value.has_flag("Italic"));
        assert_eq!(value.to_raw(), Value::Int(0x9));
    }

    #[test]
    fn flags_accept_zero_and_reject_undeclared_bits() {
        let empty = STYLE.decompose("f", 0).unwrap();
        assert!(empty.is_empty());
        assert!(matches!(
            STYLE.decompose("f", 0x4),
            Err(EventError::UnknownEnumValue { value: 0x4, .. })
        ));
    }

    #[test]
    fn coerced_fields_require_integers() {
        let err = FieldValue::coerce(&spec("c", FieldType::Enum(&COLOR)), &Value::from("red")).unwrap_err();
        assert!(matches!(err, EventError::FieldType { .. }));
    }

    #[test]
    fn schema_builder_keeps_declaration_order() {
        let schema = EventSchema::new("Sample")
            .plain("a")
            .field("b", FieldType::Enum(&COLOR))
            .plain("c");
        let names: Vec<_> = schema.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
