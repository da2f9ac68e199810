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

//! Defines the error type for event registration and marshaling.

use crate::event::EventKind;
use thiserror::Error;

/// An error raised while registering event kinds or converting events between
/// their native and typed representations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The kind already has a schema registered.
    #[error("event kind {0} is already registered")]
    DuplicateKind(EventKind),

    /// A raw integer has no corresponding member in the declared enumeration or flag-set.
    #[error("value {value} of field '{field}' is not a member of {type_name}")]
    UnknownEnumValue {
        /// The name of the enumeration or flag-set type.
        type_name: &'static str,
        /// The field being coerced.
        field: String,
        /// The raw value that failed to coerce.
        value: i64,
    },

    /// A field declared in the schema is absent from the native event.
    #[error("event {kind} is missing declared field '{field}'")]
    MissingField {
        /// The kind of the malformed event.
        kind: EventKind,
        /// The name of the missing field.
        field: String,
    },

    /// A raw value does not have the shape the declared field type requires.
    #[error("field '{field}' expected {expected}")]
    FieldType {
        /// The name of the offending field.
        field: String,
        /// A short description of the expected shape.
        expected: &'static str,
    },

    /// The dynamic kind range has been used up.
    #[error("no more custom event kinds can be allocated")]
    KindsExhausted,
}
