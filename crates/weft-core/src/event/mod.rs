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

//! The event data model.
//!
//! Native events arrive as a kind plus an untyped field map ([`NativeEvent`]).
//! The [`EventRegistry`] holds one [`EventSchema`] per kind and marshals native
//! events into typed [`Event`]s, coercing enumeration and flag fields on the way.

pub mod builtin;
pub mod keyboard;
mod kind;
pub mod mouse;
mod record;
mod registry;
mod schema;
pub mod typed;
mod value;

pub use kind::{EventKind, KindAllocator};
pub use record::Event;
pub use registry::EventRegistry;
pub use schema::{EnumSpec, EventSchema, FieldSpec, FieldType, FieldValue, FlagSpec};
pub use typed::{FieldCodec, TypedEvent};
pub use value::{AnyEvent, NativeEvent, Value};
