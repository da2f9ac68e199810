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

//! # Weft Core
//!
//! Foundational crate containing the event data model, the schema registry and
//! marshaler, and the interface contracts (clock, native queue, render surface)
//! that the scheduler in `weft-runtime` is built on.
//!
//! Nothing in this crate owns a thread or runs a loop. Concrete implementations of
//! the contracts live in `weft-infra`.

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod event;
pub mod platform;
pub mod step;

pub use clock::Clock;
pub use error::EventError;
pub use event::{builtin, keyboard, mouse};
pub use event::{
    AnyEvent, Event, EventKind, EventRegistry, EventSchema, FieldSpec, FieldType, FieldValue,
    KindAllocator, NativeEvent, TypedEvent, Value,
};
pub use platform::{NativeQueue, RenderSurface};
pub use step::Step;
