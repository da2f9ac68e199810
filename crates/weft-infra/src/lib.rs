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

//! Concrete implementations of the `weft-core` platform contracts.
//!
//! - [`SystemClock`] and [`ManualClock`] implement [`weft_core::Clock`].
//! - [`ChannelQueue`] is a blocking, thread-safe native queue backed by a
//!   `flume` channel. [`ScriptedQueue`] replays pre-loaded events in virtual time.
//! - [`HeadlessSurface`] is a render surface that only counts frames.

pub mod clock;
pub mod queue;
pub mod surface;

pub use clock::{ManualClock, SystemClock};
pub use queue::{ChannelQueue, ScriptedQueue};
pub use surface::HeadlessSurface;
