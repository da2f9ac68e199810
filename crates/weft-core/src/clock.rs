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

//! The monotonic time source every other component depends on.

use std::time::Duration;

/// A monotonic clock.
///
/// Instants are expressed as the [`Duration`] elapsed since an arbitrary,
/// implementation-defined origin. Two readings from the same clock never go
/// backwards, which is all the timer queue and the renderer rely on.
pub trait Clock: Send + Sync {
    /// Returns the current instant, measured from the clock's origin.
    fn now(&self) -> Duration;
}
