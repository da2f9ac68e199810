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

use crate::error::EventError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// The discriminator of an event.
///
/// Kinds below [`EventKind::USER_BASE`] are reserved for the platform and the
/// scheduler. `USER_BASE..DYNAMIC_BASE` is free for applications that declare
/// their kinds statically, and everything from [`EventKind::DYNAMIC_BASE`] up to
/// [`EventKind::MAX`] is handed out at runtime by a [`KindAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKind(pub u32);

impl EventKind {
    /// The user asked the application to quit.
    pub const QUIT: Self = Self(0x100);
    /// A key was pressed.
    pub const KEY_DOWN: Self = Self(0x300);
    /// A key was released.
    pub const KEY_UP: Self = Self(0x301);
    /// Text was entered.
    pub const TEXT_INPUT: Self = Self(0x303);
    /// The pointer moved.
    pub const MOUSE_MOTION: Self = Self(0x400);
    /// A mouse button was pressed.
    pub const MOUSE_BUTTON_DOWN: Self = Self(0x401);
    /// A mouse button was released.
    pub const MOUSE_BUTTON_UP: Self = Self(0x402);
    /// The mouse wheel was scrolled.
    pub const MOUSE_WHEEL: Self = Self(0x403);

    /// Synthetic: run a parked immediate or timer callback.
    pub const EXECUTE_CALLBACK: Self = Self(0x7F00);
    /// Synthetic: poll a cooperative task.
    pub const TASK_WAKE: Self = Self(0x7F01);
    /// Synthetic: run a callback handed over from another thread.
    pub const REMOTE_CALLBACK: Self = Self(0x7F02);

    /// The window was resized.
    pub const VIDEO_RESIZE: Self = Self(0x8001);

    /// First kind available to statically declared application events.
    pub const USER_BASE: u32 = 0x8100;
    /// First kind handed out by the dynamic allocator.
    pub const DYNAMIC_BASE: u32 = 0x8800;
    /// Last valid kind.
    pub const MAX: u32 = 0xFFFF;

    /// Returns the `index`-th statically declared application kind.
    ///
    /// # Panics
    ///
    /// Panics if `index` would leave the static application range. In a `const`
    /// context this is a compile error.
    pub const fn user(index: u32) -> Self {
        assert!(
            index < Self::DYNAMIC_BASE - Self::USER_BASE,
            "static user event kind out of range"
        );
        Self(Self::USER_BASE + index)
    }

    /// Returns the raw kind value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the kinds the scheduler posts to itself.
    pub const fn is_synthetic(self) -> bool {
        matches!(self.0, 0x7F00..=0x7F02)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Hands out process-unique event kinds from the dynamic range.
///
/// The allocator never returns a kind below [`EventKind::DYNAMIC_BASE`], so a
/// dynamically declared kind can never collide with a reserved or statically
/// declared one.
#[derive(Debug)]
pub struct KindAllocator {
    next: AtomicU32,
}

static GLOBAL_ALLOCATOR: KindAllocator = KindAllocator::new();

impl KindAllocator {
    /// Creates an allocator starting at the beginning of the dynamic range.
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(EventKind::DYNAMIC_BASE),
        }
    }

    /// Returns the process-wide allocator.
    pub fn global() -> &'static KindAllocator {
        &GLOBAL_ALLOCATOR
    }

    /// Allocates a fresh kind.
    pub fn allocate(&self) -> Result<EventKind, EventError> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next <= EventKind::MAX).then_some(next + 1)
            })
            .map(EventKind)
            .map_err(|_| EventError::KindsExhausted)
    }
}

impl Default for KindAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_kinds_are_unique_and_outside_reserved_ranges() {
        let allocator = KindAllocator::new();
        let a = allocator.allocate().unwrap();
        let b = allocator.allocate().unwrap();
        assert_ne!(a, b);
        assert!(a.raw() >= EventKind::DYNAMIC_BASE);
        assert!(b > a, "kinds should be handed out in increasing order");
    }

    #[test]
    fn allocator_reports_exhaustion() {
        let allocator = KindAllocator {
            next: AtomicU32::new(EventKind::MAX),
        };
        assert_eq!(allocator.allocate(), Ok(EventKind(EventKind::MAX)));
        assert_eq!(allocator.allocate(), Err(EventError::KindsExhausted));
    }

    #[test]
    fn user_kinds_live_between_reserved_and_dynamic_ranges() {
        let kind = EventKind::user(3);
        assert_eq!(kind.raw(), EventKind::USER_BASE + 3);
        assert!(kind.raw() < EventKind::DYNAMIC_BASE);
        assert!(!kind.is_synthetic());
        assert!(EventKind::TASK_WAKE.is_synthetic());
    }
}
