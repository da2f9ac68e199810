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


use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use weft_core::RenderSurface;

#[derive(Debug)]
struct Shared {
    frames: AtomicU64,
    width: AtomicU32,
    height: AtomicU32,
}

/// A render surface with no window behind it.
///
/// Clones share state, so a test can keep one clone and hand the other to the
/// scheduler, then observe presented frames and resizes.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    shared: Arc<Shared>,
}

impl HeadlessSurface {
    /// Creates a surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                frames: AtomicU64::new(0),
                width: AtomicU32::new(width),
                height: AtomicU32::new(height),
            }),
        }
    }

    /// Returns the number of frames presented so far.
    pub fn frames(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }
}

impl RenderSurface for HeadlessSurface {
    fn present_frame(&mut self) {
        self.shared.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn size(&self) -> (u32, u32) {
        (
            self.shared.width.load(Ordering::Relaxed),
            self.shared.height.load(Ordering::Relaxed),
        )
    }

    fn resize(&mut self, width: u32, height: u32) {
        log::debug!("Headless surface resized to {width}x{height}.");
        self.shared.width.store(width, Ordering::Relaxed);
        self.shared.height.store(height, Ordering::Relaxed);
    }
}
