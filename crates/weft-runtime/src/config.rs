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


//! Scheduler configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// Every field has a default, so a configuration file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// The window title.
    pub title: String,
    /// The size the UI is laid out for. The scale factor is the current surface
    /// width divided by this width.
    pub unscaled_size: (u32, u32),
    /// Number of threads in the default executor.
    pub executor_workers: usize,
    /// Maximum number of jobs waiting for a worker. Submitting to a full queue
    /// blocks the caller.
    pub executor_queue_capacity: usize,
    /// Enables slow-callback warnings.
    pub debug: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            title: "weft".to_owned(),
            unscaled_size: (800, 600),
            executor_workers: 5,
            executor_queue_capacity: 64,
            debug: cfg!(debug_assertions),
        }
    }
}

impl SchedulerConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Invalid scheduler configuration")
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scheduler configuration from {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("In {}", path.display()))
    }
}
