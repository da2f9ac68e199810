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


//! Loop capabilities that the native event queue cannot back.
//!
//! The native queue only delivers GUI events, so file descriptors, signals,
//! subprocesses and sockets have no way to wake the loop. These operations
//! exist so callers get a clear error instead of a missing method. They never
//! affect the loop itself.

use crate::error::SchedulerError;
use crate::scheduler::Scheduler;

fn unsupported<T>(operation: &'static str) -> Result<T, SchedulerError> {
    log::debug!("Rejected unsupported operation '{operation}'.");
    Err(SchedulerError::Unsupported { operation })
}

impl Scheduler {
    /// Watches a file descriptor for readability. Always fails.
    pub fn add_reader(&self, _fd: i32, _callback: impl Fn(&Scheduler) + 'static) -> Result<(), SchedulerError> {
        unsupported("add_reader")
    }

    /// Stops watching a file descriptor for readability. Always fails.
    pub fn remove_reader(&self, _fd: i32) -> Result<bool, SchedulerError> {
        unsupported("remove_reader")
    }

    /// Watches a file descriptor for writability. Always fails.
    pub fn add_writer(&self, _fd: i32, _callback: impl Fn(&Scheduler) + 'static) -> Result<(), SchedulerError> {
        unsupported("add_writer")
    }

    /// Stops watching a file descriptor for writability. Always fails.
    pub fn remove_writer(&self, _fd: i32) -> Result<bool, SchedulerError> {
        unsupported("remove_writer")
    }

    /// Runs a callback when a signal arrives. Always fails.
    pub fn add_signal_handler(
        &self,
        _signal: i32,
        _callback: impl Fn(&Scheduler) + 'static,
    ) -> Result<(), SchedulerError> {
        unsupported("add_signal_handler")
    }

    /// Removes a signal callback. Always fails.
    pub fn remove_signal_handler(&self, _signal: i32) -> Result<bool, SchedulerError> {
        unsupported("remove_signal_handler")
    }

    /// Starts a subprocess. Always fails.
    pub fn subprocess_exec(&self, _program: &str, _args: &[&str]) -> Result<(), SchedulerError> {
        unsupported("subprocess_exec")
    }

    /// Opens a stream connection. Always fails.
    pub fn create_connection(&self, _host: &str, _port: u16) -> Result<(), SchedulerError> {
        unsupported("create_connection")
    }

    /// Starts a listening server. Always fails.
    pub fn create_server(&self, _host: &str, _port: u16) -> Result<(), SchedulerError> {
        unsupported("create_server")
    }
}
