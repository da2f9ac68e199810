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

//! Stateful functions as explicit state machines.
//!
//! A [`Step`] is called repeatedly with one input at a time and keeps whatever
//! it accumulates in ordinary fields.

use std::ops::Add;

/// A function that remembers state between calls.
pub trait Step<In> {
    /// The value produced by each call.
    type Output;

    /// Consumes one input and returns the next output.
    fn step(&mut self, input: In) -> Self::Output;
}

/// Returns the total of every input before the current one.
///
/// ```
/// use weft_core::step::{Accumulate, Step};
///
/// let mut acc = Accumulate::new(0);
/// assert_eq!(acc.step(10), 0);
/// assert_eq!(acc.step(50), 10);
/// assert_eq!(acc.step(5), 60);
/// assert_eq!(acc.step(0), 65);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulate<T> {
    total: T,
}

impl<T> Accumulate<T> {
    /// Starts from `initial`.
    pub fn new(initial: T) -> Self {
        Self { total: initial }
    }
}

impl<T: Copy + Add<Output = T>> Step<T> for Accumulate<T> {
    type Output = T;

    fn step(&mut self, input: T) -> T {
        let before = self.total;
        self.total = before + input;
        before
    }
}

/// Returns the running total, current input included.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Total<T> {
    total: T,
}

impl<T> Total<T> {
    /// Starts from `initial`.
    pub fn new(initial: T) -> Self {
        Self { total: initial }
    }
}

impl<T: Copy + Add<Output = T>> Step<T> for Total<T> {
    type Output = T;

    fn step(&mut self, input: T) -> T {
        self.total = self.total + input;
        self.total
    }
}

/// Returns the mean of every input so far, current input included.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningAverage {
    sum: f64,
    count: u64,
}

impl RunningAverage {
    /// Creates an average over no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current mean, or `None` before the first sample.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Number of samples taken.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Step<f64> for RunningAverage {
    type Output = f64;

    fn step(&mut self, input: f64) -> f64 {
        self.sum += input;
        self.count += 1;
        self.sum / self.count as f64
    }
}

/// Feeds `inputs` through `step` lazily, yielding each output.
pub fn feed<'a, S, I>(step: &'a mut S, inputs: I) -> impl Iterator<Item = S::Output> + 'a
where
    I: IntoIterator + 'a,
    I::IntoIter: 'a,
    S: Step<I::Item>,
{
    inputs.into_iter().map(move |input| step.step(input))
}
