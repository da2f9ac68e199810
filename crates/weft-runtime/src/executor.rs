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


//! The bounded worker pool used to offload blocking calls.
//!
//! This is the only place where work leaves the loop thread. A job's result
//! comes back through a `oneshot` channel; waking the awaiting task posts a
//! `TASK_WAKE` event, so the result is observed on the loop thread only.
//!
//! Submitting never blocks. Jobs that do not fit in the bounded queue wait in
//! a backlog that workers drain after each job.

use crate::error::{panic_message, SchedulerError};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::collections::VecDeque;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::thread;
use tokio::sync::oneshot;

type Job = Box<dyn FnOnce() + Send>;
type Backlog = Arc<Mutex<VecDeque<Job>>>;

/// A fixed set of named worker threads fed by a bounded job queue.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
    backlog: Backlog,
}

impl WorkerPool {
    /// Spawns `workers` threads sharing a queue of at most `capacity` jobs.
    pub fn new(workers: usize, capacity: usize) -> Result<Self, SchedulerError> {
        let (sender, receiver) = crossbeam_channel::bounded::<Job>(capacity.max(1));
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(workers),
            cancelled,
            backlog: Backlog::default(),
        };
        for index in 0..workers.max(1) {
            let receiver = receiver.clone();
            let cancelled = Arc::clone(&pool.cancelled);
            let backlog = Arc::clone(&pool.backlog);
            let handle = thread::Builder::new()
                .name(format!("weft-worker-{index}"))
                .spawn(move || worker_loop(receiver, backlog, cancelled))?;
            pool.workers.push(handle);
        }
        log::info!("Worker pool started with {} threads.", pool.workers.len());
        Ok(pool)
    }

    /// Queues `job` and returns the receiving end of its result.
    ///
    /// Never blocks: when the job queue is full, the job goes to the backlog.
    pub fn submit<T, F>(&self, job: F) -> Result<oneshot::Receiver<thread::Result<T>>, SchedulerError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(SchedulerError::ExecutorShutdown)?;
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            let _ = tx.send(panic::catch_unwind(AssertUnwindSafe(job)));
        });
        match sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                lock(&self.backlog).push_back(job);
                // Either this wake-up fits, or a queued job is still ahead of a
                // worker that checks the backlog once it is done.
                let _ = sender.try_send(Box::new(|| {}));
                log::trace!("Job queue full; {} job(s) in the backlog.", self.backlog_len());
            }
            Err(TrySendError::Disconnected(_)) => return Err(SchedulerError::ExecutorShutdown),
        }
        Ok(rx)
    }

    /// Stops accepting jobs, drops the queued ones and joins every worker.
    ///
    /// Jobs already running are allowed to finish. Dropped jobs resolve their
    /// futures with [`SchedulerError::Cancelled`].
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        lock(&self.backlog).clear();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("A worker thread panicked outside of a job.");
            }
        }
        log::info!("Worker pool shut down.");
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Number of jobs waiting for room in the job queue.
    pub fn backlog_len(&self) -> usize {
        lock(&self.backlog).len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("accepting", &self.sender.is_some())
            .field("backlog", &self.backlog_len())
            .finish()
    }
}

fn lock(backlog: &Mutex<VecDeque<Job>>) -> MutexGuard<'_, VecDeque<Job>> {
    backlog.lock().unwrap_or_else(PoisonError::into_inner)
}

fn worker_loop(receiver: Receiver<Job>, backlog: Backlog, cancelled: Arc<AtomicBool>) {
    for job in receiver.iter() {
        if cancelled.load(Ordering::SeqCst) {
            drop(job);
            continue;
        }
        job();
        loop {
            let next = lock(&backlog).pop_front();
            match next {
                Some(next) if !cancelled.load(Ordering::SeqCst) => next(),
                _ => break,
            }
        }
    }
}

/// The result of a blocking call offloaded with
/// [`Scheduler::run_in_executor`](crate::Scheduler::run_in_executor).
pub struct Blocking<T> {
    state: BlockingState<T>,
}

enum BlockingState<T> {
    Waiting(oneshot::Receiver<thread::Result<T>>),
    Failed(Option<SchedulerError>),
}

impl<T> Blocking<T> {
    pub(crate) fn waiting(receiver: oneshot::Receiver<thread::Result<T>>) -> Self {
        Self {
            state: BlockingState::Waiting(receiver),
        }
    }

    pub(crate) fn failed(error: SchedulerError) -> Self {
        Self {
            state: BlockingState::Failed(Some(error)),
        }
    }
}

impl<T> Future for Blocking<T> {
    type Output = Result<T, SchedulerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            BlockingState::Waiting(receiver) => Pin::new(receiver).poll(cx).map(|result| match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(payload)) => Err(SchedulerError::WorkerPanicked(panic_message(&*payload))),
                Err(_) => Err(SchedulerError::Cancelled),
            }),
            BlockingState::Failed(error) => {
                Poll::Ready(Err(error.take().unwrap_or(SchedulerError::Cancelled)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait<T>(mut rx: oneshot::Receiver<T>) -> T {
        for _ in 0..200 {
            if let Ok(value) = rx.try_recv() {
                return value;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("worker did not answer in time");
    }

    #[test]
    fn jobs_run_on_named_worker_threads() {
        let pool = WorkerPool::new(2, 4).unwrap();
        let rx = pool
            .submit(|| thread::current().name().map(str::to_owned))
            .unwrap();
        let name = wait(rx).unwrap().unwrap();
        assert!(name.starts_with("weft-worker-"), "unexpected thread name {name}");
        assert_eq!(pool.workers(), 2);
    }

    #[test]
    fn panicking_jobs_are_contained() {
        let pool = WorkerPool::new(1, 1).unwrap();
        let rx = pool.submit(|| -> u32 { panic!("boom") }).unwrap();
        let payload = wait(rx).unwrap_err();
        assert_eq!(panic_message(&*payload), "boom");
        let rx = pool.submit(|| 7).unwrap();
        assert_eq!(wait(rx).unwrap(), 7, "the worker survives a panicking job");
    }

    #[test]
    fn a_full_queue_does_not_block_the_submitter() {
        let pool = WorkerPool::new(1, 1).unwrap();
        let (open, gate) = crossbeam_channel::bounded::<()>(0);
        let held = pool.submit(move || gate.recv().is_ok()).unwrap();

        let start = std::time::Instant::now();
        let queued: Vec<_> = (1..=4u32).map(|i| pool.submit(move || i * 10).unwrap()).collect();
        assert!(start.elapsed() < Duration::from_millis(500), "submit blocked on a full queue");
        assert!(pool.backlog_len() >= 2, "overflowing jobs go to the backlog");

        open.send(()).unwrap();
        assert!(wait(held).unwrap());
        let results: Vec<u32> = queued.into_iter().map(|rx| wait(rx).unwrap()).collect();
        assert_eq!(results, [10, 20, 30, 40]);
        assert_eq!(pool.backlog_len(), 0);
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let mut pool = WorkerPool::new(1, 1).unwrap();
        pool.shutdown();
        assert!(matches!(pool.submit(|| ()), Err(SchedulerError::ExecutorShutdown)));
    }
}
