//! Implementation of a worker pool for audio analysis tasks.
//!
//! # Motivation
//!
//! Tessitura's primary use case for multithreading is running the
//! pitch analysis over many independent audio files at once.
//!
//! Decoding and analyzing a single file takes orders of magnitude
//! longer than handing the work out, so one shared FIFO queue with
//! blocking hand-off gives natural load balancing across files of
//! uneven length without meaningful lock contention.
//!
//! # Design
//!
//! By design, the main thread produces tasks for the workers and
//! awaits their results through per-task [`Future`] handles. Workers
//! never outlive their owning [`WorkerPool`]; shutdown drains the
//! queue before joining the threads.

use std::{env, thread};

use thiserror::Error;

mod future;
pub use future::Future;

mod pool;
pub use pool::{PoolClosed, WorkerPool};

mod store;
pub use store::ResultStore;

const TESSITURA_WORKER_THREADS: &str = "TESSITURA_WORKER_THREADS";

#[derive(Clone, Debug, Error)]
#[error(
    "invalid value in {}; must be a natural number",
    TESSITURA_WORKER_THREADS
)]
pub struct BadConfiguration;

/// Determines the preferred number of worker threads on this system.
///
/// Configuration is possible with the `TESSITURA_WORKER_THREADS`
/// environment variable specifying the number of threads to use.
/// If not set, falls back to [`thread::available_parallelism`].
pub fn available_threads() -> Result<usize, BadConfiguration> {
    match env::var(TESSITURA_WORKER_THREADS) {
        Ok(value) => value.parse().map_err(|_| BadConfiguration),

        Err(_) => Ok(thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1)),
    }
}

/// The failure of an individual task on the pool.
///
/// Task failures are delivered exclusively through the task's
/// [`Future`]; they never unwind into the worker loop and never
/// affect unrelated tasks.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task body returned an error of its own.
    #[error(transparent)]
    Failed(Box<dyn std::error::Error + Send + Sync>),

    /// The task body panicked; the payload is preserved as text.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The pool went away before the task's outcome was delivered.
    ///
    /// This cannot happen through the public API since shutdown
    /// drains the queue, but a waiter must not deadlock on it.
    #[error("task was abandoned before completion")]
    Abandoned,
}

impl TaskError {
    /// Wraps an arbitrary error raised by a task body.
    pub fn failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failed(Box::new(err))
    }
}
