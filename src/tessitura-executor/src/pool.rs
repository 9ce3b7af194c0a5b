use std::{
    collections::VecDeque,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread,
};

use thiserror::Error;

use crate::{future, Future, TaskError};

const WORKER_NAME: &str = "tessitura-worker";
const WORKER_STACK: usize = 1_048_576;

/// Error returned by [`WorkerPool::submit`] after shutdown was
/// initiated. The rejected task is never enqueued.
#[derive(Clone, Copy, Debug, Error)]
#[error("submit on a worker pool that has shut down")]
pub struct PoolClosed;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct State {
    queue: VecDeque<Job>,
    accepting: bool,
}

struct Shared {
    state: Mutex<State>,
    work: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Queue state stays consistent even when a guard holder
        // panicked, so we keep going on poison.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A pool of background threads executing submitted tasks.
///
/// Tasks are handed out from one shared FIFO queue; completion
/// order is determined solely by per-task duration and worker
/// availability. The pool owns its threads: they are started in
/// [`WorkerPool::new`] and joined in [`WorkerPool::shutdown`],
/// never outliving the pool itself.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts a pool with the given number of worker threads.
    ///
    /// A worker count of zero is rounded up to one so the pool can
    /// always make forward progress.
    pub fn new(workers: usize) -> io::Result<Self> {
        let workers = workers.max(1);

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                accepting: true,
            }),
            work: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let shared = shared.clone();
            let handle = thread::Builder::new()
                .name(WORKER_NAME.into())
                .stack_size(WORKER_STACK)
                .spawn(move || worker_loop(shared))?;

            handles.push(handle);
        }

        Ok(Self {
            shared,
            workers: handles,
        })
    }

    /// The number of worker threads owned by this pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submits a task for execution and returns a [`Future`] over
    /// its eventual outcome.
    ///
    /// The call never blocks. Checking the accepting flag and the
    /// enqueue happen under one critical section, so a task either
    /// fails here with [`PoolClosed`] or is guaranteed to run.
    ///
    /// A panic inside `task` is contained: it fulfills the returned
    /// future with [`TaskError::Panicked`] and leaves the worker
    /// thread intact.
    pub fn submit<T, F>(&self, task: F) -> Result<Future<T>, PoolClosed>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let (promise, future) = future::channel();

        let job: Job = Box::new(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(result) => result,
                // as_ref() inspects the payload itself; a plain
                // borrow would coerce the Box into the trait object
                // and hide the inner type from the downcasts.
                Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
            };

            promise.fulfill(outcome);
        });

        {
            let mut state = self.shared.lock();
            if !state.accepting {
                return Err(PoolClosed);
            }

            state.queue.push_back(job);
        }

        self.shared.work.notify_one();
        Ok(future)
    }

    /// Stops accepting new tasks, drains the queue and joins every
    /// worker thread.
    ///
    /// Tasks enqueued before this call still run to completion; a
    /// concurrent [`WorkerPool::submit`] either lands before the
    /// flag flips and is executed, or fails with [`PoolClosed`].
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.shared.lock().accepting = false;
        self.shared.work.notify_all();

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut state = shared.lock();

            loop {
                if let Some(job) = state.queue.pop_front() {
                    break job;
                }

                if !state.accepting {
                    return;
                }

                state = shared
                    .work
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        // The lock is released here; a slow task never blocks
        // submission or queue hand-off to other workers.
        job();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}
