use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::TaskError;

struct Shared<T> {
    slot: Mutex<Option<Result<T, TaskError>>>,
    cond: Condvar,
}

/// A handle to the eventual outcome of a submitted task.
///
/// The cell is one-shot: it starts out pending and is fulfilled
/// exactly once by the worker that ran the task. [`Future::wait`]
/// consumes the handle and moves the outcome out.
pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

/// The write half of a [`Future`], held by the job on the queue.
pub(crate) struct Promise<T> {
    shared: Arc<Shared<T>>,
    fulfilled: bool,
}

pub(crate) fn channel<T>() -> (Promise<T>, Future<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(None),
        cond: Condvar::new(),
    });

    let promise = Promise {
        shared: shared.clone(),
        fulfilled: false,
    };

    (promise, Future { shared })
}

impl<T> Future<T> {
    /// Blocks the calling thread until the task has completed and
    /// returns its value or the failure captured during execution.
    pub fn wait(self) -> Result<T, TaskError> {
        // A poisoned slot only means some unrelated holder panicked;
        // the Option inside is still consistent either way.
        let mut slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        loop {
            if let Some(outcome) = slot.take() {
                return outcome;
            }

            slot = self
                .shared
                .cond
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl<T> Promise<T> {
    /// Delivers the task's outcome and wakes every waiter.
    pub(crate) fn fulfill(mut self, outcome: Result<T, TaskError>) {
        let mut slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        debug_assert!(slot.is_none());
        *slot = Some(outcome);
        drop(slot);

        self.fulfilled = true;
        self.shared.cond.notify_all();
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if self.fulfilled {
            return;
        }

        // The job was destroyed without ever running. Deliver an
        // error so that a waiter cannot block forever.
        let mut slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if slot.is_none() {
            *slot = Some(Err(TaskError::Abandoned));
        }
        drop(slot);

        self.shared.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn wait_blocks_until_fulfilled() {
        let (promise, future) = channel();

        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            promise.fulfill(Ok(7_u32));
        });

        assert_eq!(future.wait().unwrap(), 7);
        writer.join().unwrap();
    }

    #[test]
    fn dropped_promise_resolves_to_abandoned() {
        let (promise, future) = channel::<u32>();
        drop(promise);

        assert!(matches!(future.wait(), Err(TaskError::Abandoned)));
    }

    #[test]
    fn errors_move_out_intact() {
        let (promise, future) = channel::<u32>();
        promise.fulfill(Err(TaskError::Panicked("boom".into())));

        match future.wait() {
            Err(TaskError::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
