use std::sync::{Mutex, PoisonError};

/// A shared, append-only accumulator for records produced by tasks
/// running on the pool.
///
/// Appends happen under a short critical section only around the
/// mutation itself, never around task execution. The store makes no
/// ordering promise across producers; [`ResultStore::snapshot`] is
/// meant to be taken after all producers have finished.
#[derive(Debug, Default)]
pub struct ResultStore<T> {
    records: Mutex<Vec<T>>,
}

impl<T> ResultStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Appends a single record.
    pub fn append(&self, record: T) {
        self.lock().push(record);
    }

    /// Appends every record yielded by the iterator in one critical
    /// section, so a task's rows are never interleaved with another's.
    pub fn extend<I>(&self, records: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.lock().extend(records);
    }

    /// The number of records currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Consumes the store and returns the accumulated records.
    pub fn snapshot(self) -> Vec<T> {
        self.records
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        // The vector stays consistent across a holder's panic.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
