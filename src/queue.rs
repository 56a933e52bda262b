//! Bounded blocking handoff queue between two adjacent stages.
//!
//! Each queue has exactly one producer and one consumer. A full queue
//! blocks `put`, an empty queue blocks `take`; both wait on condition
//! variables rather than spinning. Items are moved in and moved out, so
//! a producer cannot touch a line after handing it over.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{PipelineError, Result};

/// Slots per queue.
pub const QUEUE_CAPACITY: usize = 50;

/// One queue slot: a payload or the end-of-stream marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item<T> {
    Data(T),
    End,
}

/// Fixed-capacity FIFO guarded by one mutex and two condition variables.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

#[derive(Debug)]
struct QueueState<T> {
    slots: VecDeque<Item<T>>,
    ended: bool,
    aborted: bool,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PipelineError::ZeroCapacity);
        }
        Ok(Self {
            state: Mutex::new(QueueState {
                slots: VecDeque::with_capacity(capacity),
                ended: false,
                aborted: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    /// Insert at the tail, blocking while the queue is full.
    ///
    /// Fails with `PutAfterEnd` once `Item::End` has been accepted, and with
    /// `Aborted` if the queue is torn down while waiting.
    pub fn put(&self, item: Item<T>) -> Result<()> {
        let mut state = self.lock()?;
        while state.slots.len() == self.capacity && !state.aborted {
            state = self
                .not_full
                .wait(state)
                .map_err(|_| PipelineError::Poisoned)?;
        }
        if state.aborted {
            return Err(PipelineError::Aborted);
        }
        if state.ended {
            return Err(PipelineError::PutAfterEnd);
        }

        if matches!(item, Item::End) {
            state.ended = true;
        }
        state.slots.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the head item, blocking while the queue is empty.
    pub fn take(&self) -> Result<Item<T>> {
        let mut state = self.lock()?;
        while state.slots.is_empty() && !state.aborted {
            state = self
                .not_empty
                .wait(state)
                .map_err(|_| PipelineError::Poisoned)?;
        }
        if state.aborted {
            return Err(PipelineError::Aborted);
        }

        let Some(item) = state.slots.pop_front() else {
            return Err(PipelineError::Aborted);
        };
        self.not_full.notify_one();
        Ok(item)
    }

    /// Tear the queue down: every pending and future `put`/`take` fails
    /// with `Aborted`. Only used when a stage hits a fatal error.
    pub fn abort(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.aborted = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState<T>>> {
        self.state.lock().map_err(|_| PipelineError::Poisoned)
    }
}
