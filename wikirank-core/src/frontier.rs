//! Bounded, deduplicating queue of article paths waiting to be fetched.
//!
//! The article graph is far larger than any page budget, so the frontier
//! holds at most `capacity` paths and never accepts a path twice, even after
//! it has been dequeued. Once the buffer fills up the frontier closes for
//! good: from then on crawl workers only drain what is already queued.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct FrontierState {
    buffer: VecDeque<String>,
    seen: HashSet<String>,
}

#[derive(Debug)]
pub struct Frontier {
    capacity: usize,
    state: Mutex<FrontierState>,
    closed: AtomicBool,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(FrontierState {
                buffer: VecDeque::with_capacity(capacity),
                seen: HashSet::new(),
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Queues `path` unless it was seen before or the frontier is closed.
    ///
    /// The seen check and the insert happen under one lock, so two workers
    /// racing on the same new path cannot both get it accepted. Filling the
    /// last free slot, or finding no free slot, closes the frontier.
    pub fn enqueue(&self, path: &str) -> bool {
        if self.is_full() {
            return false;
        }

        let mut state = self.lock();
        if state.seen.contains(path) {
            return false;
        }

        if state.buffer.len() >= self.capacity {
            self.close();
            return false;
        }

        state.buffer.push_back(path.to_string());
        state.seen.insert(path.to_string());

        if state.buffer.len() >= self.capacity {
            self.close();
        }
        true
    }

    /// Pops the oldest queued path. `None` just means nothing is queued right now.
    pub fn dequeue(&self) -> Option<String> {
        self.lock().buffer.pop_front()
    }

    /// Whether `path` has ever been accepted, queued or not.
    pub fn has(&self, path: &str) -> bool {
        self.lock().seen.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    /// True once the frontier has closed and will never accept another path.
    ///
    /// This is not the same as the buffer being at capacity right now: a
    /// closed frontier stays full even after it has been drained.
    pub fn is_full(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
