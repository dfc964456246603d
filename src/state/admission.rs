//! The admission controller: the single gate new connections pass through.
//!
//! `try_admit` atomically reserves a slot in the global session counter and
//! on a worker, returning an [`AdmissionPermit`]. Dropping the permit
//! releases both reservations; because the permit is moved into the session
//! task and dropped exactly once, double-release races (simultaneous
//! read-error and explicit-exit teardown) cannot occur.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-worker admission bookkeeping: the load gauge shared with the worker
/// and its capacity.
#[derive(Debug, Clone)]
pub struct WorkerSlot {
    pub load: Arc<AtomicUsize>,
    pub capacity: usize,
}

impl WorkerSlot {
    /// Reserve one seat on this worker if it has spare capacity.
    fn try_reserve(&self) -> bool {
        self.load
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok()
    }
}

/// Global gate over the active-session count and the worker pool.
pub struct AdmissionController {
    active: Arc<AtomicUsize>,
    max_sessions: usize,
    workers: Vec<WorkerSlot>,
}

impl AdmissionController {
    pub fn new(max_sessions: usize, workers: Vec<WorkerSlot>) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max_sessions,
            workers,
        }
    }

    /// Admit a new connection, choosing the least-loaded worker with spare
    /// capacity. Returns `None` when the server is full; the caller reports
    /// this to the peer and closes the socket.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_sessions).then_some(n + 1)
            })
            .ok()?;

        // Least-loaded first; seats are reserved with a CAS so two
        // concurrent admissions cannot overfill a worker.
        let mut order: Vec<usize> = (0..self.workers.len()).collect();
        order.sort_by_key(|&i| self.workers[i].load.load(Ordering::Acquire));
        for index in order {
            if self.workers[index].try_reserve() {
                return Some(AdmissionPermit {
                    active: Arc::clone(&self.active),
                    worker_load: Arc::clone(&self.workers[index].load),
                    worker: index,
                });
            }
        }

        // Every worker is at capacity (only possible when the global cap
        // exceeds the pool's; config validation forbids that, but roll the
        // reservation back rather than leak it).
        self.active.fetch_sub(1, Ordering::AcqRel);
        None
    }

    /// Currently active sessions.
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

/// A reserved seat: one unit of the global counter plus one on a worker.
/// Released on drop, exactly once.
#[derive(Debug)]
pub struct AdmissionPermit {
    active: Arc<AtomicUsize>,
    worker_load: Arc<AtomicUsize>,
    worker: usize,
}

impl AdmissionPermit {
    /// Index of the worker this permit reserved a seat on.
    pub fn worker(&self) -> usize {
        self.worker
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
        self.worker_load.fetch_sub(1, Ordering::AcqRel);
    }
}
