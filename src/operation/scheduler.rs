//! Tick-driven operation scheduler

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use crate::error::operation as op_err;

use super::handle::{Slot, lock_slot};
use super::{Operation, OperationHandle, OperationStatus, Step};

/// Scheduler shared between a host loop and the packages it drives
pub type SharedScheduler = Arc<Mutex<Scheduler>>;

static GLOBAL: OnceLock<SharedScheduler> = OnceLock::new();

/// The process-wide scheduler
pub fn global() -> SharedScheduler {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(Mutex::new(Scheduler::new()))))
}

/// Lock a shared scheduler, recovering from a poisoned lock
pub fn lock(scheduler: &SharedScheduler) -> MutexGuard<'_, Scheduler> {
    scheduler.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Type-erased scheduler entry
trait Drive: Send {
    /// Advance once; returns true when the entry reached a terminal state
    fn advance(&mut self, now: Instant) -> bool;
}

struct Entry<O: Operation> {
    op: O,
    slot: Arc<Mutex<Slot<O::Output>>>,
    deadline: Option<Instant>,
}

impl<O: Operation> Drive for Entry<O> {
    fn advance(&mut self, now: Instant) -> bool {
        let (status, cancel_requested) = {
            let slot = lock_slot(&self.slot);
            (slot.status, slot.cancel_requested)
        };
        if status.is_terminal() {
            return true;
        }

        if cancel_requested {
            tracing::debug!(operation = self.op.name(), "Operation canceled");
            self.op.abort();
            lock_slot(&self.slot).finish(Err(op_err::canceled(self.op.name())));
            return true;
        }

        if self.deadline.is_some_and(|deadline| now >= deadline) {
            tracing::debug!(operation = self.op.name(), "Operation timed out");
            self.op.abort();
            lock_slot(&self.slot).finish(Err(op_err::timeout(self.op.name())));
            return true;
        }

        if status == OperationStatus::Pending {
            lock_slot(&self.slot).status = OperationStatus::Running;
            self.op.start();
        }

        // The slot is not held while the operation runs its step
        match self.op.poll(now) {
            Step::Pending => {
                let progress = self.op.progress().clamp(0.0, 1.0);
                lock_slot(&self.slot).progress = progress;
                false
            }
            Step::Ready(result) => {
                lock_slot(&self.slot).finish(result);
                true
            }
        }
    }
}

/// Registry of in-flight operations
///
/// Each [`tick`](Scheduler::tick) advances every non-terminal operation exactly
/// once, in the order the operations were started, then drops the ones that
/// reached a terminal state.
#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Box<dyn Drive>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("in_flight", &self.entries.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an operation with no deadline
    pub fn start<O>(&mut self, op: O) -> OperationHandle<O::Output>
    where
        O: Operation + 'static,
    {
        self.start_with_deadline(op, None)
    }

    /// Enqueue an operation that fails with `Timeout` once `timeout` elapses
    pub fn start_with_timeout<O>(&mut self, op: O, timeout: Duration) -> OperationHandle<O::Output>
    where
        O: Operation + 'static,
    {
        self.start_with_deadline(op, Instant::now().checked_add(timeout))
    }

    pub fn start_with_deadline<O>(
        &mut self,
        op: O,
        deadline: Option<Instant>,
    ) -> OperationHandle<O::Output>
    where
        O: Operation + 'static,
    {
        let handle = OperationHandle::pending(op.name());
        tracing::debug!(operation = op.name(), id = handle.id(), "Operation started");
        self.entries.push(Box::new(Entry {
            op,
            slot: handle.slot(),
            deadline,
        }));
        handle
    }

    /// Advance every in-flight operation once
    ///
    /// Returns the number of operations still in flight.
    pub fn tick(&mut self) -> usize {
        self.tick_at(Instant::now())
    }

    /// Like [`tick`](Scheduler::tick) with an explicit clock reading
    pub fn tick_at(&mut self, now: Instant) -> usize {
        self.entries.retain_mut(|entry| !entry.advance(now));
        self.entries.len()
    }

    /// Number of operations still in flight
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_idle(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tick until `handle` is terminal, sleeping `interval` between ticks
    ///
    /// For hosts without their own frame loop, such as the CLI.
    pub fn run_until_complete<T>(&mut self, handle: &OperationHandle<T>, interval: Duration) {
        while !handle.is_done() {
            self.tick();
            if handle.is_done() {
                break;
            }
            std::thread::sleep(interval);
        }
    }
}
