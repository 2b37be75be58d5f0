//! Caller-side view of a scheduled operation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{BundleError, Result};

use super::OperationStatus;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// State shared between the scheduler entry and its handles
pub(super) struct Slot<T> {
    pub(super) status: OperationStatus,
    pub(super) progress: f32,
    pub(super) cancel_requested: bool,
    pub(super) result: Option<Result<T>>,
    pub(super) error: Option<BundleError>,
}

impl<T> Slot<T> {
    pub(super) fn finish(&mut self, result: Result<T>) {
        self.status = match &result {
            Ok(_) => OperationStatus::Succeeded,
            Err(BundleError::Canceled { .. }) => OperationStatus::Canceled,
            Err(_) => OperationStatus::Failed,
        };
        if let Err(e) = &result {
            self.error = Some(e.clone());
        } else {
            self.progress = 1.0;
        }
        self.result = Some(result);
    }
}

pub(super) fn lock_slot<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to an operation owned by a [`Scheduler`](super::Scheduler)
///
/// Cloning a handle shares the same operation.
pub struct OperationHandle<T> {
    id: u64,
    name: Arc<str>,
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for OperationHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for OperationHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}

impl<T> OperationHandle<T> {
    pub(super) fn pending(name: &str) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name),
            slot: Arc::new(Mutex::new(Slot {
                status: OperationStatus::Pending,
                progress: 0.0,
                cancel_requested: false,
                result: None,
                error: None,
            })),
        }
    }

    pub(super) fn slot(&self) -> Arc<Mutex<Slot<T>>> {
        Arc::clone(&self.slot)
    }

    /// A handle that is already terminal and never scheduled
    pub fn completed(name: &str, result: Result<T>) -> Self {
        let handle = Self::pending(name);
        lock_slot(&handle.slot).finish(result);
        handle
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> OperationStatus {
        lock_slot(&self.slot).status
    }

    pub fn progress(&self) -> f32 {
        lock_slot(&self.slot).progress
    }

    pub fn is_done(&self) -> bool {
        self.status().is_terminal()
    }

    /// Request cancellation
    ///
    /// Takes effect at the next tick boundary. Ignored once terminal.
    pub fn cancel(&self) {
        let mut slot = lock_slot(&self.slot);
        if !slot.status.is_terminal() {
            slot.cancel_requested = true;
        }
    }

    /// The failure, once the operation failed or was canceled
    pub fn error(&self) -> Option<BundleError> {
        lock_slot(&self.slot).error.clone()
    }

    /// Move the result out; `None` before completion or after a previous take
    pub fn take(&self) -> Option<Result<T>> {
        lock_slot(&self.slot).result.take()
    }
}

impl<T: Clone> OperationHandle<T> {
    /// Copy of the successful result, leaving it in place
    pub fn output(&self) -> Option<T> {
        match &lock_slot(&self.slot).result {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }
}
