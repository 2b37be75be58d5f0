//! Cooperative asynchronous operations
//!
//! Every long-running piece of work (manifest refresh, integrity scan,
//! acquisition job) is an [`Operation`]: an explicit state machine that the
//! [`Scheduler`] advances one step per tick. Callers only hold an
//! [`OperationHandle`], through which they observe status, progress and the
//! final result, and request cancellation.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending -> Running -> Succeeded
//!                    -> Failed
//!                    -> Canceled
//! ```
//!
//! Terminal states are final. Blocking work (file or network I/O) never runs
//! inside a tick; operations hand it to a [`BackgroundTask`] and check it for
//! completion on later ticks.

mod handle;
mod scheduler;
mod task;


use std::time::Instant;

use crate::error::Result;

pub use handle::OperationHandle;
pub use scheduler::{Scheduler, SharedScheduler, global, lock};
pub use task::{BackgroundTask, ReadyOperation, TaskOperation};

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationStatus::Succeeded | OperationStatus::Failed | OperationStatus::Canceled
        )
    }
}

/// Result of polling an operation once
#[derive(Debug)]
pub enum Step<T> {
    /// Work is still in flight; poll again next tick
    Pending,
    /// The operation finished
    Ready(Result<T>),
}

/// A unit of asynchronous work driven by the [`Scheduler`]
pub trait Operation: Send {
    type Output: Send + 'static;

    /// Name used in logs and timeout/cancel errors
    fn name(&self) -> &str;

    /// Called once, on the first tick, before the first poll
    fn start(&mut self) {}

    /// Make at most one unit of progress without blocking
    fn poll(&mut self, now: Instant) -> Step<Self::Output>;

    /// Completion fraction in `0.0..=1.0`
    fn progress(&self) -> f32 {
        0.0
    }

    /// Release in-flight work after cancellation or timeout
    fn abort(&mut self) {}
}
