//! Building blocks for operations

use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::error::{Result, fs as fs_err};

use super::{Operation, Step};

/// Blocking work moved off the driving thread
///
/// The closure runs on its own thread; [`poll`](BackgroundTask::poll) checks
/// for its result without blocking.
pub struct BackgroundTask<T> {
    rx: Receiver<Result<T>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn spawn<F>(name: &str, work: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name(format!("bundlepath-{name}"))
            .spawn(move || {
                // Receiver is gone when the owning operation was dropped
                let _ = tx.send(work());
            })
            .map_err(|e| fs_err::io_error(format!("Failed to spawn worker: {e}")))?;
        Ok(Self { rx })
    }

    /// The task's result, once available
    pub fn poll(&self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(fs_err::io_error(
                "worker exited without producing a result",
            ))),
        }
    }
}

/// Work a [`TaskOperation`] hands to its worker thread
type Work<T> = Box<dyn FnOnce() -> Result<T> + Send>;

/// Operation that runs one blocking closure on a worker thread
///
/// The worker is spawned on the first poll; later polls only check for the
/// result. Aborting discards the result of a worker that is still running.
pub struct TaskOperation<T> {
    name: String,
    work: Option<Work<T>>,
    task: Option<BackgroundTask<T>>,
}

impl<T: Send + 'static> TaskOperation<T> {
    pub fn new<F>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            work: Some(Box::new(work)),
            task: None,
        }
    }
}

impl<T: Send + 'static> Operation for TaskOperation<T> {
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, _now: Instant) -> Step<T> {
        if let Some(work) = self.work.take() {
            match BackgroundTask::spawn(&self.name, work) {
                Ok(task) => self.task = Some(task),
                Err(e) => return Step::Ready(Err(e)),
            }
        }

        match self.task.as_ref().and_then(BackgroundTask::poll) {
            Some(result) => Step::Ready(result),
            None => Step::Pending,
        }
    }

    fn abort(&mut self) {
        self.work = None;
        self.task = None;
    }
}

/// Operation that completes with a value known up front
pub struct ReadyOperation<T> {
    name: String,
    result: Option<Result<T>>,
}

impl<T> ReadyOperation<T> {
    pub fn new(name: impl Into<String>, result: Result<T>) -> Self {
        Self {
            name: name.into(),
            result: Some(result),
        }
    }
}

impl<T: Send + 'static> Operation for ReadyOperation<T> {
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, _now: Instant) -> Step<T> {
        match self.result.take() {
            Some(result) => Step::Ready(result),
            None => Step::Pending,
        }
    }
}
