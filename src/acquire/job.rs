//! Acquisition jobs: bounded-concurrency, retrying bundle transfers

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::error::{Result, acquire};
use crate::operation::{Operation, OperationHandle, OperationStatus, Scheduler, Step};

use super::{AcquisitionKind, AcquisitionOptions, TransferReceipt, TransferRequest, Transport};

/// State of one bundle within a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Running { attempt: u32 },
    Succeeded { bytes: u64, attempts: u32 },
    Failed { attempts: u32, reason: String },
    Canceled,
}

impl ItemStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ItemStatus::Succeeded { .. } | ItemStatus::Failed { .. } | ItemStatus::Canceled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub bundle: String,
    pub size: u64,
    pub status: ItemStatus,
}

/// Per-item ledger of an acquisition job
///
/// Readable at any time, including after the job was canceled or failed:
/// items that completed keep their result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub kind: AcquisitionKind,
    pub items: Vec<ItemReport>,
}

impl AcquisitionReport {
    pub fn new(kind: AcquisitionKind, requests: &[TransferRequest]) -> Self {
        Self {
            kind,
            items: requests
                .iter()
                .map(|r| ItemReport {
                    bundle: r.bundle.clone(),
                    size: r.size,
                    status: ItemStatus::Pending,
                })
                .collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Succeeded { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Failed { .. }))
    }

    pub fn canceled(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Canceled))
    }

    pub fn finished(&self) -> usize {
        self.count(ItemStatus::is_finished)
    }

    /// Bytes of all successfully transferred bundles
    pub fn bytes_transferred(&self) -> u64 {
        self.items
            .iter()
            .map(|i| match i.status {
                ItemStatus::Succeeded { bytes, .. } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// Bytes the job set out to transfer
    pub fn total_bytes(&self) -> u64 {
        self.items.iter().map(|i| i.size).sum()
    }

    /// Fraction of items that reached a final state
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        if self.items.is_empty() {
            return 1.0;
        }
        self.finished() as f32 / self.items.len() as f32
    }

    pub fn item(&self, bundle: &str) -> Option<&ItemReport> {
        self.items.iter().find(|i| i.bundle == bundle)
    }

    fn count(&self, pred: impl Fn(&ItemStatus) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }
}

type Ledger = Arc<Mutex<AcquisitionReport>>;

fn lock_ledger(ledger: &Ledger) -> MutexGuard<'_, AcquisitionReport> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Caller-side handle to a running acquisition
#[derive(Debug, Clone)]
pub struct AcquisitionJob {
    handle: OperationHandle<AcquisitionReport>,
    ledger: Ledger,
}

impl AcquisitionJob {
    /// Schedule transfers of `requests` through `transport`
    pub fn start(
        scheduler: &mut Scheduler,
        kind: AcquisitionKind,
        requests: Vec<TransferRequest>,
        transport: Arc<dyn Transport>,
        options: AcquisitionOptions,
    ) -> Self {
        let ledger = Arc::new(Mutex::new(AcquisitionReport::new(kind, &requests)));
        let op = JobOperation::new(kind, requests, transport, options, Arc::clone(&ledger));
        let handle = scheduler.start(op);
        Self { handle, ledger }
    }

    /// A job with nothing to do, already succeeded
    pub fn empty(kind: AcquisitionKind) -> Self {
        let report = AcquisitionReport::new(kind, &[]);
        Self {
            handle: OperationHandle::completed(&kind.to_string(), Ok(report.clone())),
            ledger: Arc::new(Mutex::new(report)),
        }
    }

    pub fn handle(&self) -> &OperationHandle<AcquisitionReport> {
        &self.handle
    }

    pub fn status(&self) -> OperationStatus {
        self.handle.status()
    }

    pub fn is_done(&self) -> bool {
        self.handle.is_done()
    }

    /// Cancel every item that has not finished yet
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Snapshot of the per-item ledger
    pub fn report(&self) -> AcquisitionReport {
        lock_ledger(&self.ledger).clone()
    }

    pub fn progress(&self) -> f32 {
        lock_ledger(&self.ledger).progress()
    }
}

/// Message from a worker thread
struct Outcome {
    index: usize,
    token: u64,
    result: Result<TransferReceipt>,
}

struct Attempt {
    token: u64,
    started: Instant,
    cancel: Arc<AtomicBool>,
}

/// Scheduler-driven state machine behind an [`AcquisitionJob`]
///
/// Workers run on their own threads and report over a channel; only `poll`
/// touches the ledger, so all visible state changes happen on a tick.
struct JobOperation {
    name: String,
    requests: Vec<TransferRequest>,
    transport: Arc<dyn Transport>,
    options: AcquisitionOptions,
    ledger: Ledger,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
    queue: VecDeque<usize>,
    in_flight: HashMap<usize, Attempt>,
    /// Tokens of timed-out attempts whose workers have not reported back;
    /// they keep their concurrency slot until they do
    abandoned: HashSet<u64>,
    attempts: Vec<u32>,
    next_token: u64,
}

impl JobOperation {
    fn new(
        kind: AcquisitionKind,
        requests: Vec<TransferRequest>,
        transport: Arc<dyn Transport>,
        options: AcquisitionOptions,
        ledger: Ledger,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            name: kind.to_string(),
            queue: (0..requests.len()).collect(),
            attempts: vec![0; requests.len()],
            requests,
            transport,
            options,
            ledger,
            tx,
            rx,
            in_flight: HashMap::new(),
            abandoned: HashSet::new(),
            next_token: 0,
        }
    }

    fn set_status(&self, index: usize, status: ItemStatus) {
        lock_ledger(&self.ledger).items[index].status = status;
    }

    fn record_success(&self, index: usize, receipt: TransferReceipt) {
        self.set_status(
            index,
            ItemStatus::Succeeded {
                bytes: receipt.bytes,
                attempts: self.attempts[index],
            },
        );
    }

    fn record_failure(&mut self, index: usize, reason: String) {
        let attempts = self.attempts[index];
        let bundle = &self.requests[index].bundle;
        if attempts <= self.options.retry {
            tracing::debug!(bundle = %bundle, attempts, %reason, "Retrying bundle");
            self.set_status(index, ItemStatus::Pending);
            self.queue.push_back(index);
        } else {
            let err = acquire::failed(bundle, attempts, &reason);
            tracing::warn!("{err}");
            self.set_status(index, ItemStatus::Failed { attempts, reason });
        }
    }

    fn launch(&mut self, index: usize, now: Instant) {
        self.attempts[index] += 1;
        self.next_token += 1;

        let token = self.next_token;
        let cancel = Arc::new(AtomicBool::new(false));
        let request = self.requests[index].clone();
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let worker_cancel = Arc::clone(&cancel);

        let spawned = thread::Builder::new()
            .name(format!("bundlepath-{}", request.bundle))
            .spawn(move || {
                let result = transport.transfer(&request, &worker_cancel);
                // Receiver is gone once the job finished or was dropped
                let _ = tx.send(Outcome {
                    index,
                    token,
                    result,
                });
            });

        match spawned {
            Ok(_) => {
                self.set_status(
                    index,
                    ItemStatus::Running {
                        attempt: self.attempts[index],
                    },
                );
                self.in_flight.insert(
                    index,
                    Attempt {
                        token,
                        started: now,
                        cancel,
                    },
                );
            }
            Err(e) => self.record_failure(index, format!("failed to spawn worker: {e}")),
        }
    }

    fn collect_results(&mut self) {
        let outcomes: Vec<Outcome> = self.rx.try_iter().collect();
        for outcome in outcomes {
            // Late results from abandoned attempts only free their slot
            if self.abandoned.remove(&outcome.token) {
                continue;
            }
            let current = self
                .in_flight
                .get(&outcome.index)
                .is_some_and(|a| a.token == outcome.token);
            if !current {
                continue;
            }
            self.in_flight.remove(&outcome.index);
            match outcome.result {
                Ok(receipt) => self.record_success(outcome.index, receipt),
                Err(e) => self.record_failure(outcome.index, e.to_string()),
            }
        }
    }

    fn expire_attempts(&mut self, now: Instant) {
        let timeout = self.options.timeout;
        let expired: Vec<usize> = self
            .in_flight
            .iter()
            .filter(|(_, a)| now.saturating_duration_since(a.started) >= timeout)
            .map(|(&i, _)| i)
            .collect();

        for index in expired {
            if let Some(attempt) = self.in_flight.remove(&index) {
                attempt.cancel.store(true, Ordering::Relaxed);
                self.abandoned.insert(attempt.token);
            }
            self.record_failure(index, format!("attempt timed out after {timeout:?}"));
        }
    }

    fn finish(&self) -> Result<AcquisitionReport> {
        let report = lock_ledger(&self.ledger).clone();
        let failed = report.failed();
        tracing::info!(
            job = %self.name,
            succeeded = report.succeeded(),
            failed,
            bytes = report.bytes_transferred(),
            "Acquisition job finished"
        );
        if failed == 0 {
            Ok(report)
        } else {
            Err(acquire::incomplete(failed, report.total()))
        }
    }
}

impl Operation for JobOperation {
    type Output = AcquisitionReport;

    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, now: Instant) -> Step<AcquisitionReport> {
        self.collect_results();
        self.expire_attempts(now);

        let limit = self.options.concurrency.max(1);
        while self.in_flight.len() + self.abandoned.len() < limit {
            let Some(index) = self.queue.pop_front() else {
                break;
            };
            self.launch(index, now);
        }

        if self.queue.is_empty() && self.in_flight.is_empty() {
            Step::Ready(self.finish())
        } else {
            Step::Pending
        }
    }

    fn progress(&self) -> f32 {
        lock_ledger(&self.ledger).progress()
    }

    fn abort(&mut self) {
        // Transfers that already landed keep their outcome
        self.collect_results();
        for attempt in self.in_flight.values() {
            attempt.cancel.store(true, Ordering::Relaxed);
        }
        self.in_flight.clear();
        self.queue.clear();

        let mut ledger = lock_ledger(&self.ledger);
        for item in &mut ledger.items {
            if !item.status.is_finished() {
                item.status = ItemStatus::Canceled;
            }
        }
    }
}
