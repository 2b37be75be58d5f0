//! Integrity scan operation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use crate::cache::CacheCheck;
use crate::error::{Result, operation as op_err};
use crate::manifest::PackageBundle;
use crate::operation::{BackgroundTask, Operation, Step};

/// Outcome of an integrity verification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Bundles whose content was checked and found intact
    pub intact: usize,
    /// Bundles skipped because nothing tracks their content
    pub skipped: usize,
    /// Bundles expected locally but absent
    pub missing: Vec<String>,
    /// Bundles present but with wrong size or checksum, with the reason
    pub corrupt: Vec<(String, String)>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.corrupt.is_empty()
    }

    /// Bundles looked at, skipped ones included
    pub fn total(&self) -> usize {
        self.intact + self.skipped + self.missing.len() + self.corrupt.len()
    }
}

/// Per-bundle check; `None` skips the bundle
pub(super) type Check = Arc<dyn Fn(&PackageBundle) -> Option<CacheCheck> + Send + Sync>;

/// Checks every bundle on a worker thread
///
/// Hashing bundle files is blocking I/O, so the scan itself never runs on
/// the scheduler tick. Progress is published through an atomic counter.
pub(super) struct IntegrityScan {
    name: String,
    bundles: Option<Vec<PackageBundle>>,
    total: usize,
    check: Check,
    done: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    task: Option<BackgroundTask<IntegrityReport>>,
}

impl IntegrityScan {
    pub(super) fn new(name: &str, bundles: Vec<PackageBundle>, check: Check) -> Self {
        Self {
            name: name.to_string(),
            total: bundles.len(),
            bundles: Some(bundles),
            check,
            done: Arc::new(AtomicUsize::new(0)),
            stop: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn spawn(&self, bundles: Vec<PackageBundle>) -> Result<BackgroundTask<IntegrityReport>> {
        let check = Arc::clone(&self.check);
        let done = Arc::clone(&self.done);
        let stop = Arc::clone(&self.stop);
        let name = self.name.clone();

        BackgroundTask::spawn(&self.name, move || {
            let mut report = IntegrityReport::default();
            for bundle in &bundles {
                if stop.load(Ordering::Relaxed) {
                    return Err(op_err::canceled(&name));
                }
                match check(bundle) {
                    None => report.skipped += 1,
                    Some(CacheCheck::Intact) => report.intact += 1,
                    Some(CacheCheck::Missing) => report.missing.push(bundle.name.clone()),
                    Some(CacheCheck::Corrupt(reason)) => {
                        report.corrupt.push((bundle.name.clone(), reason));
                    }
                }
                done.fetch_add(1, Ordering::Relaxed);
            }
            Ok(report)
        })
    }
}

impl Operation for IntegrityScan {
    type Output = IntegrityReport;

    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, _now: Instant) -> Step<IntegrityReport> {
        if let Some(bundles) = self.bundles.take() {
            match self.spawn(bundles) {
                Ok(task) => self.task = Some(task),
                Err(e) => return Step::Ready(Err(e)),
            }
        }

        match self.task.as_ref().and_then(BackgroundTask::poll) {
            Some(Ok(report)) => {
                tracing::info!(
                    operation = %self.name,
                    intact = report.intact,
                    missing = report.missing.len(),
                    corrupt = report.corrupt.len(),
                    "Integrity scan finished"
                );
                Step::Ready(Ok(report))
            }
            Some(Err(e)) => Step::Ready(Err(e)),
            None => Step::Pending,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn progress(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.done.load(Ordering::Relaxed) as f32 / self.total as f32
    }

    fn abort(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.task = None;
    }
}
