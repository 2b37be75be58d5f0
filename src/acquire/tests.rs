//! Acquisition job and planning tests

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::cache::{CacheStore, DirCacheStore, MemoryCacheStore};
use crate::error::{ErrorKind, operation as op_err};
use crate::location::DefaultAddressResolver;
use crate::manifest::{AddressCase, Manifest};
use crate::mode::{DirRemote, HostMode, OfflineMode};
use crate::operation::{OperationStatus, Scheduler};
use crate::test_fixtures::{create_temp_dir, run, sample_document, sample_json, write_bundles};

fn requests() -> Vec<TransferRequest> {
    sample_document("v1")
        .bundles
        .iter()
        .map(TransferRequest::from)
        .collect()
}

fn options(concurrency: usize, retry: u32, timeout: Duration) -> AcquisitionOptions {
    AcquisitionOptions {
        concurrency,
        retry,
        timeout,
    }
}

/// Fails each bundle a configured number of times, then succeeds
#[derive(Default)]
struct FlakyTransport {
    failures: HashMap<String, u32>,
    calls: Mutex<HashMap<String, u32>>,
}

impl FlakyTransport {
    fn failing(failures: &[(&str, u32)]) -> Self {
        Self {
            failures: failures
                .iter()
                .map(|(name, n)| ((*name).to_string(), *n))
                .collect(),
            calls: Mutex::default(),
        }
    }
}

impl Transport for FlakyTransport {
    fn transfer(&self, request: &TransferRequest, _cancel: &AtomicBool) -> Result<TransferReceipt> {
        let mut calls = self.calls.lock().unwrap();
        let call = calls.entry(request.bundle.clone()).or_insert(0);
        *call += 1;
        if *call <= self.failures.get(&request.bundle).copied().unwrap_or(0) {
            return Err(crate::error::acquire::remote_fetch(
                &request.file_name,
                format!("attempt {call} refused"),
            ));
        }
        Ok(TransferReceipt {
            bytes: request.size,
        })
    }
}

/// Holds every transfer except `instant` until the attempt is canceled
struct BlockingTransport {
    instant: Vec<String>,
}

impl Transport for BlockingTransport {
    fn transfer(&self, request: &TransferRequest, cancel: &AtomicBool) -> Result<TransferReceipt> {
        if self.instant.contains(&request.bundle) {
            return Ok(TransferReceipt {
                bytes: request.size,
            });
        }
        while !cancel.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(1));
        }
        Err(op_err::canceled(format!("transfer {}", request.bundle)))
    }
}

/// Records the highest number of simultaneous transfers
#[derive(Default)]
struct CountingTransport {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Transport for CountingTransport {
    fn transfer(&self, request: &TransferRequest, _cancel: &AtomicBool) -> Result<TransferReceipt> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(TransferReceipt {
            bytes: request.size,
        })
    }
}

/// First attempt of each bundle ignores `cancel` for a while, later ones
/// succeed at once; records peak concurrency
#[derive(Default)]
struct StubbornTransport {
    seen: Mutex<Vec<String>>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Transport for StubbornTransport {
    fn transfer(&self, request: &TransferRequest, _cancel: &AtomicBool) -> Result<TransferReceipt> {
        let first = {
            let mut seen = self.seen.lock().unwrap();
            let first = !seen.contains(&request.bundle);
            seen.push(request.bundle.clone());
            first
        };
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if first {
            thread::sleep(Duration::from_millis(50));
        }
        self.current.fetch_sub(1, Ordering::SeqCst);
        if first {
            return Err(op_err::canceled(format!("transfer {}", request.bundle)));
        }
        Ok(TransferReceipt {
            bytes: request.size,
        })
    }
}

fn tick_until(sched: &mut Scheduler, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        sched.tick();
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_download_fills_dir_cache() {
    let temp = create_temp_dir();
    let remote = temp.path().join("remote");
    let doc = sample_document("v1");
    write_bundles(&remote, &doc, &["base", "extra", "dlc"]);
    let cache = DirCacheStore::for_package(&temp.path().join("cache"), "default");
    let mut sched = Scheduler::new();

    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        requests(),
        Arc::new(DirTransport::new(&remote, cache.root())),
        AcquisitionOptions::default(),
    );
    run(&mut sched, job.handle());

    assert_eq!(job.status(), OperationStatus::Succeeded);
    let report = job.handle().output().unwrap();
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.progress(), 1.0);
    assert!(doc.bundles.iter().all(|b| cache.is_cached(b)));
    assert_eq!(cache.stats().unwrap().entries, 3);
}

#[test]
fn test_retry_recovers_flaky_bundle() {
    let mut sched = Scheduler::new();
    let transport = Arc::new(FlakyTransport::failing(&[("extra", 2)]));
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        requests(),
        transport,
        options(4, 2, Duration::from_secs(10)),
    );
    run(&mut sched, job.handle());

    assert_eq!(job.status(), OperationStatus::Succeeded);
    let report = job.report();
    assert_eq!(
        report.item("extra").unwrap().status,
        ItemStatus::Succeeded {
            bytes: report.item("extra").unwrap().size,
            attempts: 3
        }
    );
    assert!(matches!(
        report.item("base").unwrap().status,
        ItemStatus::Succeeded { attempts: 1, .. }
    ));
}

#[test]
fn test_exhausted_retries_fail_only_that_bundle() {
    let mut sched = Scheduler::new();
    let transport = Arc::new(FlakyTransport::failing(&[("extra", u32::MAX)]));
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        requests(),
        transport,
        options(4, 1, Duration::from_secs(10)),
    );
    run(&mut sched, job.handle());

    assert_eq!(job.status(), OperationStatus::Failed);
    let err = job.handle().error().unwrap();
    assert_eq!(err.kind(), ErrorKind::AcquisitionFailed);
    assert!(err.to_string().contains("1 of 3"));

    // The report stays readable after failure
    let report = job.report();
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        &report.item("extra").unwrap().status,
        ItemStatus::Failed { attempts: 2, reason } if reason.contains("refused")
    ));
    let extra = report.item("extra").unwrap().size;
    assert_eq!(report.bytes_transferred(), report.total_bytes() - extra);
}

#[test]
fn test_attempt_timeout_counts_against_retries() {
    let mut sched = Scheduler::new();
    let request = requests().remove(1);
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        vec![request],
        Arc::new(BlockingTransport { instant: vec![] }),
        options(1, 1, Duration::from_millis(10)),
    );
    run(&mut sched, job.handle());

    assert_eq!(job.status(), OperationStatus::Failed);
    assert!(matches!(
        &job.report().items[0].status,
        ItemStatus::Failed { attempts: 2, reason } if reason.contains("timed out")
    ));
}

#[test]
fn test_concurrency_is_bounded() {
    let mut sched = Scheduler::new();
    let mut many = Vec::new();
    for i in 0..6 {
        let mut request = requests().remove(0);
        request.bundle = format!("bundle{i}");
        many.push(request);
    }
    let transport = Arc::new(CountingTransport::default());
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        many,
        Arc::clone(&transport) as Arc<dyn Transport>,
        options(2, 0, Duration::from_secs(10)),
    );
    run(&mut sched, job.handle());

    assert_eq!(job.report().succeeded(), 6);
    assert!(transport.peak.load(Ordering::SeqCst) <= 2);
}

#[test]
fn test_timed_out_worker_holds_its_slot() {
    let mut sched = Scheduler::new();
    let two: Vec<TransferRequest> = requests().into_iter().take(2).collect();
    let transport = Arc::new(StubbornTransport::default());
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        two,
        Arc::clone(&transport) as Arc<dyn Transport>,
        options(1, 1, Duration::from_millis(10)),
    );
    run(&mut sched, job.handle());

    assert_eq!(job.status(), OperationStatus::Succeeded);
    assert_eq!(transport.peak.load(Ordering::SeqCst), 1);
    let report = job.report();
    assert!(
        report
            .items
            .iter()
            .all(|item| matches!(item.status, ItemStatus::Succeeded { attempts: 2, .. }))
    );
}

#[test]
fn test_cancel_keeps_transfers_finished_between_ticks() {
    let mut sched = Scheduler::new();
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        requests(),
        Arc::new(FlakyTransport::default()),
        options(3, 0, Duration::from_secs(60)),
    );

    // One tick launches every transfer; the workers finish before the next
    sched.tick();
    assert_eq!(job.report().total(), 3);
    assert!(
        job.report()
            .items
            .iter()
            .all(|item| matches!(item.status, ItemStatus::Running { .. }))
    );
    thread::sleep(Duration::from_millis(50));

    job.cancel();
    sched.tick();

    assert_eq!(job.status(), OperationStatus::Canceled);
    let report = job.report();
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.canceled(), 0);
}

#[test]
fn test_cancel_keeps_completed_items() {
    let mut sched = Scheduler::new();
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Download,
        requests(),
        Arc::new(BlockingTransport {
            instant: vec!["base".to_string()],
        }),
        options(1, 0, Duration::from_secs(60)),
    );

    tick_until(&mut sched, || {
        let report = job.report();
        matches!(report.item("base").unwrap().status, ItemStatus::Succeeded { .. })
            && matches!(report.item("extra").unwrap().status, ItemStatus::Running { .. })
    });

    job.cancel();
    sched.tick();

    assert_eq!(job.status(), OperationStatus::Canceled);
    assert_eq!(job.handle().error().unwrap().kind(), ErrorKind::Canceled);
    let report = job.report();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.canceled(), 2);
    assert_eq!(report.finished(), 3);
    assert!(sched.is_idle());
}

#[test]
fn test_job_without_work_succeeds() {
    let mut sched = Scheduler::new();
    let job = AcquisitionJob::start(
        &mut sched,
        AcquisitionKind::Unpack,
        vec![],
        Arc::new(FlakyTransport::default()),
        AcquisitionOptions::default(),
    );
    sched.tick();
    assert_eq!(job.status(), OperationStatus::Succeeded);
    assert_eq!(job.progress(), 1.0);

    let empty = AcquisitionJob::empty(AcquisitionKind::Download);
    assert!(empty.is_done());
    assert_eq!(empty.report().kind, AcquisitionKind::Download);
}

fn planned(
    mode: &dyn crate::mode::PlayMode,
    cache: &MemoryCacheStore,
    kind: AcquisitionKind,
    selector: &Selector,
) -> Vec<String> {
    let manifest = Manifest::load(&sample_json("v1"), AddressCase::Preserve).unwrap();
    let addresses = DefaultAddressResolver::default();
    let resolver = BundleResolver::new(&manifest, cache, mode, &addresses);
    plan(&resolver, kind, selector)
        .unwrap()
        .into_iter()
        .map(|r| r.bundle)
        .collect()
}

fn host() -> HostMode {
    HostMode::new(
        Arc::new(DirRemote::new("/nonexistent/remote")),
        Arc::new(DirTransport::new("/nonexistent/remote", "/nonexistent/cache")),
    )
}

#[test]
fn test_plan_download_skips_cached_and_embedded() {
    let cache = MemoryCacheStore::with_bundles(["base"]);
    assert_eq!(
        planned(&host(), &cache, AcquisitionKind::Download, &Selector::All),
        vec!["extra", "dlc"]
    );
    assert_eq!(
        planned(
            &host(),
            &cache,
            AcquisitionKind::Download,
            &Selector::Tags(vec!["dlc".to_string()])
        ),
        vec!["dlc"]
    );

    let embedded = host().with_embedded(sample_document("v1"));
    assert!(planned(&embedded, &cache, AcquisitionKind::Download, &Selector::All).is_empty());

    let offline = OfflineMode::from_bytes(sample_json("v1"));
    assert!(planned(&offline, &cache, AcquisitionKind::Download, &Selector::All).is_empty());
}

#[test]
fn test_plan_unpack_takes_uncached_embedded() {
    let cache = MemoryCacheStore::with_bundles(["base"]);
    let offline = OfflineMode::from_bytes(sample_json("v1"));
    assert_eq!(
        planned(&offline, &cache, AcquisitionKind::Unpack, &Selector::All),
        vec!["extra", "dlc"]
    );
    assert!(planned(&host(), &cache, AcquisitionKind::Unpack, &Selector::All).is_empty());
    assert_eq!(
        planned(
            &offline,
            &cache,
            AcquisitionKind::Unpack,
            &Selector::Addresses(vec!["level/boss".to_string()])
        ),
        vec!["extra"]
    );
}
