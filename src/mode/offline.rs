//! Offline mode: every bundle ships inside the application

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::acquire::{AcquisitionJob, AcquisitionRequest};
use crate::cache::check_file;
use crate::error::{Result, fs as fs_err};
use crate::manifest::{Manifest, PackageBundle};
use crate::operation::{OperationHandle, ReadyOperation, Scheduler, TaskOperation};

use super::activate::ActivateManifest;
use super::integrity::{Check, IntegrityScan};
use super::{IntegrityReport, ModeContext, ModeKind, PlayMode};

/// Where the embedded manifest (and bundle files) come from
#[derive(Debug, Clone)]
pub enum Payload {
    /// Manifest bytes compiled into or handed over by the host; bundle
    /// content is not tracked
    Bytes(Arc<[u8]>),
    /// Payload directory holding `<package>.manifest.json` and bundle files
    Dir(PathBuf),
}

/// Embedded manifest location inside a payload directory
pub fn embedded_manifest_path(payload_dir: &Path, package: &str) -> PathBuf {
    payload_dir.join(format!("{package}.manifest.json"))
}

/// Mode for fully pre-packaged content
///
/// Every uncached bundle is served from the payload, updates return the
/// embedded manifest without any remote access, and acquisition jobs are
/// empty.
#[derive(Debug, Clone)]
pub struct OfflineMode {
    payload: Payload,
}

impl OfflineMode {
    pub fn new(payload: Payload) -> Self {
        Self { payload }
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(Payload::Bytes(bytes.into()))
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Payload::Dir(dir.into()))
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PlayMode for OfflineMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Offline
    }

    /// Always true: an uncached bundle is assumed to be in the payload
    /// without checking the payload itself.
    fn is_embedded(&self, _bundle: &PackageBundle) -> bool {
        true
    }

    fn initialize(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
    ) -> OperationHandle<Arc<Manifest>> {
        let payload = self.payload.clone();
        let package = ctx.package.clone();
        let case = ctx.case;

        let load = TaskOperation::new("initialize", move || {
            let bytes: Vec<u8> = match payload {
                Payload::Bytes(bytes) => bytes.to_vec(),
                Payload::Dir(dir) => {
                    let path = embedded_manifest_path(&dir, &package);
                    fs::read(&path).map_err(|e| {
                        fs_err::read_failed(path.display().to_string(), e.to_string())
                    })?
                }
            };
            Manifest::load(&bytes, case).map(Arc::new)
        });

        scheduler.start(ActivateManifest::new(load, &ctx.slot, &ctx.package))
    }

    fn update_version(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        timeout: Duration,
    ) -> OperationHandle<String> {
        let version = ctx.active().map(|m| m.version().to_string());
        scheduler.start_with_timeout(ReadyOperation::new("update_version", version), timeout)
    }

    fn update_manifest(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        version: &str,
        timeout: Duration,
    ) -> OperationHandle<Arc<Manifest>> {
        let active = ctx.active();
        if let Ok(manifest) = &active {
            if manifest.version() != version {
                tracing::debug!(
                    requested = version,
                    embedded = manifest.version(),
                    "Offline mode keeps the embedded manifest"
                );
            }
        }
        scheduler.start_with_timeout(ReadyOperation::new("update_manifest", active), timeout)
    }

    fn verify_integrity(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
    ) -> OperationHandle<IntegrityReport> {
        let manifest = match ctx.active() {
            Ok(manifest) => manifest,
            Err(e) => return OperationHandle::completed("verify_integrity", Err(e)),
        };

        let cache = Arc::clone(&ctx.cache);
        let payload_dir = match &self.payload {
            Payload::Dir(dir) => Some(dir.clone()),
            Payload::Bytes(_) => None,
        };
        let check: Check = Arc::new(move |bundle: &PackageBundle| {
            if cache.is_cached(bundle) {
                return Some(cache.verify(bundle));
            }
            payload_dir
                .as_ref()
                .map(|dir| check_file(&dir.join(bundle.file_name()), bundle))
        });

        scheduler.start(IntegrityScan::new(
            "verify_integrity",
            manifest.bundles().to_vec(),
            check,
        ))
    }

    fn create_acquisition_job(
        &self,
        _ctx: &ModeContext,
        _scheduler: &mut Scheduler,
        request: &AcquisitionRequest,
    ) -> Result<AcquisitionJob> {
        Ok(AcquisitionJob::empty(request.kind))
    }
}
