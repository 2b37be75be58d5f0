//! Host mode: content patched from a remote source

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::acquire::{self, AcquisitionJob, AcquisitionKind, AcquisitionRequest, Transport};
use crate::cache::CacheCheck;
use crate::error::{Result, manifest as manifest_err};
use crate::manifest::{Manifest, ManifestDocument, PackageBundle};
use crate::operation::{OperationHandle, ReadyOperation, Scheduler, TaskOperation};
use crate::resolver::BundleResolver;

use super::activate::ActivateManifest;
use super::integrity::{Check, IntegrityScan};
use super::{IntegrityReport, ModeContext, ModeKind, PlayMode, RemoteSource};

/// Manifest shipped with the application in host mode
#[derive(Debug, Clone)]
struct Embedded {
    document: ManifestDocument,
    /// Bundle name -> hash
    hashes: HashMap<String, String>,
}

/// Mode for patchable content
///
/// Versions and manifests come from a [`RemoteSource`]; bundles are fetched
/// through the download transport. When the application ships an embedded
/// manifest, bundles whose name and hash match it are served from the
/// payload (and can be copied into the cache through the unpack transport).
pub struct HostMode {
    remote: Arc<dyn RemoteSource>,
    download: Arc<dyn Transport>,
    unpack: Option<Arc<dyn Transport>>,
    embedded: Option<Embedded>,
}

impl HostMode {
    pub fn new(remote: Arc<dyn RemoteSource>, download: Arc<dyn Transport>) -> Self {
        Self {
            remote,
            download,
            unpack: None,
            embedded: None,
        }
    }

    /// Use `document` as the embedded manifest
    #[must_use]
    pub fn with_embedded(mut self, document: ManifestDocument) -> Self {
        let hashes = document
            .bundles
            .iter()
            .map(|b| (b.name.clone(), b.hash.clone()))
            .collect();
        self.embedded = Some(Embedded { document, hashes });
        self
    }

    /// Transport used by unpack jobs to copy embedded bundles into the cache
    #[must_use]
    pub fn with_unpack(mut self, transport: Arc<dyn Transport>) -> Self {
        self.unpack = Some(transport);
        self
    }

    pub fn has_embedded(&self) -> bool {
        self.embedded.is_some()
    }
}

impl PlayMode for HostMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Host
    }

    fn is_embedded(&self, bundle: &PackageBundle) -> bool {
        self.embedded
            .as_ref()
            .and_then(|e| e.hashes.get(&bundle.name))
            .is_some_and(|hash| *hash == bundle.hash)
    }

    fn initialize(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
    ) -> OperationHandle<Arc<Manifest>> {
        let case = ctx.case;

        if let Some(embedded) = &self.embedded {
            let manifest = Manifest::from_document(embedded.document.clone(), case).map(Arc::new);
            let ready = ReadyOperation::new("initialize", manifest);
            return scheduler.start(ActivateManifest::new(ready, &ctx.slot, &ctx.package));
        }

        let remote = Arc::clone(&self.remote);
        let package = ctx.package.clone();
        let fetch = TaskOperation::new("initialize", move || {
            let version = remote.fetch_version(&package)?;
            let bytes = remote.fetch_manifest(&package, &version)?;
            Manifest::load(&bytes, case).map(Arc::new)
        });
        scheduler.start(ActivateManifest::new(fetch, &ctx.slot, &ctx.package))
    }

    fn update_version(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        timeout: Duration,
    ) -> OperationHandle<String> {
        let remote = Arc::clone(&self.remote);
        let package = ctx.package.clone();
        let fetch = TaskOperation::new("update_version", move || {
            let version = remote.fetch_version(&package)?;
            tracing::info!(package = %package, version = %version, "Remote version");
            Ok(version)
        });
        scheduler.start_with_timeout(fetch, timeout)
    }

    fn update_manifest(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        version: &str,
        timeout: Duration,
    ) -> OperationHandle<Arc<Manifest>> {
        let remote = Arc::clone(&self.remote);
        let package = ctx.package.clone();
        let version = version.to_string();
        let case = ctx.case;

        let fetch = TaskOperation::new("update_manifest", move || {
            let bytes = remote.fetch_manifest(&package, &version)?;
            let manifest = Manifest::load(&bytes, case)?;
            if manifest.version() != version {
                return Err(manifest_err::malformed(format!(
                    "remote manifest has version '{}', requested '{}'",
                    manifest.version(),
                    version
                )));
            }
            Ok(Arc::new(manifest))
        });

        scheduler.start_with_timeout(
            ActivateManifest::new(fetch, &ctx.slot, &ctx.package),
            timeout,
        )
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
        let embedded: HashMap<String, String> = self
            .embedded
            .as_ref()
            .map(|e| e.hashes.clone())
            .unwrap_or_default();
        let check: Check = Arc::new(move |bundle: &PackageBundle| {
            match cache.verify(bundle) {
                // Served from the payload, nothing to check locally
                CacheCheck::Missing if embedded.get(&bundle.name) == Some(&bundle.hash) => None,
                outcome => Some(outcome),
            }
        });

        scheduler.start(IntegrityScan::new(
            "verify_integrity",
            manifest.bundles().to_vec(),
            check,
        ))
    }

    fn create_acquisition_job(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        request: &AcquisitionRequest,
    ) -> Result<AcquisitionJob> {
        let manifest = ctx.active()?;
        let transport = match request.kind {
            AcquisitionKind::Download => Some(Arc::clone(&self.download)),
            AcquisitionKind::Unpack => self.unpack.clone(),
        };
        let Some(transport) = transport else {
            return Ok(AcquisitionJob::empty(request.kind));
        };

        let resolver = BundleResolver::new(
            &manifest,
            ctx.cache.as_ref(),
            self,
            ctx.addresses.as_ref(),
        );
        let requests = acquire::plan(&resolver, request.kind, &request.selector)?;
        tracing::info!(
            package = %ctx.package,
            kind = %request.kind,
            bundles = requests.len(),
            "Created acquisition job"
        );

        Ok(AcquisitionJob::start(
            scheduler,
            request.kind,
            requests,
            transport,
            request.options,
        ))
    }
}
