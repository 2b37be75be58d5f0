//! Package facade
//!
//! A [`Package`] ties one package name to its play mode, active manifest,
//! cache store, address resolver and scheduler. The mode is chosen at
//! construction and stays fixed for the lifetime of the package.
//!
//! Resolution calls are synchronous and read the active manifest; they fail
//! with `ServiceNotReady` until an initialize operation has activated one.
//! Everything that does I/O returns an operation handle instead and makes
//! progress when the scheduler ticks.

use std::sync::Arc;
use std::time::Duration;

use crate::acquire::{
    AcquisitionJob, AcquisitionKind, AcquisitionOptions, AcquisitionRequest, Selector,
};
use crate::cache::CacheStore;
use crate::error::Result;
use crate::location::{AddressResolver, DefaultAddressResolver};
use crate::manifest::{AddressCase, AssetInfo, Manifest};
use crate::mode::{IntegrityReport, ManifestSlot, ModeContext, ModeKind, PlayMode};
use crate::operation::{self, OperationHandle, SharedScheduler};
use crate::resolver::{AssetReference, BundleDecision, BundleResolver};

pub struct Package {
    name: String,
    mode: Box<dyn PlayMode>,
    case: AddressCase,
    slot: Arc<ManifestSlot>,
    cache: Arc<dyn CacheStore>,
    addresses: Arc<dyn AddressResolver>,
    scheduler: SharedScheduler,
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("name", &self.name)
            .field("mode", &self.mode.kind())
            .field("case", &self.case)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl Package {
    /// Create a package driven by the process-wide scheduler
    pub fn new(
        name: impl Into<String>,
        mode: impl PlayMode + 'static,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let name = name.into();
        Self {
            slot: Arc::new(ManifestSlot::new(name.clone())),
            name,
            mode: Box::new(mode),
            case: AddressCase::default(),
            cache,
            addresses: Arc::new(DefaultAddressResolver::default()),
            scheduler: operation::global(),
        }
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SharedScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    #[must_use]
    pub fn with_address_resolver(mut self, addresses: Arc<dyn AddressResolver>) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    fn context(&self) -> ModeContext {
        ModeContext {
            package: self.name.clone(),
            case: self.case,
            slot: Arc::clone(&self.slot),
            cache: Arc::clone(&self.cache),
            addresses: Arc::clone(&self.addresses),
        }
    }

    fn resolver<'a>(&'a self, manifest: &'a Manifest) -> BundleResolver<'a> {
        BundleResolver::new(
            manifest,
            self.cache.as_ref(),
            self.mode.as_ref(),
            self.addresses.as_ref(),
        )
    }

    // --- Lifecycle -----------------------------------------------------------

    /// Load and activate the initial manifest
    ///
    /// `case` fixes how addresses are normalized for every manifest this
    /// package activates from now on.
    pub fn initialize(&mut self, case: AddressCase) -> OperationHandle<Arc<Manifest>> {
        self.case = case;
        let ctx = self.context();
        let mut scheduler = operation::lock(&self.scheduler);
        self.mode.initialize(&ctx, &mut scheduler)
    }

    pub fn update_version(&self, timeout: Duration) -> OperationHandle<String> {
        let ctx = self.context();
        let mut scheduler = operation::lock(&self.scheduler);
        self.mode.update_version(&ctx, &mut scheduler, timeout)
    }

    pub fn update_manifest(
        &self,
        version: &str,
        timeout: Duration,
    ) -> OperationHandle<Arc<Manifest>> {
        let ctx = self.context();
        let mut scheduler = operation::lock(&self.scheduler);
        self.mode
            .update_manifest(&ctx, &mut scheduler, version, timeout)
    }

    pub fn verify_integrity(&self) -> OperationHandle<IntegrityReport> {
        let ctx = self.context();
        let mut scheduler = operation::lock(&self.scheduler);
        self.mode.verify_integrity(&ctx, &mut scheduler)
    }

    pub fn create_download_job(
        &self,
        selector: Selector,
        options: AcquisitionOptions,
    ) -> Result<AcquisitionJob> {
        self.create_job(AcquisitionKind::Download, selector, options)
    }

    pub fn create_unpack_job(
        &self,
        selector: Selector,
        options: AcquisitionOptions,
    ) -> Result<AcquisitionJob> {
        self.create_job(AcquisitionKind::Unpack, selector, options)
    }

    fn create_job(
        &self,
        kind: AcquisitionKind,
        selector: Selector,
        options: AcquisitionOptions,
    ) -> Result<AcquisitionJob> {
        let request = AcquisitionRequest {
            kind,
            selector,
            options,
        };
        let ctx = self.context();
        let mut scheduler = operation::lock(&self.scheduler);
        self.mode
            .create_acquisition_job(&ctx, &mut scheduler, &request)
    }

    /// Advance every operation on this package's scheduler once
    pub fn tick(&self) -> usize {
        operation::lock(&self.scheduler).tick()
    }

    /// Tick until `handle` is terminal, releasing the scheduler between ticks
    pub fn wait<T>(&self, handle: &OperationHandle<T>, interval: Duration) {
        while !handle.is_done() {
            self.tick();
            if handle.is_done() {
                break;
            }
            std::thread::sleep(interval);
        }
    }

    // --- Queries -------------------------------------------------------------

    /// The active manifest, or `ServiceNotReady`
    pub fn active_manifest(&self) -> Result<Arc<Manifest>> {
        self.context().active()
    }

    /// Version of the active manifest, empty before initialization
    pub fn package_version(&self) -> String {
        self.slot
            .current()
            .map(|m| m.version().to_string())
            .unwrap_or_default()
    }

    pub fn is_services_valid(&self) -> bool {
        self.slot.current().is_some()
    }

    pub fn resolve_bundle(&self, address: &str) -> Result<BundleDecision> {
        let manifest = self.active_manifest()?;
        self.resolver(&manifest).resolve_bundle(address)
    }

    pub fn resolve_dependencies(&self, address: &str) -> Result<Vec<BundleDecision>> {
        let manifest = self.active_manifest()?;
        self.resolver(&manifest).resolve_dependencies(address)
    }

    pub fn reference(&self, address: &str) -> Result<AssetReference> {
        let manifest = self.active_manifest()?;
        self.resolver(&manifest).reference(address)
    }

    pub fn query_by_tags(&self, tags: &[String]) -> Result<Vec<AssetInfo>> {
        let manifest = self.active_manifest()?;
        Ok(self.resolver(&manifest).query_by_tags(tags))
    }

    /// Internal asset path for `address`, or `UnknownAsset`
    pub fn mapping_to_asset_path(&self, address: &str) -> Result<String> {
        let manifest = self.active_manifest()?;
        self.resolver(&manifest)
            .asset_path(address)
            .map(str::to_string)
    }

    pub fn try_mapping_to_asset_path(&self, address: &str) -> Option<String> {
        let manifest = self.slot.current()?;
        self.resolver(&manifest)
            .try_asset_path(address)
            .map(str::to_string)
    }

    /// Asset record by internal path
    pub fn try_get_asset(&self, asset_path: &str) -> Option<AssetInfo> {
        self.slot.current()?.asset(asset_path).cloned()
    }

    /// Whether `file_name` is a bundle file of the active manifest
    pub fn is_included_bundle_file(&self, file_name: &str) -> bool {
        self.slot
            .current()
            .is_some_and(|m| m.contains_bundle_file(file_name))
    }
}
