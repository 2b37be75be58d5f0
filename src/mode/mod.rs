//! Play modes: interchangeable content-acquisition strategies
//!
//! Every mode implements the same [`PlayMode`] capability set (initialize,
//! version and manifest update, integrity verification, acquisition jobs).
//! A package picks its mode once, at construction, and never switches.
//!
//! - [`OfflineMode`]: all content ships inside the application.
//! - [`HostMode`]: content is patched from a remote source.
//!
//! The active manifest lives in a [`ManifestSlot`]. Activation is the only
//! write and is checked against the slot generation the update started from,
//! so two overlapping updates never interleave: the stale one is rejected.

mod activate;
mod host;
mod integrity;
mod offline;
mod remote;


use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquire::{AcquisitionJob, AcquisitionRequest};
use crate::cache::CacheStore;
use crate::error::{Result, manifest as manifest_err, resolve};
use crate::location::AddressResolver;
use crate::manifest::{AddressCase, Manifest, PackageBundle};
use crate::operation::{OperationHandle, Scheduler};

pub use host::HostMode;
pub use integrity::IntegrityReport;
pub use offline::{OfflineMode, Payload, embedded_manifest_path};
pub use remote::{DirRemote, RemoteSource};

/// Which strategy a package uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Offline,
    Host,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::Offline => f.write_str("offline"),
            ModeKind::Host => f.write_str("host"),
        }
    }
}

struct SlotState {
    manifest: Option<Arc<Manifest>>,
    generation: u64,
}

/// The single active manifest of a package
pub struct ManifestSlot {
    package: String,
    state: RwLock<SlotState>,
}

impl fmt::Debug for ManifestSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestSlot")
            .field("package", &self.package)
            .field("generation", &self.generation())
            .finish()
    }
}

impl ManifestSlot {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            state: RwLock::new(SlotState {
                manifest: None,
                generation: 0,
            }),
        }
    }

    /// The active manifest, if any
    pub fn current(&self) -> Option<Arc<Manifest>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .manifest
            .clone()
    }

    /// Number of activations so far
    pub fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Replace the active manifest
    ///
    /// Fails with `ManifestUpdateConflict` when another activation happened
    /// since `expected_generation` was read. Returns the new generation.
    pub fn activate(&self, manifest: Arc<Manifest>, expected_generation: u64) -> Result<u64> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.generation != expected_generation {
            tracing::warn!(
                package = %self.package,
                expected_generation,
                generation = state.generation,
                "Rejected stale manifest activation"
            );
            return Err(manifest_err::update_conflict(&self.package));
        }

        state.generation += 1;
        tracing::info!(
            package = %self.package,
            version = manifest.version(),
            generation = state.generation,
            "Activated manifest"
        );
        state.manifest = Some(manifest);
        Ok(state.generation)
    }
}

/// Everything a mode needs from the package it serves
#[derive(Clone)]
pub struct ModeContext {
    pub package: String,
    pub case: AddressCase,
    pub slot: Arc<ManifestSlot>,
    pub cache: Arc<dyn CacheStore>,
    pub addresses: Arc<dyn AddressResolver>,
}

impl ModeContext {
    /// The active manifest, or `ServiceNotReady`
    pub fn active(&self) -> Result<Arc<Manifest>> {
        self.slot
            .current()
            .ok_or_else(|| resolve::not_ready(&self.package))
    }
}

/// Capability set shared by all modes
pub trait PlayMode: Send + Sync {
    fn kind(&self) -> ModeKind;

    /// Whether an uncached bundle can be served from the package payload
    fn is_embedded(&self, bundle: &PackageBundle) -> bool;

    /// Load and activate the initial manifest
    fn initialize(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
    ) -> OperationHandle<Arc<Manifest>>;

    /// Discover the newest package version
    fn update_version(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        timeout: Duration,
    ) -> OperationHandle<String>;

    /// Fetch, validate and activate the manifest of `version`
    fn update_manifest(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        version: &str,
        timeout: Duration,
    ) -> OperationHandle<Arc<Manifest>>;

    /// Report missing and corrupt bundles without modifying any store
    fn verify_integrity(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
    ) -> OperationHandle<IntegrityReport>;

    /// Plan and schedule a download or unpack job
    fn create_acquisition_job(
        &self,
        ctx: &ModeContext,
        scheduler: &mut Scheduler,
        request: &AcquisitionRequest,
    ) -> Result<AcquisitionJob>;
}
