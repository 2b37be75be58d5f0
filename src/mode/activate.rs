//! Manifest activation operation

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Result, manifest as manifest_err};
use crate::manifest::Manifest;
use crate::operation::{Operation, Step};

use super::ManifestSlot;

/// Wraps an operation that produces a manifest and activates the result
///
/// The slot generation is read when the activation is created; if another
/// manifest was activated in the meantime the result is rejected and the
/// newer manifest stays active.
pub(super) struct ActivateManifest<O> {
    source: O,
    slot: Arc<ManifestSlot>,
    package: String,
    expected_generation: u64,
}

impl<O> ActivateManifest<O>
where
    O: Operation<Output = Arc<Manifest>>,
{
    pub(super) fn new(source: O, slot: &Arc<ManifestSlot>, package: &str) -> Self {
        Self {
            source,
            expected_generation: slot.generation(),
            slot: Arc::clone(slot),
            package: package.to_string(),
        }
    }

    fn activate(&self, manifest: Arc<Manifest>) -> Result<Arc<Manifest>> {
        if manifest.package_name() != self.package {
            return Err(manifest_err::malformed(format!(
                "manifest belongs to package '{}', expected '{}'",
                manifest.package_name(),
                self.package
            )));
        }
        self.slot
            .activate(Arc::clone(&manifest), self.expected_generation)?;
        Ok(manifest)
    }
}

impl<O> Operation for ActivateManifest<O>
where
    O: Operation<Output = Arc<Manifest>>,
{
    type Output = Arc<Manifest>;

    fn name(&self) -> &str {
        self.source.name()
    }

    fn start(&mut self) {
        self.source.start();
    }

    fn poll(&mut self, now: Instant) -> Step<Arc<Manifest>> {
        match self.source.poll(now) {
            Step::Pending => Step::Pending,
            Step::Ready(result) => Step::Ready(result.and_then(|m| self.activate(m))),
        }
    }

    fn progress(&self) -> f32 {
        self.source.progress()
    }

    fn abort(&mut self) {
        self.source.abort();
    }
}
