//! Terminal-state predicates used while polling
//!
//! Each predicate answers "has this resource stopped moving?" from a single
//! describe call. A `false` answer only means "not yet". Several records for
//! one identifier is logged and answered with `false`, so a transient listing
//! glitch turns into a timeout at worst, never into a crash of the poll loop.

use crate::error::Result;
use crate::kind::{ManagedKind, Volumes};
use crate::model::{Lookup, ResourceKind, VolumeStatus};
use crate::provider::ResourceAdapter;
use tracing::{debug, warn};

/// Whether a resource of kind `K` reached a success- or failure-terminal state
pub async fn is_terminal<K: ManagedKind>(adapter: &dyn ResourceAdapter, id: &str) -> Result<bool> {
    match K::describe(adapter, id).await? {
        Lookup::Found(record) => {
            let readiness = K::readiness(&record);
            debug!(kind = %K::KIND, id, status = %K::status(&record), ?readiness, "Observed");
            Ok(readiness.is_terminal())
        }
        Lookup::NotFound => {
            // Freshly created resources can take a moment to show up
            debug!(kind = %K::KIND, id, "Not visible yet");
            Ok(false)
        }
        Lookup::Multiple(count) => {
            ambiguous(K::KIND, id, count);
            Ok(false)
        }
    }
}

/// Whether the provider no longer reports the resource
pub async fn is_absent<K: ManagedKind>(adapter: &dyn ResourceAdapter, id: &str) -> Result<bool> {
    match K::describe(adapter, id).await? {
        Lookup::NotFound => Ok(true),
        Lookup::Found(record) => {
            debug!(kind = %K::KIND, id, status = %K::status(&record), "Still present");
            Ok(false)
        }
        Lookup::Multiple(count) => {
            ambiguous(K::KIND, id, count);
            Ok(false)
        }
    }
}

/// Whether an attach has taken effect.
///
/// Only `in_use` counts. A volume that is merely `available` right after an
/// attach request has not been attached yet.
pub async fn is_attached(adapter: &dyn ResourceAdapter, volume_id: &str) -> Result<bool> {
    volume_status_is(adapter, volume_id, VolumeStatus::InUse).await
}

/// Whether a detach has taken effect (the volume is `available` again)
pub async fn is_detached(adapter: &dyn ResourceAdapter, volume_id: &str) -> Result<bool> {
    volume_status_is(adapter, volume_id, VolumeStatus::Available).await
}

async fn volume_status_is(
    adapter: &dyn ResourceAdapter,
    volume_id: &str,
    wanted: VolumeStatus,
) -> Result<bool> {
    match Volumes::describe(adapter, volume_id).await? {
        Lookup::Found(volume) => {
            let reached = volume.status == wanted;
            debug!(volume_id, status = %volume.status, wanted = %wanted, "Observed");
            Ok(reached)
        }
        Lookup::NotFound => {
            debug!(volume_id, "Volume not visible");
            Ok(false)
        }
        Lookup::Multiple(count) => {
            ambiguous(ResourceKind::Volume, volume_id, count);
            Ok(false)
        }
    }
}

fn ambiguous(kind: ResourceKind, id: &str, count: usize) {
    warn!(%kind, id, count, "More than one record found for a unique id, treating as not ready");
}
