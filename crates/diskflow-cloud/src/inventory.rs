//! Inventory of resources created during the current job
//!
//! Pure bookkeeping: the orchestrator adds and removes entries at fixed
//! points of each operation. Handles are cheap to clone and every mutation
//! is serialized behind one mutex, so independent operations running on
//! separate tasks can share a tracker.

use crate::model::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Point-in-time copy of the inventory, used for end-of-job reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub volumes: BTreeSet<String>,
    pub snapshots: BTreeSet<String>,

    /// Volume id -> provider device path
    pub devices: BTreeMap<String, String>,

    /// Volume id -> instance id
    pub attachments: BTreeMap<String, String>,

    /// Last mutation
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryReport {
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
            && self.snapshots.is_empty()
            && self.devices.is_empty()
            && self.attachments.is_empty()
    }
}

/// Shared handle to the job's inventory
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    inner: Arc<Mutex<InventoryReport>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InventoryReport> {
        // Entries are plain values; a panic elsewhere cannot leave them half-written
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(state: &mut InventoryReport) {
        state.updated_at = Some(Utc::now());
    }

    /// Record a live volume or snapshot
    pub fn register(&self, kind: ResourceKind, id: &str) {
        let mut state = self.lock();
        let inserted = match kind {
            ResourceKind::Volume => state.volumes.insert(id.to_string()),
            ResourceKind::Snapshot => state.snapshots.insert(id.to_string()),
            ResourceKind::Attachment => {
                tracing::warn!(id, "Attachments are tracked by volume, ignoring register");
                false
            }
        };
        if inserted {
            Self::touch(&mut state);
            tracing::debug!(%kind, id, "Registered");
        }
    }

    /// Forget a volume or snapshot. Returns whether it was tracked.
    pub fn deregister(&self, kind: ResourceKind, id: &str) -> bool {
        let mut state = self.lock();
        let removed = match kind {
            ResourceKind::Volume => state.volumes.remove(id),
            ResourceKind::Snapshot => state.snapshots.remove(id),
            ResourceKind::Attachment => false,
        };
        if removed {
            Self::touch(&mut state);
            tracing::debug!(%kind, id, "Deregistered");
        }
        removed
    }

    pub fn contains(&self, kind: ResourceKind, id: &str) -> bool {
        let state = self.lock();
        match kind {
            ResourceKind::Volume => state.volumes.contains(id),
            ResourceKind::Snapshot => state.snapshots.contains(id),
            ResourceKind::Attachment => state.attachments.contains_key(id),
        }
    }

    pub fn set_device(&self, volume_id: &str, device: &str) {
        let mut state = self.lock();
        state
            .devices
            .insert(volume_id.to_string(), device.to_string());
        Self::touch(&mut state);
    }

    pub fn remove_device(&self, volume_id: &str) -> Option<String> {
        let mut state = self.lock();
        let removed = state.devices.remove(volume_id);
        if removed.is_some() {
            Self::touch(&mut state);
        }
        removed
    }

    pub fn device_of(&self, volume_id: &str) -> Option<String> {
        self.lock().devices.get(volume_id).cloned()
    }

    pub fn add_attachment(&self, volume_id: &str, instance_id: &str) {
        let mut state = self.lock();
        state
            .attachments
            .insert(volume_id.to_string(), instance_id.to_string());
        Self::touch(&mut state);
    }

    /// Forget an attachment if it relates exactly this pair
    pub fn remove_attachment(&self, volume_id: &str, instance_id: &str) -> bool {
        let mut state = self.lock();
        if state.attachments.get(volume_id).map(String::as_str) == Some(instance_id) {
            state.attachments.remove(volume_id);
            Self::touch(&mut state);
            true
        } else {
            false
        }
    }

    pub fn attachment_of(&self, volume_id: &str) -> Option<String> {
        self.lock().attachments.get(volume_id).cloned()
    }

    pub fn report(&self) -> InventoryReport {
        self.lock().clone()
    }
}
