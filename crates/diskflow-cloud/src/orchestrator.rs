//! Lifecycle orchestrator
//!
//! Every mutating operation follows the same shape: issue the provider call,
//! poll until the resource stops moving, verify that where it stopped is
//! where we wanted it, then update the inventory. Any failure after the
//! provider accepted the call is compensated before it reaches the caller.

use crate::compensator::{CompletedSteps, Step};
use crate::context::JobContext;
use crate::error::{CloudError, OperationFailure, Result};
use crate::inspector;
use crate::inventory::Inventory;
use crate::kind::{ManagedKind, Snapshots, Volumes};
use crate::model::{
    Attachment, Lookup, Readiness, ResourceKind, Snapshot, SnapshotSpec, Volume, VolumeSpec,
};
use crate::poller::wait_until;
use crate::provider::ResourceAdapter;
use std::sync::Arc;
use tracing::{debug, error, info};

type OpResult<T> = std::result::Result<T, OperationFailure>;

/// Drives volumes, snapshots and attachments through their lifecycles
pub struct Orchestrator {
    adapter: Arc<dyn ResourceAdapter>,
    inventory: Inventory,
}

impl Orchestrator {
    pub fn new(adapter: Arc<dyn ResourceAdapter>) -> Self {
        Self::with_inventory(adapter, Inventory::new())
    }

    /// Share an existing inventory, e.g. between workers of the same job
    pub fn with_inventory(adapter: Arc<dyn ResourceAdapter>, inventory: Inventory) -> Self {
        Self { adapter, inventory }
    }

    pub fn adapter(&self) -> &dyn ResourceAdapter {
        self.adapter.as_ref()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Create a resource and wait until it is usable.
    ///
    /// On success the resource is registered in the inventory before this
    /// returns. If it times out or settles in a failure state it is deleted
    /// again and the original error is returned.
    pub async fn create<K: ManagedKind>(
        &self,
        ctx: &JobContext,
        spec: &K::Spec,
    ) -> OpResult<K::Record> {
        let name = ctx.names.generate(K::NAME_PREFIX);
        let tags = ctx.names.tags();
        info!(kind = %K::KIND, name = %name, ?spec, ?tags, "Creating");

        let id = K::create(self.adapter(), spec, &name, &tags)
            .await
            .map_err(|e| {
                error!(kind = %K::KIND, name = %name, error = %e, "Create call failed");
                OperationFailure::bare(e)
            })?;

        let mut steps = CompletedSteps::new();
        steps.record(Step::Created {
            kind: K::KIND,
            id: id.clone(),
        });

        match self.settle::<K>(ctx, &id).await {
            Ok(record) => {
                self.inventory.register(K::KIND, &id);
                info!(kind = %K::KIND, id = %id, status = %K::status(&record), "Created");
                Ok(record)
            }
            Err(e) => {
                error!(kind = %K::KIND, id = %id, error = %e, "Create failed");
                Err(self.compensate(ctx, steps, e).await)
            }
        }
    }

    /// Poll until terminal, then re-read and check which terminal state it is
    async fn settle<K: ManagedKind>(&self, ctx: &JobContext, id: &str) -> Result<K::Record> {
        let adapter = self.adapter();
        let description = format!("{} {} to become ready", K::KIND, id);
        wait_until(&description, &ctx.poll, &ctx.cancel, move || {
            inspector::is_terminal::<K>(adapter, id)
        })
        .await?;

        match K::describe(adapter, id).await? {
            Lookup::Found(record) => match K::readiness(&record) {
                Readiness::Succeeded => Ok(record),
                Readiness::Failed => Err(CloudError::TerminalFailure {
                    kind: K::KIND,
                    id: id.to_string(),
                    status: K::status(&record),
                }),
                Readiness::Pending => Err(CloudError::Inconsistency(format!(
                    "{} {} went back to '{}' after settling",
                    K::KIND,
                    id,
                    K::status(&record)
                ))),
            },
            Lookup::NotFound => Err(CloudError::NotFound {
                kind: K::KIND,
                id: id.to_string(),
            }),
            Lookup::Multiple(count) => Err(CloudError::Ambiguous {
                kind: K::KIND,
                id: id.to_string(),
                count,
            }),
        }
    }

    /// Delete a resource and wait until the provider no longer reports it
    pub async fn delete<K: ManagedKind>(&self, ctx: &JobContext, id: &str) -> OpResult<()> {
        self.remove::<K>(ctx, id).await.map_err(|e| {
            error!(kind = %K::KIND, id, error = %e, "Delete failed");
            OperationFailure::bare(e)
        })
    }

    pub(crate) async fn remove<K: ManagedKind>(&self, ctx: &JobContext, id: &str) -> Result<()> {
        let adapter = self.adapter();
        info!(kind = %K::KIND, id, "Deleting");

        K::delete(adapter, id).await?;

        let description = format!("{} {} to be deleted", K::KIND, id);
        wait_until(&description, &ctx.poll, &ctx.cancel, move || {
            inspector::is_absent::<K>(adapter, id)
        })
        .await?;

        // The poll can be fooled by a stale listing; ask once more directly
        match K::describe(adapter, id).await? {
            Lookup::NotFound => {
                self.inventory.deregister(K::KIND, id);
                info!(kind = %K::KIND, id, "Deleted");
                Ok(())
            }
            Lookup::Found(_) => Err(CloudError::StillPresent {
                kind: K::KIND,
                id: id.to_string(),
            }),
            Lookup::Multiple(count) => Err(CloudError::Ambiguous {
                kind: K::KIND,
                id: id.to_string(),
                count,
            }),
        }
    }

    pub async fn create_volume(&self, ctx: &JobContext, spec: &VolumeSpec) -> OpResult<Volume> {
        self.create::<Volumes>(ctx, spec).await
    }

    pub async fn delete_volume(&self, ctx: &JobContext, id: &str) -> OpResult<()> {
        self.delete::<Volumes>(ctx, id).await
    }

    pub async fn create_snapshot(
        &self,
        ctx: &JobContext,
        spec: &SnapshotSpec,
    ) -> OpResult<Snapshot> {
        self.create::<Snapshots>(ctx, spec).await
    }

    pub async fn delete_snapshot(&self, ctx: &JobContext, id: &str) -> OpResult<()> {
        self.delete::<Snapshots>(ctx, id).await
    }

    /// Attach a volume to an instance and resolve its host device.
    ///
    /// A provider that accepts the attach but exposes no device is treated
    /// as a fatal inconsistency. Before the error is returned the live state
    /// is checked and the volume is detached again if the attach did land.
    pub async fn attach(
        &self,
        ctx: &JobContext,
        volume_id: &str,
        instance_id: &str,
    ) -> OpResult<Attachment> {
        info!(volume_id, instance_id, "Attaching");

        self.adapter
            .attach_volume(volume_id, instance_id)
            .await
            .map_err(|e| {
                error!(volume_id, instance_id, error = %e, "Attach call failed");
                OperationFailure::bare(e)
            })?;

        let mut steps = CompletedSteps::new();
        steps.record(Step::AttachRequested {
            volume_id: volume_id.to_string(),
            instance_id: instance_id.to_string(),
        });

        let outcome = self
            .finish_attach(ctx, volume_id, instance_id, &mut steps)
            .await;
        match outcome {
            Ok(attachment) => {
                info!(
                    volume_id,
                    instance_id,
                    device = %attachment.device,
                    "Attached"
                );
                Ok(attachment)
            }
            Err(e) => {
                error!(volume_id, instance_id, error = %e, "Attach failed");
                Err(self.compensate(ctx, steps, e).await)
            }
        }
    }

    async fn finish_attach(
        &self,
        ctx: &JobContext,
        volume_id: &str,
        instance_id: &str,
        steps: &mut CompletedSteps,
    ) -> Result<Attachment> {
        let adapter = self.adapter();
        let description = format!("volume {} to attach to {}", volume_id, instance_id);
        wait_until(&description, &ctx.poll, &ctx.cancel, move || {
            inspector::is_attached(adapter, volume_id)
        })
        .await?;

        let provider_device = match Volumes::describe(adapter, volume_id).await? {
            Lookup::Found(volume) => volume.device,
            Lookup::NotFound => {
                return Err(CloudError::NotFound {
                    kind: ResourceKind::Volume,
                    id: volume_id.to_string(),
                });
            }
            Lookup::Multiple(count) => {
                return Err(CloudError::Ambiguous {
                    kind: ResourceKind::Volume,
                    id: volume_id.to_string(),
                    count,
                });
            }
        };

        let device = provider_device
            .as_deref()
            .and_then(|d| ctx.devices.to_host(d))
            .ok_or_else(|| {
                CloudError::Inconsistency(format!(
                    "volume {} is in use by {} but no device was reported (provider device: {:?})",
                    volume_id, instance_id, provider_device
                ))
            })?;

        self.inventory.set_device(volume_id, &device);
        steps.record(Step::DeviceRecorded {
            volume_id: volume_id.to_string(),
        });

        self.inventory.add_attachment(volume_id, instance_id);
        steps.record(Step::AttachmentRecorded {
            volume_id: volume_id.to_string(),
            instance_id: instance_id.to_string(),
        });

        Ok(Attachment {
            volume_id: volume_id.to_string(),
            instance_id: instance_id.to_string(),
            device,
        })
    }

    /// Detach a volume and wait until it is available again
    pub async fn detach(
        &self,
        ctx: &JobContext,
        volume_id: &str,
        instance_id: &str,
    ) -> OpResult<()> {
        self.detach_volume(ctx, volume_id, instance_id)
            .await
            .map_err(|e| {
                error!(volume_id, instance_id, error = %e, "Detach failed");
                OperationFailure::bare(e)
            })
    }

    pub(crate) async fn detach_volume(
        &self,
        ctx: &JobContext,
        volume_id: &str,
        instance_id: &str,
    ) -> Result<()> {
        let adapter = self.adapter();
        info!(volume_id, instance_id, "Detaching");

        adapter.detach_volume(volume_id, instance_id).await?;

        let description = format!("volume {} to detach from {}", volume_id, instance_id);
        wait_until(&description, &ctx.poll, &ctx.cancel, move || {
            inspector::is_detached(adapter, volume_id)
        })
        .await?;

        self.inventory.remove_device(volume_id);
        self.inventory.remove_attachment(volume_id, instance_id);
        info!(volume_id, instance_id, "Detached");
        Ok(())
    }

    /// Describe a volume. Several matches is an error here.
    pub async fn volume(&self, id: &str) -> Result<Option<Volume>> {
        unique::<Volumes>(self.adapter(), id).await
    }

    pub async fn snapshot(&self, id: &str) -> Result<Option<Snapshot>> {
        unique::<Snapshots>(self.adapter(), id).await
    }

    pub async fn volume_exists(&self, id: &str) -> Result<bool> {
        Ok(self.volume(id).await?.is_some())
    }

    pub async fn snapshot_exists(&self, id: &str) -> Result<bool> {
        Ok(self.snapshot(id).await?.is_some())
    }

    /// Snapshots stay in their region; the copy is the snapshot itself
    pub async fn copy_snapshot(&self, id: &str) -> Result<Option<Snapshot>> {
        self.snapshot(id).await
    }

    pub async fn attached_volumes(&self, instance_id: &str) -> Result<Vec<Volume>> {
        self.adapter.list_instance_volumes(instance_id).await
    }

    /// Find the volume behind a host device and remember its device path
    pub async fn find_volume_by_device(
        &self,
        ctx: &JobContext,
        instance_id: &str,
        host_device: &str,
    ) -> Result<Option<Volume>> {
        let provider_device = ctx.devices.to_provider(host_device);
        let volumes = self.attached_volumes(instance_id).await?;
        debug!(
            instance_id,
            host_device,
            provider_device = %provider_device,
            count = volumes.len(),
            "Looking up volume by device"
        );

        let found = volumes
            .into_iter()
            .find(|v| v.device.as_deref() == Some(provider_device.as_str()));

        if let Some(volume) = &found {
            self.inventory.set_device(&volume.id, host_device);
        }
        Ok(found)
    }

    /// Host device path of a tracked volume, with an optional partition suffix
    pub fn mountpoint(&self, volume_id: &str, partition: Option<&str>) -> Option<String> {
        let device = self.inventory.device_of(volume_id)?;
        Some(match partition {
            Some(p) => format!("{}{}", device, p),
            None => device,
        })
    }
}

async fn unique<K: ManagedKind>(
    adapter: &dyn ResourceAdapter,
    id: &str,
) -> Result<Option<K::Record>> {
    match K::describe(adapter, id).await? {
        Lookup::Found(record) => Ok(Some(record)),
        Lookup::NotFound => Ok(None),
        Lookup::Multiple(count) => Err(CloudError::Ambiguous {
            kind: K::KIND,
            id: id.to_string(),
            count,
        }),
    }
}
