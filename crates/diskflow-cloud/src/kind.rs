//! Per-kind capability set the orchestrator is generic over

use crate::error::Result;
use crate::labels::Tags;
use crate::model::{
    Lookup, Readiness, ResourceKind, Snapshot, SnapshotSpec, Volume, VolumeSpec,
};
use crate::provider::ResourceAdapter;
use async_trait::async_trait;
use std::fmt::Debug;

/// Create/describe/delete/readiness for one kind of resource
#[async_trait]
pub trait ManagedKind: Send + Sync + 'static {
    /// Creation parameters
    type Spec: Debug + Send + Sync;

    /// What a describe call reports
    type Record: Debug + Clone + Send + Sync;

    const KIND: ResourceKind;

    /// Prefix for generated provider-side names
    const NAME_PREFIX: &'static str;

    async fn create(
        adapter: &dyn ResourceAdapter,
        spec: &Self::Spec,
        name: &str,
        tags: &Tags,
    ) -> Result<String>;

    async fn describe(adapter: &dyn ResourceAdapter, id: &str) -> Result<Lookup<Self::Record>>;

    async fn delete(adapter: &dyn ResourceAdapter, id: &str) -> Result<()>;

    fn readiness(record: &Self::Record) -> Readiness;

    fn status(record: &Self::Record) -> String;
}

/// Block-storage volumes
pub struct Volumes;

#[async_trait]
impl ManagedKind for Volumes {
    type Spec = VolumeSpec;
    type Record = Volume;

    const KIND: ResourceKind = ResourceKind::Volume;
    const NAME_PREFIX: &'static str = "diskflow-disk";

    async fn create(
        adapter: &dyn ResourceAdapter,
        spec: &VolumeSpec,
        name: &str,
        tags: &Tags,
    ) -> Result<String> {
        adapter.create_volume(spec, name, tags).await
    }

    async fn describe(adapter: &dyn ResourceAdapter, id: &str) -> Result<Lookup<Volume>> {
        adapter.describe_volume(id).await
    }

    async fn delete(adapter: &dyn ResourceAdapter, id: &str) -> Result<()> {
        adapter.delete_volume(id).await
    }

    fn readiness(record: &Volume) -> Readiness {
        record.status.readiness()
    }

    fn status(record: &Volume) -> String {
        record.status.to_string()
    }
}

/// Point-in-time snapshots
pub struct Snapshots;

#[async_trait]
impl ManagedKind for Snapshots {
    type Spec = SnapshotSpec;
    type Record = Snapshot;

    const KIND: ResourceKind = ResourceKind::Snapshot;
    const NAME_PREFIX: &'static str = "diskflow-snapshot";

    async fn create(
        adapter: &dyn ResourceAdapter,
        spec: &SnapshotSpec,
        name: &str,
        tags: &Tags,
    ) -> Result<String> {
        adapter.create_snapshot(spec, name, tags).await
    }

    async fn describe(adapter: &dyn ResourceAdapter, id: &str) -> Result<Lookup<Snapshot>> {
        adapter.describe_snapshot(id).await
    }

    async fn delete(adapter: &dyn ResourceAdapter, id: &str) -> Result<()> {
        adapter.delete_snapshot(id).await
    }

    fn readiness(record: &Snapshot) -> Readiness {
        record.status.readiness()
    }

    fn status(record: &Snapshot) -> String {
        record.status.to_string()
    }
}
