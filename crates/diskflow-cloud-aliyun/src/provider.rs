//! Alibaba Cloud ECS provider implementation

use crate::aliyun::{AliyunCli, CreateDiskRequest, CreateSnapshotRequest, DiskItem, SnapshotItem};
use crate::error::AliyunError;
use async_trait::async_trait;
use diskflow_cloud::{
    AuthStatus, CloudError, Lookup, ResourceAdapter, Snapshot, SnapshotSpec, SnapshotStatus, Tags,
    Volume, VolumeSpec, VolumeStatus,
};

/// Alibaba Cloud ECS provider
pub struct AliyunProvider {
    cli: AliyunCli,
    zone: Option<String>,
}

impl AliyunProvider {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            cli: AliyunCli::new(region),
            zone: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.cli = self.cli.with_profile(profile);
        self
    }

    /// Zone new disks are created in
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Place new disks in the zone of the given instance
    pub async fn for_instance(mut self, instance_id: &str) -> diskflow_cloud::Result<Self> {
        let zone = self.cli.instance_zone(instance_id).await?;
        tracing::debug!("Instance {} is in zone {}", instance_id, zone);
        self.zone = Some(zone);
        Ok(self)
    }

    pub fn region(&self) -> &str {
        self.cli.region()
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }
}

fn to_volume(disk: DiskItem) -> Volume {
    let volume = Volume::new(disk.disk_id, VolumeStatus::parse(&disk.status), disk.size);
    match disk.device.filter(|d| !d.trim().is_empty()) {
        Some(device) => volume.with_device(device),
        None => volume,
    }
}

fn to_snapshot(item: SnapshotItem) -> Snapshot {
    let created = item.created_at();
    let snapshot = Snapshot::new(
        item.snapshot_id,
        SnapshotStatus::parse(&item.status),
        item.source_disk_size,
    );
    match created {
        Some(time) => snapshot.with_creation_time(time),
        None => snapshot,
    }
}

#[async_trait]
impl ResourceAdapter for AliyunProvider {
    fn name(&self) -> &str {
        "aliyun"
    }

    async fn check_auth(&self) -> diskflow_cloud::Result<AuthStatus> {
        match self.cli.caller_identity().await {
            Ok(identity) => Ok(AuthStatus::ok(
                identity.arn.unwrap_or(identity.account_id),
            )),
            Err(AliyunError::CliNotFound) => {
                Ok(AuthStatus::failed("aliyun CLI がインストールされていません"))
            }
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn create_volume(
        &self,
        spec: &VolumeSpec,
        name: &str,
        tags: &Tags,
    ) -> diskflow_cloud::Result<String> {
        let zone = self.zone.clone().ok_or_else(|| {
            CloudError::InvalidConfig("a zone is required to create disks".to_string())
        })?;
        let request = CreateDiskRequest {
            zone,
            name: name.to_string(),
            category: spec.category.clone(),
            size_gb: spec.size_gb,
            encrypted: spec.encrypted,
            snapshot_id: spec.snapshot_id.clone(),
            tags: tags.clone(),
        };
        tracing::info!("Creating disk {} ({} GB)", name, spec.size_gb);
        Ok(self.cli.create_disk(&request).await?)
    }

    async fn describe_volume(&self, id: &str) -> diskflow_cloud::Result<Lookup<Volume>> {
        let disks = self.cli.describe_disks(id).await?;
        Ok(Lookup::from_records(
            disks.into_iter().map(to_volume).collect(),
        ))
    }

    async fn delete_volume(&self, id: &str) -> diskflow_cloud::Result<()> {
        tracing::info!("Deleting disk {}", id);
        Ok(self.cli.delete_disk(id).await?)
    }

    async fn create_snapshot(
        &self,
        spec: &SnapshotSpec,
        name: &str,
        tags: &Tags,
    ) -> diskflow_cloud::Result<String> {
        let request = CreateSnapshotRequest {
            disk_id: spec.volume_id.clone(),
            name: name.to_string(),
            description: spec.description.clone(),
            tags: tags.clone(),
        };
        tracing::info!("Creating snapshot {} of disk {}", name, spec.volume_id);
        Ok(self.cli.create_snapshot(&request).await?)
    }

    async fn describe_snapshot(&self, id: &str) -> diskflow_cloud::Result<Lookup<Snapshot>> {
        let snapshots = self.cli.describe_snapshots(id).await?;
        Ok(Lookup::from_records(
            snapshots.into_iter().map(to_snapshot).collect(),
        ))
    }

    async fn delete_snapshot(&self, id: &str) -> diskflow_cloud::Result<()> {
        tracing::info!("Deleting snapshot {}", id);
        Ok(self.cli.delete_snapshot(id).await?)
    }

    async fn attach_volume(&self, volume_id: &str, instance_id: &str) -> diskflow_cloud::Result<()> {
        tracing::info!("Attaching disk {} to {}", volume_id, instance_id);
        Ok(self.cli.attach_disk(volume_id, instance_id).await?)
    }

    async fn detach_volume(&self, volume_id: &str, instance_id: &str) -> diskflow_cloud::Result<()> {
        tracing::info!("Detaching disk {} from {}", volume_id, instance_id);
        Ok(self.cli.detach_disk(volume_id, instance_id).await?)
    }

    async fn list_instance_volumes(
        &self,
        instance_id: &str,
    ) -> diskflow_cloud::Result<Vec<Volume>> {
        let disks = self.cli.describe_instance_disks(instance_id).await?;
        Ok(disks
            .into_iter()
            .map(to_volume)
            .filter(|v| v.device.is_some())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliyun::{parse_disks, parse_snapshots};

    #[test]
    fn test_to_volume_drops_blank_device() {
        let disks = parse_disks(
            r#"{"Disks": {"Disk": [
                {"DiskId": "d-1", "Status": "Available", "Size": 20, "Device": ""},
                {"DiskId": "d-2", "Status": "In_use", "Size": 40, "Device": "/dev/xvdc"}
            ]}}"#,
        )
        .unwrap();

        let volumes: Vec<Volume> = disks.into_iter().map(to_volume).collect();
        assert_eq!(volumes[0].status, VolumeStatus::Available);
        assert!(volumes[0].device.is_none());
        assert_eq!(volumes[1].status, VolumeStatus::InUse);
        assert_eq!(volumes[1].device.as_deref(), Some("/dev/xvdc"));
    }

    #[test]
    fn test_to_snapshot_keeps_creation_time() {
        let items = parse_snapshots(
            r#"{"Snapshots": {"Snapshot": [
                {"SnapshotId": "s-1", "Status": "accomplished", "SourceDiskSize": 40,
                 "CreationTime": "2024-05-01T08:30:12Z"}
            ]}}"#,
        )
        .unwrap();

        let snapshot = to_snapshot(items.into_iter().next().unwrap());
        assert_eq!(snapshot.status, SnapshotStatus::Accomplished);
        assert_eq!(snapshot.source_size_gb, 40);
        assert!(snapshot.creation_time.is_some());
    }

    #[test]
    fn test_create_volume_requires_zone() {
        let provider = AliyunProvider::new("cn-hangzhou");
        let result = tokio_test::block_on(provider.create_volume(
            &VolumeSpec::new(20),
            "diskflow-disk-1",
            &Tags::new(),
        ));
        assert!(matches!(result, Err(CloudError::InvalidConfig(_))));
    }

    #[test]
    fn test_provider_name() {
        let provider = AliyunProvider::new("cn-hangzhou").with_zone("cn-hangzhou-h");
        assert_eq!(provider.name(), "aliyun");
        assert_eq!(provider.zone(), Some("cn-hangzhou-h"));
    }
}
