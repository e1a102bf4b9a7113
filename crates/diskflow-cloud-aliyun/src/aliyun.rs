//! aliyun CLI wrapper
//!
//! Wraps the `aliyun ecs` and `aliyun sts` commands used for disk,
//! snapshot and attachment management.

use crate::error::{AliyunError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use diskflow_cloud::Tags;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;

/// aliyun CLI wrapper
pub struct AliyunCli {
    binary: String,
    region: String,
    profile: Option<String>,
}

impl AliyunCli {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            binary: "aliyun".to_string(),
            region: region.into(),
            profile: None,
        }
    }

    /// Use a named CLI profile instead of the default one
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Run a different executable (e.g. a pinned install path)
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Check that the CLI is installed and its credentials are accepted
    pub async fn caller_identity(&self) -> Result<CallerIdentity> {
        let output = self
            .run_command(&["sts".to_string(), "GetCallerIdentity".to_string()])
            .await?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Run an aliyun command and return stdout
    async fn run_command(&self, args: &[String]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        if let Some(profile) = &self.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // A dropped call (cancelled job) must not leave the CLI running
        cmd.kill_on_drop(true);

        tracing::debug!("Running: {} {}", self.binary, args.join(" "));

        let output = cmd.output().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AliyunError::CliNotFound,
            _ => AliyunError::IoError(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(classify_failure(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn ecs(&self, action: &str, params: Vec<(String, String)>) -> Result<String> {
        let mut args = vec!["ecs".to_string(), action.to_string()];
        for (key, value) in params {
            args.push(format!("--{}", key));
            args.push(value);
        }
        self.run_command(&args).await
    }

    pub async fn create_disk(&self, request: &CreateDiskRequest) -> Result<String> {
        let output = self.ecs("CreateDisk", request.params(&self.region)).await?;
        let created: CreateDiskResponse = serde_json::from_str(&output)?;
        Ok(created.disk_id)
    }

    /// Disks matching one id. More than one entry means the listing is ambiguous.
    pub async fn describe_disks(&self, disk_id: &str) -> Result<Vec<DiskItem>> {
        let output = self
            .ecs(
                "DescribeDisks",
                vec![
                    param("RegionId", &self.region),
                    param("DiskIds", id_list(disk_id)),
                    param("PageSize", "10"),
                ],
            )
            .await?;
        parse_disks(&output)
    }

    pub async fn describe_instance_disks(&self, instance_id: &str) -> Result<Vec<DiskItem>> {
        let output = self
            .ecs(
                "DescribeDisks",
                vec![
                    param("RegionId", &self.region),
                    param("InstanceId", instance_id),
                    param("PageSize", "100"),
                ],
            )
            .await?;
        parse_disks(&output)
    }

    pub async fn delete_disk(&self, disk_id: &str) -> Result<()> {
        self.ecs("DeleteDisk", vec![param("DiskId", disk_id)])
            .await?;
        Ok(())
    }

    pub async fn attach_disk(&self, disk_id: &str, instance_id: &str) -> Result<()> {
        self.ecs(
            "AttachDisk",
            vec![param("InstanceId", instance_id), param("DiskId", disk_id)],
        )
        .await?;
        Ok(())
    }

    pub async fn detach_disk(&self, disk_id: &str, instance_id: &str) -> Result<()> {
        self.ecs(
            "DetachDisk",
            vec![param("InstanceId", instance_id), param("DiskId", disk_id)],
        )
        .await?;
        Ok(())
    }

    pub async fn create_snapshot(&self, request: &CreateSnapshotRequest) -> Result<String> {
        let output = self.ecs("CreateSnapshot", request.params()).await?;
        let created: CreateSnapshotResponse = serde_json::from_str(&output)?;
        Ok(created.snapshot_id)
    }

    pub async fn describe_snapshots(&self, snapshot_id: &str) -> Result<Vec<SnapshotItem>> {
        let output = self
            .ecs(
                "DescribeSnapshots",
                vec![
                    param("RegionId", &self.region),
                    param("SnapshotIds", id_list(snapshot_id)),
                    param("PageSize", "10"),
                ],
            )
            .await?;
        parse_snapshots(&output)
    }

    pub async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        self.ecs("DeleteSnapshot", vec![param("SnapshotId", snapshot_id)])
            .await?;
        Ok(())
    }

    /// Availability zone of an instance
    pub async fn instance_zone(&self, instance_id: &str) -> Result<String> {
        let output = self
            .ecs(
                "DescribeInstances",
                vec![
                    param("RegionId", &self.region),
                    param("InstanceIds", id_list(instance_id)),
                ],
            )
            .await?;
        zone_of_instance(instance_id, &output)
    }
}

fn param(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

/// The API takes id filters as a JSON array
fn id_list(id: &str) -> String {
    serde_json::json!([id]).to_string()
}

/// `Tag.N.Key` / `Tag.N.Value` parameters, numbered from 1
pub fn tag_params(tags: &Tags) -> Vec<(String, String)> {
    tags.iter()
        .enumerate()
        .flat_map(|(i, (key, value))| {
            let n = i + 1;
            [
                (format!("Tag.{}.Key", n), key.clone()),
                (format!("Tag.{}.Value", n), value.clone()),
            ]
        })
        .collect()
}

fn classify_failure(stderr: String) -> AliyunError {
    const AUTH_CODES: [&str; 4] = [
        "InvalidAccessKeyId",
        "SignatureDoesNotMatch",
        "Forbidden",
        "can't get credential",
    ];
    if AUTH_CODES.iter().any(|code| stderr.contains(code)) {
        AliyunError::AuthenticationFailed(stderr.trim().to_string())
    } else {
        AliyunError::CommandFailed(stderr.trim().to_string())
    }
}

pub fn parse_disks(output: &str) -> Result<Vec<DiskItem>> {
    let response: DescribeDisksResponse = serde_json::from_str(output)?;
    Ok(response.disks.disk)
}

pub fn parse_snapshots(output: &str) -> Result<Vec<SnapshotItem>> {
    let response: DescribeSnapshotsResponse = serde_json::from_str(output)?;
    Ok(response.snapshots.snapshot)
}

fn zone_of_instance(instance_id: &str, output: &str) -> Result<String> {
    let response: DescribeInstancesResponse = serde_json::from_str(output)?;
    match response.instances.instance.as_slice() {
        [] => Err(AliyunError::InstanceNotFound(instance_id.to_string())),
        [instance] => Ok(instance.zone_id.clone()),
        _ => Err(AliyunError::AmbiguousInstance(instance_id.to_string())),
    }
}

/// Configuration for creating a disk
#[derive(Debug, Clone)]
pub struct CreateDiskRequest {
    pub zone: String,
    pub name: String,
    pub category: String,
    pub size_gb: u64,
    pub encrypted: bool,
    pub snapshot_id: Option<String>,
    pub tags: Tags,
}

impl CreateDiskRequest {
    fn params(&self, region: &str) -> Vec<(String, String)> {
        let mut params = vec![
            param("RegionId", region),
            param("ZoneId", &self.zone),
            param("DiskName", &self.name),
            param("DiskCategory", &self.category),
            param("Size", self.size_gb.to_string()),
            param("Encrypted", self.encrypted.to_string()),
        ];
        if let Some(snapshot_id) = &self.snapshot_id {
            params.push(param("SnapshotId", snapshot_id));
        }
        params.extend(tag_params(&self.tags));
        params
    }
}

/// Configuration for creating a snapshot
#[derive(Debug, Clone)]
pub struct CreateSnapshotRequest {
    pub disk_id: String,
    pub name: String,
    pub description: String,
    pub tags: Tags,
}

impl CreateSnapshotRequest {
    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            param("DiskId", &self.disk_id),
            param("SnapshotName", &self.name),
            param("Description", &self.description),
        ];
        params.extend(tag_params(&self.tags));
        params
    }
}

/// Identity of the configured credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateDiskResponse {
    disk_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSnapshotResponse {
    snapshot_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDisksResponse {
    disks: DiskList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DiskList {
    #[serde(default)]
    disk: Vec<DiskItem>,
}

/// Disk information from DescribeDisks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiskItem {
    pub disk_id: String,

    pub status: String,

    #[serde(default, deserialize_with = "size_from_any")]
    pub size: u64,

    /// e.g. /dev/xvdb; only set while the disk is in use
    #[serde(default)]
    pub device: Option<String>,

    #[serde(default)]
    pub instance_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSnapshotsResponse {
    snapshots: SnapshotList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SnapshotList {
    #[serde(default)]
    snapshot: Vec<SnapshotItem>,
}

/// Snapshot information from DescribeSnapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotItem {
    pub snapshot_id: String,

    pub status: String,

    #[serde(default, deserialize_with = "size_from_any")]
    pub source_disk_size: u64,

    #[serde(default)]
    pub creation_time: Option<String>,
}

impl SnapshotItem {
    /// Creation time as reported (`2024-05-01T08:30:12Z` or `2024-05-01T08:30Z`)
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.creation_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
                    .ok()
                    .map(|t| t.and_utc())
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesResponse {
    instances: InstanceList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceList {
    #[serde(default)]
    instance: Vec<InstanceItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceItem {
    zone_id: String,
}

/// Sizes come back as numbers for disks and as strings for snapshots
fn size_from_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid size '{}'", s))),
        serde_json::Value::Null => Ok(0),
        other => Err(serde::de::Error::custom(format!("invalid size {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_disks() {
        let output = r#"{
            "TotalCount": 1,
            "RequestId": "ABC",
            "Disks": {"Disk": [{
                "DiskId": "d-bp1",
                "Status": "In_use",
                "Size": 40,
                "Device": "/dev/xvdb",
                "InstanceId": "i-bp2",
                "Category": "cloud_ssd"
            }]}
        }"#;

        let disks = parse_disks(output).unwrap();
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].disk_id, "d-bp1");
        assert_eq!(disks[0].size, 40);
        assert_eq!(disks[0].device.as_deref(), Some("/dev/xvdb"));
    }

    #[test]
    fn test_parse_empty_disk_list() {
        let output = r#"{"TotalCount": 0, "Disks": {"Disk": []}}"#;
        assert!(parse_disks(output).unwrap().is_empty());
    }

    #[test]
    fn test_parse_snapshots_with_string_size() {
        let output = r#"{
            "Snapshots": {"Snapshot": [{
                "SnapshotId": "s-bp1",
                "Status": "progressing",
                "SourceDiskSize": "40",
                "CreationTime": "2024-05-01T08:30Z"
            }]}
        }"#;

        let snapshots = parse_snapshots(output).unwrap();
        assert_eq!(snapshots[0].source_disk_size, 40);
        let created = snapshots[0].created_at().unwrap();
        assert_eq!(created.to_rfc3339(), "2024-05-01T08:30:00+00:00");
    }

    #[test]
    fn test_tag_params_are_numbered_from_one() {
        let mut tags = Tags::new();
        tags.insert("diskflow:tool".to_string(), "diskflow".to_string());
        tags.insert("team".to_string(), "storage".to_string());

        let params = tag_params(&tags);
        assert_eq!(
            params,
            vec![
                param("Tag.1.Key", "diskflow:tool"),
                param("Tag.1.Value", "diskflow"),
                param("Tag.2.Key", "team"),
                param("Tag.2.Value", "storage"),
            ]
        );
    }

    #[test]
    fn test_create_disk_params() {
        let request = CreateDiskRequest {
            zone: "cn-hangzhou-h".to_string(),
            name: "diskflow-disk-1".to_string(),
            category: "cloud_ssd".to_string(),
            size_gb: 40,
            encrypted: true,
            snapshot_id: Some("s-1".to_string()),
            tags: Tags::new(),
        };

        let params = request.params("cn-hangzhou");
        assert!(params.contains(&param("ZoneId", "cn-hangzhou-h")));
        assert!(params.contains(&param("Size", "40")));
        assert!(params.contains(&param("Encrypted", "true")));
        assert!(params.contains(&param("SnapshotId", "s-1")));
    }

    #[test]
    fn test_zone_of_instance() {
        let one = r#"{"Instances": {"Instance": [{"ZoneId": "cn-hangzhou-h"}]}}"#;
        assert_eq!(zone_of_instance("i-1", one).unwrap(), "cn-hangzhou-h");

        let none = r#"{"Instances": {"Instance": []}}"#;
        assert!(matches!(
            zone_of_instance("i-1", none),
            Err(AliyunError::InstanceNotFound(_))
        ));

        let two = r#"{"Instances": {"Instance": [{"ZoneId": "a"}, {"ZoneId": "b"}]}}"#;
        assert!(matches!(
            zone_of_instance("i-1", two),
            Err(AliyunError::AmbiguousInstance(_))
        ));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("ERROR: SDK.ServerError\nErrorCode: InvalidAccessKeyId.NotFound".to_string()),
            AliyunError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            classify_failure("ErrorCode: IncorrectDiskStatus".to_string()),
            AliyunError::CommandFailed(_)
        ));
    }

    #[test]
    fn test_missing_binary() {
        let cli = AliyunCli::new("cn-hangzhou").with_binary("diskflow-no-such-aliyun-binary");
        let result = tokio_test::block_on(cli.describe_disks("d-1"));
        assert!(matches!(result, Err(AliyunError::CliNotFound)));
    }
}
