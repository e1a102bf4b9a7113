//! Resource types observed through the provider
//!
//! Provider status strings are parsed into closed enums per resource kind.
//! Anything the provider reports that we do not recognize lands in
//! `Unknown` and is treated as non-terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of cloud resource handled by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Volume,
    Snapshot,
    Attachment,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Volume => write!(f, "volume"),
            ResourceKind::Snapshot => write!(f, "snapshot"),
            ResourceKind::Attachment => write!(f, "attachment"),
        }
    }
}

/// Where a resource stands with respect to its last requested transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Not terminal yet
    Pending,
    /// Success-terminal
    Succeeded,
    /// Failure-terminal
    Failed,
}

impl Readiness {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Readiness::Pending)
    }
}

/// Result of describing a resource by its unique identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// More than one record matched; carries the number of matches
    Multiple(usize),
}

impl<T> Lookup<T> {
    /// Build a lookup from every record the provider returned for one id
    pub fn from_records(mut records: Vec<T>) -> Self {
        match records.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(records.remove(0)),
            n => Lookup::Multiple(n),
        }
    }
}

/// Block-storage volume status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStatus {
    Creating,
    Available,
    InUse,
    Attaching,
    Detaching,
    Deleting,
    ReIniting,
    Unknown(String),
}

impl VolumeStatus {
    /// Parse a provider status string (`In_use`, `Available`, `in-use`, ...)
    pub fn parse(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "creating" => VolumeStatus::Creating,
            "available" => VolumeStatus::Available,
            "in_use" | "inuse" => VolumeStatus::InUse,
            "attaching" => VolumeStatus::Attaching,
            "detaching" => VolumeStatus::Detaching,
            "deleting" => VolumeStatus::Deleting,
            "reiniting" | "re_initing" => VolumeStatus::ReIniting,
            _ => VolumeStatus::Unknown(raw.to_string()),
        }
    }

    /// Readiness after a create: usable once available or in use
    pub fn readiness(&self) -> Readiness {
        match self {
            VolumeStatus::Available | VolumeStatus::InUse => Readiness::Succeeded,
            _ => Readiness::Pending,
        }
    }
}

impl std::fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeStatus::Creating => write!(f, "creating"),
            VolumeStatus::Available => write!(f, "available"),
            VolumeStatus::InUse => write!(f, "in_use"),
            VolumeStatus::Attaching => write!(f, "attaching"),
            VolumeStatus::Detaching => write!(f, "detaching"),
            VolumeStatus::Deleting => write!(f, "deleting"),
            VolumeStatus::ReIniting => write!(f, "reiniting"),
            VolumeStatus::Unknown(raw) => write!(f, "unknown({})", raw),
        }
    }
}

/// Snapshot status. Once `Accomplished` or `Failed` it never goes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Progressing,
    Accomplished,
    Failed,
    Unknown(String),
}

impl SnapshotStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "progressing" => SnapshotStatus::Progressing,
            "accomplished" => SnapshotStatus::Accomplished,
            "failed" => SnapshotStatus::Failed,
            _ => SnapshotStatus::Unknown(raw.to_string()),
        }
    }

    pub fn readiness(&self) -> Readiness {
        match self {
            SnapshotStatus::Accomplished => Readiness::Succeeded,
            SnapshotStatus::Failed => Readiness::Failed,
            _ => Readiness::Pending,
        }
    }
}

impl std::fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotStatus::Progressing => write!(f, "progressing"),
            SnapshotStatus::Accomplished => write!(f, "accomplished"),
            SnapshotStatus::Failed => write!(f, "failed"),
            SnapshotStatus::Unknown(raw) => write!(f, "unknown({})", raw),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('-', "_")
}

/// Block-storage volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Provider-assigned identifier
    pub id: String,

    pub status: VolumeStatus,

    /// Size in GiB
    pub size_gb: u64,

    /// Provider-reported device path, present only while attached
    pub device: Option<String>,
}

impl Volume {
    pub fn new(id: impl Into<String>, status: VolumeStatus, size_gb: u64) -> Self {
        Self {
            id: id.into(),
            status,
            size_gb,
            device: None,
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Whether the provider shows this volume attached to an instance
    pub fn is_attached(&self) -> bool {
        self.status == VolumeStatus::InUse || self.device.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Point-in-time snapshot of a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,

    pub status: SnapshotStatus,

    /// Size of the source volume in GiB
    pub source_size_gb: u64,

    pub creation_time: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(id: impl Into<String>, status: SnapshotStatus, source_size_gb: u64) -> Self {
        Self {
            id: id.into(),
            status,
            source_size_gb,
            creation_time: None,
        }
    }

    pub fn with_creation_time(mut self, time: DateTime<Utc>) -> Self {
        self.creation_time = Some(time);
        self
    }
}

/// Volume-to-instance attachment, identified by the pair it relates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attachment {
    pub volume_id: String,
    pub instance_id: String,

    /// Host-visible device path
    pub device: String,
}

impl Attachment {
    pub fn key(&self) -> (&str, &str) {
        (&self.volume_id, &self.instance_id)
    }
}

/// Parameters for creating a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub size_gb: u64,

    /// Restore the volume from this snapshot
    pub snapshot_id: Option<String>,

    /// Provider disk category
    pub category: String,

    pub encrypted: bool,
}

impl VolumeSpec {
    pub fn new(size_gb: u64) -> Self {
        Self {
            size_gb,
            snapshot_id: None,
            category: "cloud_ssd".to_string(),
            encrypted: true,
        }
    }

    pub fn from_snapshot(mut self, snapshot_id: impl Into<String>) -> Self {
        self.snapshot_id = Some(snapshot_id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// Parameters for snapshotting a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSpec {
    pub volume_id: String,
    pub description: String,
}

impl SnapshotSpec {
    pub fn new(volume_id: impl Into<String>) -> Self {
        Self {
            volume_id: volume_id.into(),
            description: "Automated backup".to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
