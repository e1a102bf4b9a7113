//! Resource provider adapter trait definition

use crate::error::Result;
use crate::labels::Tags;
use crate::model::{Lookup, Snapshot, SnapshotSpec, Volume, VolumeSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Resource provider adapter
///
/// The narrow seam between the lifecycle core and a vendor's control-plane
/// API. Implementations issue the calls and report what the provider says;
/// they never poll, verify or compensate. Any `Err` returned here is a
/// transport or authorization failure and is fatal to the calling operation.
/// A resource that exists but reports a failure status is returned as `Ok`.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Returns the provider name (e.g., "aliyun")
    fn name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Request a new volume, returning its identifier
    async fn create_volume(&self, spec: &VolumeSpec, name: &str, tags: &Tags) -> Result<String>;

    async fn describe_volume(&self, id: &str) -> Result<Lookup<Volume>>;

    async fn delete_volume(&self, id: &str) -> Result<()>;

    /// Request a new snapshot, returning its identifier
    async fn create_snapshot(
        &self,
        spec: &SnapshotSpec,
        name: &str,
        tags: &Tags,
    ) -> Result<String>;

    async fn describe_snapshot(&self, id: &str) -> Result<Lookup<Snapshot>>;

    async fn delete_snapshot(&self, id: &str) -> Result<()>;

    async fn attach_volume(&self, volume_id: &str, instance_id: &str) -> Result<()>;

    async fn detach_volume(&self, volume_id: &str, instance_id: &str) -> Result<()>;

    /// Volumes currently attached to an instance (those reporting a device)
    async fn list_instance_volumes(&self, instance_id: &str) -> Result<Vec<Volume>>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}
