//! Alibaba Cloud ECS adapter for DiskFlow
//!
//! This crate implements the ResourceAdapter trait for Alibaba Cloud,
//! letting DiskFlow manage ECS disks, snapshots and disk attachments.
//!
//! # Requirements
//!
//! - `aliyun` CLI must be installed and configured
//! - Credentials are managed through the aliyun CLI profile
//!
//! # Example
//!
//! ```ignore
//! use diskflow_cloud::{Orchestrator, ResourceAdapter};
//! use diskflow_cloud_aliyun::AliyunProvider;
//! use std::sync::Arc;
//!
//! let provider = AliyunProvider::new("cn-hangzhou")
//!     .for_instance("i-bp1234")
//!     .await?;
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let orchestrator = Orchestrator::new(Arc::new(provider));
//! ```

pub mod aliyun;
pub mod device;
pub mod error;
pub mod provider;

pub use aliyun::{AliyunCli, CallerIdentity, DiskItem, SnapshotItem};
pub use device::XvdDevices;
pub use error::{AliyunError, Result};
pub use provider::AliyunProvider;
