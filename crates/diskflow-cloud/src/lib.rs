//! DiskFlow Cloud Lifecycle
//!
//! This crate drives block-storage volumes, snapshots and volume attachments
//! through their lifecycles against an eventually consistent cloud
//! control plane, so that a backup/restore job never leaves an orphaned,
//! billable resource behind.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  DiskFlow CLI                    │
//! │          (diskflow snapshot/restore)             │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               diskflow-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │           Orchestrator                    │   │
//! │  │  create → poll → verify → register        │   │
//! │  │  (compensate on failure)                  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────┐ ┌───────────┐ ┌─────────────┐     │
//! │  │  Poller  │ │ Inspector │ │  Inventory  │     │
//! │  └──────────┘ └───────────┘ └─────────────┘     │
//! │  trait ResourceAdapter { ... }                   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │    aliyun     │
//! │   adapter     │
//! └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use diskflow_cloud::{JobContext, Orchestrator, SnapshotSpec};
//!
//! let orchestrator = Orchestrator::new(adapter);
//! let ctx = JobContext::default();
//!
//! let snapshot = orchestrator
//!     .create_snapshot(&ctx, &SnapshotSpec::new("d-123"))
//!     .await?;
//! println!("{}", snapshot.id);
//! ```

pub mod compensator;
pub mod context;
pub mod device;
pub mod error;
pub mod inspector;
pub mod inventory;
pub mod kind;
pub mod labels;
pub mod model;
pub mod orchestrator;
pub mod poller;
pub mod provider;

// Re-exports
pub use compensator::{CompletedSteps, Step};
pub use context::JobContext;
pub use device::{DeviceTranslator, IdentityDevices};
pub use error::{CloudError, OperationFailure, Result};
pub use inventory::{Inventory, InventoryReport};
pub use kind::{ManagedKind, Snapshots, Volumes};
pub use labels::{JobLabels, NameGenerator, Tags};
pub use model::{
    Attachment, Lookup, Readiness, ResourceKind, Snapshot, SnapshotSpec, SnapshotStatus, Volume,
    VolumeSpec, VolumeStatus,
};
pub use orchestrator::Orchestrator;
pub use poller::{PollConfig, wait_until};
pub use provider::{AuthStatus, ResourceAdapter};
