//! Per-job configuration passed into every orchestrator call

use crate::device::{DeviceTranslator, IdentityDevices};
use crate::labels::{JobLabels, NameGenerator};
use crate::poller::PollConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything an operation needs besides the adapter and the inventory
#[derive(Clone)]
pub struct JobContext {
    pub poll: PollConfig,

    /// Cancelled when the caller is torn down; interrupts in-flight polls
    pub cancel: CancellationToken,

    pub names: Arc<dyn NameGenerator>,

    pub devices: Arc<dyn DeviceTranslator>,
}

impl JobContext {
    pub fn new(poll: PollConfig) -> Self {
        Self {
            poll,
            cancel: CancellationToken::new(),
            names: Arc::new(JobLabels::random()),
            devices: Arc::new(IdentityDevices),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_names(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = names;
        self
    }

    pub fn with_devices(mut self, devices: Arc<dyn DeviceTranslator>) -> Self {
        self.devices = devices;
        self
    }
}

impl Default for JobContext {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("poll", &self.poll)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
