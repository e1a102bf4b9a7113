//! Undoing the completed steps of a failed operation
//!
//! Every create-class operation records what it has finished in a
//! `CompletedSteps` list. When a later phase fails, the steps are undone in
//! reverse order and the original error is handed back to the caller.
//! Errors raised while undoing are logged and attached to the failure, never
//! substituted for the original.

use crate::context::JobContext;
use crate::error::{CloudError, OperationFailure, Result};
use crate::kind::{ManagedKind, Snapshots, Volumes};
use crate::model::{Lookup, ResourceKind};
use crate::orchestrator::Orchestrator;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// One finished phase of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// The provider accepted a create call and returned an id
    Created { kind: ResourceKind, id: String },

    /// The provider accepted an attach call
    AttachRequested {
        volume_id: String,
        instance_id: String,
    },

    /// The volume's device path was written to the inventory
    DeviceRecorded { volume_id: String },

    /// The attachment was written to the inventory
    AttachmentRecorded {
        volume_id: String,
        instance_id: String,
    },
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Created { kind, id } => write!(f, "created {} {}", kind, id),
            Step::AttachRequested {
                volume_id,
                instance_id,
            } => write!(f, "attach of {} to {} requested", volume_id, instance_id),
            Step::DeviceRecorded { volume_id } => write!(f, "device of {} recorded", volume_id),
            Step::AttachmentRecorded {
                volume_id,
                instance_id,
            } => write!(f, "attachment {}:{} recorded", volume_id, instance_id),
        }
    }
}

/// Steps finished so far by one operation, in completion order
#[derive(Debug, Clone, Default)]
pub struct CompletedSteps {
    steps: Vec<Step>,
}

impl CompletedSteps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn into_vec(self) -> Vec<Step> {
        self.steps
    }
}

impl Orchestrator {
    /// Undo `steps` in reverse order and wrap `error` into an `OperationFailure`
    pub(crate) async fn compensate(
        &self,
        ctx: &JobContext,
        steps: CompletedSteps,
        error: CloudError,
    ) -> OperationFailure {
        let completed = steps.into_vec();
        let mut compensation_errors = Vec::new();

        for step in completed.iter().rev() {
            warn!(step = %step, original = %error, "Compensating");
            if let Err(e) = self.undo(ctx, step).await {
                error!(step = %step, error = %e, original = %error, "Compensation failed");
                compensation_errors.push(e);
            }
        }

        OperationFailure {
            error,
            completed,
            compensation_errors,
        }
    }

    async fn undo(&self, ctx: &JobContext, step: &Step) -> Result<()> {
        match step {
            Step::Created {
                kind: ResourceKind::Volume,
                id,
            } => self.remove::<Volumes>(ctx, id).await,
            Step::Created {
                kind: ResourceKind::Snapshot,
                id,
            } => self.remove::<Snapshots>(ctx, id).await,
            Step::Created {
                kind: ResourceKind::Attachment,
                id,
            } => {
                warn!(id, "Attachments are undone through their attach step");
                Ok(())
            }
            Step::AttachRequested {
                volume_id,
                instance_id,
            } => self.reconcile_attachment(ctx, volume_id, instance_id).await,
            Step::DeviceRecorded { volume_id } => {
                self.inventory().remove_device(volume_id);
                Ok(())
            }
            Step::AttachmentRecorded {
                volume_id,
                instance_id,
            } => {
                self.inventory().remove_attachment(volume_id, instance_id);
                Ok(())
            }
        }
    }

    /// The attach call may have taken effect even though the operation
    /// failed afterwards. Look at the live state and detach if so.
    async fn reconcile_attachment(
        &self,
        ctx: &JobContext,
        volume_id: &str,
        instance_id: &str,
    ) -> Result<()> {
        match Volumes::describe(self.adapter(), volume_id).await? {
            Lookup::Found(volume) if volume.is_attached() => {
                warn!(
                    volume_id,
                    instance_id,
                    status = %volume.status,
                    "Volume is attached although the attach failed, detaching"
                );
                self.detach_volume(ctx, volume_id, instance_id).await
            }
            Lookup::Found(volume) => {
                info!(volume_id, status = %volume.status, "Volume not attached, nothing to undo");
                Ok(())
            }
            Lookup::NotFound => Err(CloudError::NotFound {
                kind: ResourceKind::Volume,
                id: volume_id.to_string(),
            }),
            Lookup::Multiple(count) => Err(CloudError::Ambiguous {
                kind: ResourceKind::Volume,
                id: volume_id.to_string(),
                count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_keep_completion_order() {
        let mut steps = CompletedSteps::new();
        assert!(steps.is_empty());

        steps.record(Step::AttachRequested {
            volume_id: "d-1".to_string(),
            instance_id: "i-1".to_string(),
        });
        steps.record(Step::DeviceRecorded {
            volume_id: "d-1".to_string(),
        });

        assert_eq!(steps.len(), 2);
        let steps = steps.into_vec();
        assert!(matches!(steps[0], Step::AttachRequested { .. }));
        assert!(matches!(steps[1], Step::DeviceRecorded { .. }));
    }

    #[test]
    fn test_step_display() {
        let step = Step::Created {
            kind: ResourceKind::Snapshot,
            id: "s-1".to_string(),
        };
        assert_eq!(step.to_string(), "created snapshot s-1");
    }
}
