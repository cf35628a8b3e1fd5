//! What a provisioning run produced
//!
//! The report separates the pipeline's fate from teardown's: the process
//! outcome is decided by `failure` alone, while the teardown field only
//! feeds the summary log.

use tracing::{error, info, warn};

use crate::provision::guard::TeardownOutcome;
use crate::provision::kind::ResourceKind;

/// One resource the run created, in creation order
#[derive(Debug, Clone)]
pub struct CreatedResource {
    pub kind: ResourceKind,
    pub name: String,
    pub id: String,
}

/// The step that stopped the run
#[derive(Debug)]
pub struct StepFailure {
    /// Position in the plan, starting at 1
    pub step: usize,
    pub kind: ResourceKind,
    pub name: String,
    pub error: anyhow::Error,
}

/// Full record of one run
#[derive(Debug)]
pub struct RunReport {
    pub created: Vec<CreatedResource>,
    pub failure: Option<StepFailure>,
    pub teardown: TeardownOutcome,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Log the wrap-up: what was created, where it stopped, how teardown went
    pub fn log_summary(&self) {
        info!(created = self.created.len(), "Provisioning run finished");
        for resource in &self.created {
            info!(kind = resource.kind.label(), name = %resource.name, id = %resource.id, "Created");
        }

        if let Some(failure) = &self.failure {
            error!(
                step = failure.step,
                kind = failure.kind.label(),
                name = %failure.name,
                error = ?failure.error,
                "Stopped at the first failed step"
            );
        }

        match &self.teardown {
            TeardownOutcome::NothingToClean => {
                info!("Nothing was created remotely, no clean up was necessary");
            }
            TeardownOutcome::Deleted { group_id } => {
                info!(group = %group_id, "Resource group cleaned up");
            }
            TeardownOutcome::Failed { group_id, message } => {
                warn!(
                    group = %group_id,
                    message = %message,
                    "Clean up failed, resources may remain"
                );
            }
        }
    }

    /// Collapse the report into the process outcome.
    ///
    /// Only a provisioning failure produces an error; a failed teardown does
    /// not, by contract.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self.failure {
            None => Ok(()),
            Some(failure) => Err(failure.error.context(format!(
                "Provisioning failed at step {} ({} '{}')",
                failure.step,
                failure.kind.label(),
                failure.name
            ))),
        }
    }
}
