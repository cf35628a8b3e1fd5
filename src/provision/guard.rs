//! Scope-bound holder of the created resource group id
//!
//! The group id is captured the moment the create call returns and released
//! only through `teardown`, which runs whether the pipeline finished or
//! failed partway. Holding the id in one place keeps the delete guarded: no
//! captured id means nothing was created remotely, so there is nothing to
//! clean up.

use tracing::{info, warn};

use crate::arm::{chain_is_not_found, ArmOperations};

/// What happened to the resource group at the end of a run
#[derive(Debug)]
pub enum TeardownOutcome {
    /// No group was ever created; the delete was skipped
    NothingToClean,
    /// The group, and every resource in it, is gone
    Deleted { group_id: String },
    /// The delete failed; resources may be left behind
    Failed { group_id: String, message: String },
}

impl TeardownOutcome {
    /// True unless the delete was attempted and failed
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Guard that owns the resource group id between capture and teardown
///
/// Dropping the guard with an id still held means a run path skipped
/// teardown; that gets a warning rather than a delete, since Drop cannot
/// await the API.
pub struct GroupGuard {
    group_id: Option<String>,
}

impl GroupGuard {
    /// Guard with nothing captured yet
    pub fn empty() -> Self {
        Self { group_id: None }
    }

    /// Record the id returned by the group create
    pub fn capture(&mut self, group_id: String) {
        info!(group = %group_id, "Captured resource group id for teardown");
        self.group_id = Some(group_id);
    }

    /// Id currently held, if any
    pub fn captured(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    /// Release the guard, deleting the group if one was created.
    ///
    /// Errors are folded into the outcome instead of propagated: teardown
    /// runs after the pipeline's fate is already decided and must never
    /// change it.
    pub async fn teardown<O: ArmOperations>(mut self, arm: &O) -> TeardownOutcome {
        let Some(group_id) = self.group_id.take() else {
            info!("Did not create any remote resources, no clean up necessary");
            return TeardownOutcome::NothingToClean;
        };

        info!(group = %group_id, "Deleting resource group and everything in it");
        match arm.delete_resource_group(&group_id).await {
            Ok(()) => {
                info!(group = %group_id, "Resource group deleted");
                TeardownOutcome::Deleted { group_id }
            }
            Err(error) if chain_is_not_found(&error) => {
                info!(group = %group_id, "Resource group already absent");
                TeardownOutcome::Deleted { group_id }
            }
            Err(error) => {
                warn!(
                    group = %group_id,
                    error = ?error,
                    "Failed to delete resource group, resources may be left behind"
                );
                TeardownOutcome::Failed {
                    group_id,
                    message: format!("{error:#}"),
                }
            }
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(group_id) = &self.group_id {
            warn!(
                group = %group_id,
                "Guard dropped without teardown, resource group may leak"
            );
        }
    }
}
