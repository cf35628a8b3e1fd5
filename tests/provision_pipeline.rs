//! Pipeline behavior through the public API
//!
//! These tests drive the engine exactly the way the binary does, against a
//! hand-rolled recording implementation of the operations trait. They pin
//! the ordering contract: creates happen in plan order, the walk stops at
//! the first failure, and the group delete runs whenever the group was
//! created.

use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value;
use zonal_vm_demo::arm::ArmOperations;
use zonal_vm_demo::naming::ResourceNames;
use zonal_vm_demo::provision::{ProvisionEngine, ProvisionPlan, ResourceKind, TeardownOutcome};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    CreateGroup { id: String },
    Create { id: String, api_version: String },
    DeleteGroup { id: String },
}

/// Records every call in order; optionally refuses some of them
#[derive(Default)]
struct RecordingArm {
    calls: Mutex<Vec<Call>>,
    fail_creates_matching: Option<String>,
    fail_group_create: bool,
    fail_delete: bool,
}

impl RecordingArm {
    fn recorded(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ArmOperations for RecordingArm {
    async fn create_resource_group(&self, group_id: &str, _location: &str) -> Result<String> {
        self.calls.lock().unwrap().push(Call::CreateGroup {
            id: group_id.to_string(),
        });
        if self.fail_group_create {
            anyhow::bail!("group create refused");
        }
        Ok(group_id.to_string())
    }

    async fn create_resource(
        &self,
        resource_id: &str,
        api_version: &str,
        _body: Value,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Create {
            id: resource_id.to_string(),
            api_version: api_version.to_string(),
        });
        if let Some(marker) = &self.fail_creates_matching {
            if resource_id.contains(marker.as_str()) {
                anyhow::bail!("create refused for {resource_id}");
            }
        }
        Ok(())
    }

    async fn delete_resource_group(&self, group_id: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::DeleteGroup {
            id: group_id.to_string(),
        });
        if self.fail_delete {
            anyhow::bail!("delete refused");
        }
        Ok(())
    }
}

fn test_plan() -> ProvisionPlan {
    ProvisionPlan::build("sub-pipeline-test", "eastus2", ResourceNames::generate())
        .expect("plan should always build")
}

#[tokio::test]
async fn full_run_creates_everything_in_order_then_deletes_the_group() {
    let plan = test_plan();
    let arm = RecordingArm::default();

    let report = ProvisionEngine::new(&arm).run(&plan).await;

    assert!(report.succeeded());
    assert_eq!(report.created.len(), 10);

    let calls = arm.recorded();
    assert_eq!(calls.len(), 11, "10 creates plus the final delete");
    assert_eq!(
        calls[0],
        Call::CreateGroup {
            id: plan.group_id.clone()
        }
    );
    for (call, step) in calls[1..10].iter().zip(&plan.steps[1..]) {
        assert_eq!(
            call,
            &Call::Create {
                id: step.id.clone(),
                api_version: step.api_version.to_string(),
            }
        );
    }
    assert_eq!(
        calls[10],
        Call::DeleteGroup {
            id: plan.group_id.clone()
        }
    );
}

#[tokio::test]
async fn disk_failure_stops_the_walk_but_the_group_still_gets_deleted() {
    let plan = test_plan();
    let arm = RecordingArm {
        fail_creates_matching: Some("Microsoft.Compute/disks".to_string()),
        ..RecordingArm::default()
    };

    let report = ProvisionEngine::new(&arm).run(&plan).await;

    let failure = report.failure.as_ref().expect("run should have failed");
    assert_eq!(failure.step, 8);
    assert_eq!(failure.kind, ResourceKind::ManagedDisk);
    assert_eq!(report.created.len(), 7);

    let calls = arm.recorded();
    // Group, six dependent creates, the refused disk create, then the delete
    assert_eq!(calls.len(), 9);
    assert!(!calls.iter().any(|call| matches!(
        call,
        Call::Create { id, .. } if id.ends_with(&plan.names.nic2) || id.ends_with(&plan.names.vm2)
    )));
    assert_eq!(
        calls.last().unwrap(),
        &Call::DeleteGroup {
            id: plan.group_id.clone()
        }
    );
    assert!(matches!(report.teardown, TeardownOutcome::Deleted { .. }));
}

#[tokio::test]
async fn group_create_failure_means_nothing_to_delete() {
    let plan = test_plan();
    let arm = RecordingArm {
        fail_group_create: true,
        ..RecordingArm::default()
    };

    let report = ProvisionEngine::new(&arm).run(&plan).await;

    assert_eq!(report.failure.as_ref().unwrap().step, 1);
    assert!(report.created.is_empty());
    assert!(matches!(report.teardown, TeardownOutcome::NothingToClean));

    let calls = arm.recorded();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], Call::CreateGroup { .. }));
}

#[tokio::test]
async fn teardown_failure_never_masks_a_successful_run() {
    let plan = test_plan();
    let arm = RecordingArm {
        fail_delete: true,
        ..RecordingArm::default()
    };

    let report = ProvisionEngine::new(&arm).run(&plan).await;

    assert!(report.succeeded());
    assert!(matches!(report.teardown, TeardownOutcome::Failed { .. }));
    assert!(report.into_result().is_ok());
}

#[tokio::test]
async fn provisioning_error_survives_a_failed_teardown() {
    let plan = test_plan();
    let arm = RecordingArm {
        fail_creates_matching: Some("Microsoft.Compute/virtualMachines".to_string()),
        fail_delete: true,
        ..RecordingArm::default()
    };

    let report = ProvisionEngine::new(&arm).run(&plan).await;

    assert_eq!(report.failure.as_ref().unwrap().step, 6);
    let error = report.into_result().unwrap_err();
    let rendered = format!("{error:#}");
    assert!(rendered.contains("virtual machine"));
    assert!(rendered.contains("step 6"));
}
