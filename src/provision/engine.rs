//! Plan executor
//!
//! One engine walks the plan front to back against a single ARM client.
//! Every create is awaited to its terminal state before the next begins, so
//! each step can rely on everything before it existing. The first failure
//! stops the walk; teardown runs no matter how far it got.

use tracing::{error, info};

use crate::arm::ArmOperations;
use crate::provision::guard::GroupGuard;
use crate::provision::kind::ResourceKind;
use crate::provision::plan::ProvisionPlan;
use crate::provision::report::{CreatedResource, RunReport, StepFailure};

pub struct ProvisionEngine<'a, O> {
    arm: &'a O,
}

impl<'a, O: ArmOperations> ProvisionEngine<'a, O> {
    pub fn new(arm: &'a O) -> Self {
        Self { arm }
    }

    /// Run the plan to completion or first failure, then tear down.
    pub async fn run(&self, plan: &ProvisionPlan) -> RunReport {
        let total = plan.steps.len();
        info!(
            group = %plan.names.resource_group,
            region = %plan.region,
            steps = total,
            "Starting provisioning run"
        );

        let mut guard = GroupGuard::empty();
        let mut created = Vec::with_capacity(total);
        let mut failure = None;

        for (index, step) in plan.steps.iter().enumerate() {
            let position = index + 1;
            info!(
                step = position,
                total,
                kind = step.kind.label(),
                name = %step.name,
                "Creating resource"
            );

            // The group create is the one step whose response we keep: its
            // id arms the teardown guard.
            let result = match step.kind {
                ResourceKind::ResourceGroup => self
                    .arm
                    .create_resource_group(&step.id, &plan.region)
                    .await
                    .map(|group_id| guard.capture(group_id)),
                _ => {
                    self.arm
                        .create_resource(&step.id, step.api_version, step.body.clone())
                        .await
                }
            };

            match result {
                Ok(()) => {
                    info!(step = position, name = %step.name, "Resource ready");
                    created.push(CreatedResource {
                        kind: step.kind,
                        name: step.name.clone(),
                        id: step.id.clone(),
                    });
                }
                Err(error) => {
                    error!(
                        step = position,
                        kind = step.kind.label(),
                        name = %step.name,
                        error = ?error,
                        "Step failed, aborting the run"
                    );
                    failure = Some(StepFailure {
                        step: position,
                        kind: step.kind,
                        name: step.name.clone(),
                        error,
                    });
                    break;
                }
            }
        }

        let teardown = guard.teardown(self.arm).await;

        RunReport {
            created,
            failure,
            teardown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::MockArmOperations;
    use crate::naming::ResourceNames;
    use crate::provision::guard::TeardownOutcome;
    use crate::provision::plan::PlannedStep;
    use mockall::Sequence;

    fn test_plan() -> ProvisionPlan {
        ProvisionPlan::build("sub-1", "eastus2", ResourceNames::generate()).unwrap()
    }

    fn expect_group_create(arm: &mut MockArmOperations, seq: &mut Sequence, plan: &ProvisionPlan) {
        let group_id = plan.group_id.clone();
        arm.expect_create_resource_group()
            .withf(move |id, region| id == group_id && region == "eastus2")
            .times(1)
            .in_sequence(seq)
            .returning(|id, _| Ok(id.to_string()));
    }

    fn expect_create_ok(arm: &mut MockArmOperations, seq: &mut Sequence, step: &PlannedStep) {
        let id = step.id.clone();
        let api_version = step.api_version;
        let body = step.body.clone();
        arm.expect_create_resource()
            .withf(move |rid, version, sent| rid == id && version == api_version && *sent == body)
            .times(1)
            .in_sequence(seq)
            .returning(|_, _, _| Ok(()));
    }

    #[tokio::test]
    async fn runs_every_step_in_order_then_tears_down() {
        let plan = test_plan();
        let mut arm = MockArmOperations::new();
        let mut seq = Sequence::new();

        expect_group_create(&mut arm, &mut seq, &plan);
        for step in &plan.steps[1..] {
            expect_create_ok(&mut arm, &mut seq, step);
        }
        let group_id = plan.group_id.clone();
        arm.expect_delete_resource_group()
            .withf(move |id| id == group_id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let report = ProvisionEngine::new(&arm).run(&plan).await;

        assert!(report.succeeded());
        assert_eq!(report.created.len(), 10);
        assert!(matches!(report.teardown, TeardownOutcome::Deleted { .. }));
    }

    #[tokio::test]
    async fn first_failure_stops_the_walk_but_not_teardown() {
        let plan = test_plan();
        let mut arm = MockArmOperations::new();
        let mut seq = Sequence::new();

        expect_group_create(&mut arm, &mut seq, &plan);
        // Steps 2 through 7 succeed; the disk create fails; no call is made
        // for the second interface or machine.
        for step in &plan.steps[1..7] {
            expect_create_ok(&mut arm, &mut seq, step);
        }
        let disk_id = plan.steps[7].id.clone();
        arm.expect_create_resource()
            .withf(move |rid, _, _| rid == disk_id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(anyhow::anyhow!("quota exhausted")));
        arm.expect_delete_resource_group()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let report = ProvisionEngine::new(&arm).run(&plan).await;

        assert_eq!(report.created.len(), 7);
        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.step, 8);
        assert_eq!(failure.kind, ResourceKind::ManagedDisk);
        assert!(matches!(report.teardown, TeardownOutcome::Deleted { .. }));
    }

    #[tokio::test]
    async fn group_create_failure_skips_the_delete() {
        let plan = test_plan();
        let mut arm = MockArmOperations::new();

        arm.expect_create_resource_group()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("subscription not allowed")));
        arm.expect_create_resource().times(0);
        arm.expect_delete_resource_group().times(0);

        let report = ProvisionEngine::new(&arm).run(&plan).await;

        assert!(report.created.is_empty());
        assert_eq!(report.failure.as_ref().unwrap().step, 1);
        assert!(matches!(report.teardown, TeardownOutcome::NothingToClean));
    }

    #[tokio::test]
    async fn teardown_failure_leaves_the_run_successful() {
        let plan = test_plan();
        let mut arm = MockArmOperations::new();
        let mut seq = Sequence::new();

        expect_group_create(&mut arm, &mut seq, &plan);
        for step in &plan.steps[1..] {
            expect_create_ok(&mut arm, &mut seq, step);
        }
        arm.expect_delete_resource_group()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let report = ProvisionEngine::new(&arm).run(&plan).await;

        assert!(report.succeeded());
        assert!(matches!(report.teardown, TeardownOutcome::Failed { .. }));
        assert!(report.into_result().is_ok());
    }
}
