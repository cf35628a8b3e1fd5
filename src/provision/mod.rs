//! The provisioning pipeline: plan, executor, and guaranteed teardown

pub mod engine;
pub mod guard;
pub mod kind;
pub mod plan;
pub mod report;

pub use engine::ProvisionEngine;
pub use guard::{GroupGuard, TeardownOutcome};
pub use kind::ResourceKind;
pub use plan::{resource_group_id, PlannedStep, ProvisionPlan};
pub use report::{CreatedResource, RunReport, StepFailure};
