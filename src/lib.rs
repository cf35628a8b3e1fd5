//! zonal-vm-demo - Azure zonal VM provisioning walkthrough
//!
//! This crate provisions a fixed graph of Azure resources in one region: a
//! resource group, a virtual network with one subnet, two public IP addresses
//! (one regional, one pinned to zone "1"), two network interfaces, a zonal
//! managed data disk, and two Linux virtual machines in zone "1". Every
//! create call is awaited to a terminal state before the next one starts, and
//! the resource group is deleted on the way out no matter how far
//! provisioning got.
//!
//! ## Modules
//!
//! - [`arm`]: thin Azure Resource Manager client (auth, create-or-update with
//!   long-running-operation polling, delete)
//! - [`provision`]: the ordered provisioning plan, its executor, and the
//!   teardown guard
//! - [`config`]: CLI/environment configuration and the fixed resource shapes
//! - [`naming`]: random resource names and admin credentials
//! - [`wait`]: exponential-backoff polling used while operations settle

pub mod arm;
pub mod config;
pub mod naming;
pub mod provision;
pub mod wait;

pub use arm::{ArmClient, ArmOperations};
pub use provision::{ProvisionEngine, ProvisionPlan, RunReport};
