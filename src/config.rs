//! Configuration types for a provisioning run
//!
//! The resource shapes (address space, VM size, image, disk tier) are fixed
//! for this walkthrough; only region, credentials, and run flags vary.

use crate::arm::error::ArmError;

/// Default Azure region
pub const DEFAULT_REGION: &str = "eastus2";

/// VM size class used for both machines
pub const VM_SIZE: &str = "Standard_D2a_v4";

/// Virtual network address space
pub const ADDRESS_SPACE: &str = "10.0.0.0/28";

/// Address prefix of the single subnet (the whole network range)
pub const SUBNET_PREFIX: &str = "10.0.0.0/28";

/// Service endpoint declared on the subnet
pub const SUBNET_SERVICE_ENDPOINT: &str = "Microsoft.Storage";

/// Availability zone every zone-pinned resource lands in
pub const ZONE: &str = "1";

/// Data disk capacity in GB
pub const DATA_DISK_SIZE_GB: u32 = 100;

/// Marketplace image both machines boot from
pub const IMAGE_PUBLISHER: &str = "Canonical";
pub const IMAGE_OFFER: &str = "UbuntuServer";
pub const IMAGE_SKU: &str = "16.04-LTS";
pub const IMAGE_VERSION: &str = "latest";

/// Service principal credentials, unvalidated until the first token request
#[derive(Debug, Clone, Default)]
pub struct AzureCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
}

/// Configuration for a provisioning run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Region every resource is created in
    pub region: String,

    /// Subscription the resource group lives under
    pub subscription_id: Option<String>,

    /// Service principal for the token endpoint
    pub credentials: AzureCredentials,

    /// Print the plan without issuing remote calls
    pub dry_run: bool,
}

impl RunConfig {
    /// Subscription id, required before any request URL can be built.
    ///
    /// Reported as an authentication failure so a missing value surfaces the
    /// same way missing token credentials do.
    pub fn require_subscription(&self) -> anyhow::Result<&str> {
        self.subscription_id.as_deref().ok_or_else(|| {
            ArmError::Auth {
                message: "AZURE_SUBSCRIPTION_ID must be set".to_string(),
            }
            .into()
        })
    }
}
