//! Resource kinds and their ARM api versions
//!
//! Creation order is owned by the plan; this enum identifies what a step
//! creates and which api version its requests use.

use crate::arm::RESOURCE_GROUP_API_VERSION;

/// Api version for Microsoft.Network resources
pub const NETWORK_API_VERSION: &str = "2023-04-01";

/// Api version for managed disks
pub const DISK_API_VERSION: &str = "2023-04-02";

/// Api version for virtual machines
pub const COMPUTE_API_VERSION: &str = "2023-07-01";

/// Types of Azure resources this pipeline creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Container for everything else; created first, deleted last
    ResourceGroup,
    /// Virtual network carrying the address space
    VirtualNetwork,
    /// Subnet nested under the virtual network
    Subnet,
    /// Public IP address (regional or zone-pinned)
    PublicIp,
    /// Network interface binding subnet and public IP
    NetworkInterface,
    /// Empty zone-pinned managed disk
    ManagedDisk,
    /// Virtual machine
    VirtualMachine,
}

impl ResourceKind {
    /// Api version used for this kind's create calls
    pub fn api_version(self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => RESOURCE_GROUP_API_VERSION,
            ResourceKind::VirtualNetwork
            | ResourceKind::Subnet
            | ResourceKind::PublicIp
            | ResourceKind::NetworkInterface => NETWORK_API_VERSION,
            ResourceKind::ManagedDisk => DISK_API_VERSION,
            ResourceKind::VirtualMachine => COMPUTE_API_VERSION,
        }
    }

    /// Human-readable label for progress output
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resource group",
            ResourceKind::VirtualNetwork => "virtual network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::PublicIp => "public IP address",
            ResourceKind::NetworkInterface => "network interface",
            ResourceKind::ManagedDisk => "managed disk",
            ResourceKind::VirtualMachine => "virtual machine",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_kinds_share_an_api_version() {
        assert_eq!(
            ResourceKind::VirtualNetwork.api_version(),
            ResourceKind::Subnet.api_version()
        );
        assert_eq!(
            ResourceKind::PublicIp.api_version(),
            ResourceKind::NetworkInterface.api_version()
        );
    }

    #[test]
    fn compute_kinds_use_distinct_api_versions() {
        assert_ne!(
            ResourceKind::ManagedDisk.api_version(),
            ResourceKind::VirtualMachine.api_version()
        );
        assert_ne!(
            ResourceKind::ResourceGroup.api_version(),
            ResourceKind::VirtualNetwork.api_version()
        );
    }
}
