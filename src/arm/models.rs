//! Request and response bodies for the ARM REST surface
//!
//! Only the fields this pipeline actually sends are modeled. Azure property
//! names are camelCase with a handful of legacy capitalizations (`IP`, `GB`)
//! handled by explicit renames.

use serde::{Deserialize, Serialize};

use crate::arm::error::ErrorDetail;

/// Reference to another resource by ARM id
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRef {
    pub id: String,
}

impl ResourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// SKU selector used by public IPs and managed disks
#[derive(Debug, Clone, Serialize)]
pub struct Sku {
    pub name: String,
}

/// Resource group create body
#[derive(Debug, Clone, Serialize)]
pub struct ResourceGroupBody {
    pub location: String,
}

/// Virtual network create body
#[derive(Debug, Clone, Serialize)]
pub struct VirtualNetworkBody {
    pub location: String,
    pub properties: VirtualNetworkProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    pub address_space: AddressSpace,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

/// Subnet create body (child of a virtual network, no location)
#[derive(Debug, Clone, Serialize)]
pub struct SubnetBody {
    pub properties: SubnetProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    pub address_prefix: String,
    pub service_endpoints: Vec<ServiceEndpoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceEndpoint {
    pub service: String,
}

/// Public IP address create body
#[derive(Debug, Clone, Serialize)]
pub struct PublicIpBody {
    pub location: String,
    pub sku: Sku,
    /// Zone pinning; omitted entirely for regional addresses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
    pub properties: PublicIpProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicIpProperties {
    #[serde(rename = "publicIPAddressVersion")]
    pub public_ip_address_version: String,
    #[serde(rename = "publicIPAllocationMethod")]
    pub public_ip_allocation_method: String,
}

/// Network interface create body
#[derive(Debug, Clone, Serialize)]
pub struct NetworkInterfaceBody {
    pub location: String,
    pub properties: NetworkInterfaceProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    pub ip_configurations: Vec<IpConfiguration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IpConfiguration {
    pub name: String,
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct IpConfigurationProperties {
    pub primary: bool,
    #[serde(rename = "privateIPAllocationMethod")]
    pub private_ip_allocation_method: String,
    pub subnet: ResourceRef,
    #[serde(rename = "publicIPAddress")]
    pub public_ip_address: ResourceRef,
}

/// Managed disk create body
#[derive(Debug, Clone, Serialize)]
pub struct DiskBody {
    pub location: String,
    pub sku: Sku,
    pub zones: Vec<String>,
    pub properties: DiskProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskProperties {
    pub creation_data: CreationData,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationData {
    pub create_option: String,
}

/// Virtual machine create body
#[derive(Debug, Clone, Serialize)]
pub struct VirtualMachineBody {
    pub location: String,
    pub zones: Vec<String>,
    pub properties: VirtualMachineProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    pub hardware_profile: HardwareProfile,
    pub os_profile: OsProfile,
    pub network_profile: NetworkProfile,
    pub storage_profile: StorageProfile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    pub computer_name: String,
    pub admin_username: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub network_interfaces: Vec<NetworkInterfaceRef>,
}

/// Interface reference inside a VM network profile, with the primary marker
#[derive(Debug, Clone, Serialize)]
pub struct NetworkInterfaceRef {
    pub id: String,
    pub properties: NetworkInterfaceRefProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkInterfaceRefProperties {
    pub primary: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    pub image_reference: ImageReference,
    pub os_disk: OsDisk,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_disks: Option<Vec<DataDisk>>,
}

/// Marketplace image coordinates
#[derive(Debug, Clone, Serialize)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    pub os_type: String,
    pub create_option: String,
    pub caching: String,
    pub managed_disk: ManagedDiskParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParams {
    pub storage_account_type: String,
}

/// Existing-disk attachment inside a VM storage profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub lun: u32,
    pub create_option: String,
    pub managed_disk: ResourceRef,
}

// Response-side types. Only the fields the client reads are declared so
// unrelated ARM payload growth never breaks deserialization.

/// Token endpoint success body
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

/// Token endpoint failure body (AAD shape, not the ARM envelope)
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Status body served by Azure-AsyncOperation monitor URLs
#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    pub error: Option<ErrorDetail>,
}

/// Generic resource read, as much of it as polling needs
#[derive(Debug, Deserialize)]
pub struct ResourceResponse {
    pub id: Option<String>,
    pub name: Option<String>,
    pub properties: Option<ResourceProperties>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceProperties {
    #[serde(rename = "provisioningState")]
    pub provisioning_state: Option<String>,
}

impl ResourceResponse {
    /// Provisioning state, if the payload carried one
    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_ip_without_zones_omits_the_field() {
        let body = PublicIpBody {
            location: "eastus2".to_string(),
            sku: Sku {
                name: "Standard".to_string(),
            },
            zones: None,
            properties: PublicIpProperties {
                public_ip_address_version: "IPv4".to_string(),
                public_ip_allocation_method: "Static".to_string(),
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "location": "eastus2",
                "sku": {"name": "Standard"},
                "properties": {
                    "publicIPAddressVersion": "IPv4",
                    "publicIPAllocationMethod": "Static"
                }
            })
        );
    }

    #[test]
    fn disk_body_uses_arm_capitalizations() {
        let body = DiskBody {
            location: "eastus2".to_string(),
            sku: Sku {
                name: "StandardSSD_LRS".to_string(),
            },
            zones: vec!["1".to_string()],
            properties: DiskProperties {
                creation_data: CreationData {
                    create_option: "Empty".to_string(),
                },
                disk_size_gb: 100,
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["properties"]["diskSizeGB"], json!(100));
        assert_eq!(value["properties"]["creationData"]["createOption"], json!("Empty"));
        assert_eq!(value["zones"], json!(["1"]));
    }

    #[test]
    fn nic_body_renames_ip_fields() {
        let body = NetworkInterfaceBody {
            location: "eastus2".to_string(),
            properties: NetworkInterfaceProperties {
                ip_configurations: vec![IpConfiguration {
                    name: "internal".to_string(),
                    properties: IpConfigurationProperties {
                        primary: true,
                        private_ip_allocation_method: "Dynamic".to_string(),
                        subnet: ResourceRef::new("/sub/id"),
                        public_ip_address: ResourceRef::new("/pip/id"),
                    },
                }],
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        let config = &value["properties"]["ipConfigurations"][0];
        assert_eq!(config["name"], json!("internal"));
        assert_eq!(config["properties"]["privateIPAllocationMethod"], json!("Dynamic"));
        assert_eq!(config["properties"]["publicIPAddress"]["id"], json!("/pip/id"));
    }

    #[test]
    fn resource_response_reads_provisioning_state() {
        let raw = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/disks/d",
            "name": "d",
            "properties": {"provisioningState": "Succeeded", "diskSizeGB": 100}
        });
        let parsed: ResourceResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.provisioning_state(), Some("Succeeded"));
    }

    #[test]
    fn resource_response_tolerates_missing_properties() {
        let parsed: ResourceResponse = serde_json::from_value(json!({"name": "rg"})).unwrap();
        assert_eq!(parsed.provisioning_state(), None);
    }
}
