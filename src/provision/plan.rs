//! The ordered provisioning plan
//!
//! ARM resource ids are deterministic, so an entire run can be described
//! before any remote call: each step carries the id its resource will have
//! and the complete request body, with references to earlier resources baked
//! in as id strings. The executor walks the list front to back.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::arm::models::{
    AddressSpace, CreationData, DataDisk, DiskBody, DiskProperties, HardwareProfile,
    ImageReference, IpConfiguration, IpConfigurationProperties, ManagedDiskParams,
    NetworkInterfaceBody, NetworkInterfaceProperties, NetworkInterfaceRef,
    NetworkInterfaceRefProperties, NetworkProfile, OsDisk, OsProfile, PublicIpBody,
    PublicIpProperties, ResourceGroupBody, ResourceRef, ServiceEndpoint, Sku, StorageProfile,
    SubnetBody, SubnetProperties, VirtualMachineBody, VirtualMachineProperties,
    VirtualNetworkBody, VirtualNetworkProperties,
};
use crate::config;
use crate::naming::ResourceNames;
use crate::provision::kind::ResourceKind;

/// Name of the single ip configuration on each interface
const IP_CONFIGURATION_NAME: &str = "internal";

/// One planned create call
#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub kind: ResourceKind,
    /// Resource name within its parent scope
    pub name: String,
    /// Full ARM id the resource will have once created
    pub id: String,
    pub api_version: &'static str,
    /// Complete request body, ready to send
    pub body: Value,
}

/// The full ordered run description
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub region: String,
    pub names: ResourceNames,
    /// Id the resource group will have; also `steps[0].id`
    pub group_id: String,
    pub steps: Vec<PlannedStep>,
}

/// ARM id of a resource group
pub fn resource_group_id(subscription_id: &str, group: &str) -> String {
    format!("/subscriptions/{subscription_id}/resourceGroups/{group}")
}

fn provider_id(group_id: &str, resource_type: &str, name: &str) -> String {
    format!("{group_id}/providers/{resource_type}/{name}")
}

fn subnet_child_id(vnet_id: &str, name: &str) -> String {
    format!("{vnet_id}/subnets/{name}")
}

impl ProvisionPlan {
    /// Describe a full run for the given subscription, region, and names.
    pub fn build(subscription_id: &str, region: &str, names: ResourceNames) -> Result<Self> {
        let group_id = resource_group_id(subscription_id, &names.resource_group);
        let vnet_id = provider_id(
            &group_id,
            "Microsoft.Network/virtualNetworks",
            &names.virtual_network,
        );
        let subnet_id = subnet_child_id(&vnet_id, &names.subnet);
        let pip1_id = provider_id(
            &group_id,
            "Microsoft.Network/publicIPAddresses",
            &names.public_ip1,
        );
        let pip2_id = provider_id(
            &group_id,
            "Microsoft.Network/publicIPAddresses",
            &names.public_ip2,
        );
        let nic1_id = provider_id(
            &group_id,
            "Microsoft.Network/networkInterfaces",
            &names.nic1,
        );
        let nic2_id = provider_id(
            &group_id,
            "Microsoft.Network/networkInterfaces",
            &names.nic2,
        );
        let disk_id = provider_id(&group_id, "Microsoft.Compute/disks", &names.data_disk);
        let vm1_id = provider_id(
            &group_id,
            "Microsoft.Compute/virtualMachines",
            &names.vm1,
        );
        let vm2_id = provider_id(
            &group_id,
            "Microsoft.Compute/virtualMachines",
            &names.vm2,
        );

        let steps = vec![
            planned(
                ResourceKind::ResourceGroup,
                &names.resource_group,
                group_id.clone(),
                ResourceGroupBody {
                    location: region.to_string(),
                },
            )?,
            planned(
                ResourceKind::VirtualNetwork,
                &names.virtual_network,
                vnet_id,
                VirtualNetworkBody {
                    location: region.to_string(),
                    properties: VirtualNetworkProperties {
                        address_space: AddressSpace {
                            address_prefixes: vec![config::ADDRESS_SPACE.to_string()],
                        },
                    },
                },
            )?,
            // The first machine's address is regional: no zone list at all
            planned(
                ResourceKind::PublicIp,
                &names.public_ip1,
                pip1_id.clone(),
                public_ip_body(region, None),
            )?,
            planned(
                ResourceKind::Subnet,
                &names.subnet,
                subnet_id.clone(),
                SubnetBody {
                    properties: SubnetProperties {
                        address_prefix: config::SUBNET_PREFIX.to_string(),
                        service_endpoints: vec![ServiceEndpoint {
                            service: config::SUBNET_SERVICE_ENDPOINT.to_string(),
                        }],
                    },
                },
            )?,
            planned(
                ResourceKind::NetworkInterface,
                &names.nic1,
                nic1_id.clone(),
                interface_body(region, &subnet_id, &pip1_id),
            )?,
            planned(
                ResourceKind::VirtualMachine,
                &names.vm1,
                vm1_id,
                machine_body(region, &names, &names.vm1_computer, &nic1_id, None),
            )?,
            planned(
                ResourceKind::PublicIp,
                &names.public_ip2,
                pip2_id.clone(),
                public_ip_body(region, Some(vec![config::ZONE.to_string()])),
            )?,
            planned(
                ResourceKind::ManagedDisk,
                &names.data_disk,
                disk_id.clone(),
                DiskBody {
                    location: region.to_string(),
                    sku: Sku {
                        name: "StandardSSD_LRS".to_string(),
                    },
                    zones: vec![config::ZONE.to_string()],
                    properties: DiskProperties {
                        creation_data: CreationData {
                            create_option: "Empty".to_string(),
                        },
                        disk_size_gb: config::DATA_DISK_SIZE_GB,
                    },
                },
            )?,
            planned(
                ResourceKind::NetworkInterface,
                &names.nic2,
                nic2_id.clone(),
                interface_body(region, &subnet_id, &pip2_id),
            )?,
            planned(
                ResourceKind::VirtualMachine,
                &names.vm2,
                vm2_id,
                machine_body(
                    region,
                    &names,
                    &names.vm2_computer,
                    &nic2_id,
                    Some(&disk_id),
                ),
            )?,
        ];

        Ok(Self {
            region: region.to_string(),
            names,
            group_id,
            steps,
        })
    }
}

fn planned<T: serde::Serialize>(
    kind: ResourceKind,
    name: &str,
    id: String,
    body: T,
) -> Result<PlannedStep> {
    let body = serde_json::to_value(body)
        .with_context(|| format!("Failed to encode request body for {}", kind.label()))?;
    Ok(PlannedStep {
        kind,
        name: name.to_string(),
        id,
        api_version: kind.api_version(),
        body,
    })
}

fn public_ip_body(region: &str, zones: Option<Vec<String>>) -> PublicIpBody {
    PublicIpBody {
        location: region.to_string(),
        sku: Sku {
            name: "Standard".to_string(),
        },
        zones,
        properties: PublicIpProperties {
            public_ip_address_version: "IPv4".to_string(),
            public_ip_allocation_method: "Static".to_string(),
        },
    }
}

fn interface_body(region: &str, subnet_id: &str, public_ip_id: &str) -> NetworkInterfaceBody {
    NetworkInterfaceBody {
        location: region.to_string(),
        properties: NetworkInterfaceProperties {
            ip_configurations: vec![IpConfiguration {
                name: IP_CONFIGURATION_NAME.to_string(),
                properties: IpConfigurationProperties {
                    primary: true,
                    private_ip_allocation_method: "Dynamic".to_string(),
                    subnet: ResourceRef::new(subnet_id),
                    public_ip_address: ResourceRef::new(public_ip_id),
                },
            }],
        },
    }
}

// Both machines are zone-pinned; the pair differs in whether their
// dependencies (public IP, disk) are zonal.
fn machine_body(
    region: &str,
    names: &ResourceNames,
    computer_name: &str,
    nic_id: &str,
    data_disk_id: Option<&str>,
) -> VirtualMachineBody {
    VirtualMachineBody {
        location: region.to_string(),
        zones: vec![config::ZONE.to_string()],
        properties: VirtualMachineProperties {
            hardware_profile: HardwareProfile {
                vm_size: config::VM_SIZE.to_string(),
            },
            os_profile: OsProfile {
                computer_name: computer_name.to_string(),
                admin_username: names.admin_username.clone(),
                admin_password: names.admin_password.clone(),
            },
            network_profile: NetworkProfile {
                network_interfaces: vec![NetworkInterfaceRef {
                    id: nic_id.to_string(),
                    properties: NetworkInterfaceRefProperties { primary: true },
                }],
            },
            storage_profile: StorageProfile {
                image_reference: ImageReference {
                    publisher: config::IMAGE_PUBLISHER.to_string(),
                    offer: config::IMAGE_OFFER.to_string(),
                    sku: config::IMAGE_SKU.to_string(),
                    version: config::IMAGE_VERSION.to_string(),
                },
                os_disk: OsDisk {
                    os_type: "Linux".to_string(),
                    create_option: "FromImage".to_string(),
                    caching: "ReadWrite".to_string(),
                    managed_disk: ManagedDiskParams {
                        storage_account_type: "Standard_LRS".to_string(),
                    },
                },
                data_disks: data_disk_id.map(|id| {
                    vec![DataDisk {
                        lun: 0,
                        create_option: "Attach".to_string(),
                        managed_disk: ResourceRef::new(id),
                    }]
                }),
            },
        },
    }
}
