// Copyright 2023 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! JSON structures and protocol bits for the Networking V2 API.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::common::blank_as_default;

protocol_enum! {
    #[doc = "Possible network statuses."]
    enum NetworkStatus(Other) {
        Active = "ACTIVE",
        Build = "BUILD",
        Down = "DOWN",
        Error = "ERROR"
    }
}

protocol_enum! {
    #[doc = "Possible port statuses."]
    enum PortStatus(Other) {
        Active = "ACTIVE",
        Build = "BUILD",
        Down = "DOWN",
        Error = "ERROR"
    }
}

protocol_enum! {
    #[doc = "IP protocol version of a subnet."]
    enum IpVersion: u8 {
        V4 = 4,
        V6 = 6
    }
}

/// A range of addresses for automatic allocation.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AllocationPool {
    /// First address of the range.
    pub start: IpAddr,
    /// Last address of the range.
    pub end: IpAddr,
}

/// A static route announced to hosts.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct HostRoute {
    /// Destination CIDR.
    pub destination: String,
    /// Next hop address.
    pub nexthop: IpAddr,
}

/// An address of a port on a subnet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FixedIp {
    /// Subnet of the address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    /// The address itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
}

/// A network.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Network {
    /// Unique ID.
    #[resource_id]
    pub id: String,
    /// Network name.
    #[serde(default)]
    pub name: String,
    /// Administrative state.
    #[serde(default = "default_true")]
    pub admin_state_up: bool,
    /// Network status.
    pub status: NetworkStatus,
    /// Whether the network is shared between tenants.
    #[serde(default)]
    pub shared: bool,
    /// Whether the network is external.
    #[serde(default, rename = "router:external")]
    pub external: bool,
    /// IDs of subnets of this network.
    #[serde(default)]
    pub subnets: Vec<String>,
    /// Owning tenant.
    #[serde(default, deserialize_with = "blank_as_default")]
    pub tenant_id: Option<String>,
}

/// A subnet.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Subnet {
    /// Unique ID.
    #[resource_id]
    pub id: String,
    /// Subnet name.
    #[serde(default)]
    pub name: String,
    /// Network the subnet belongs to.
    pub network_id: String,
    /// IP version.
    pub ip_version: IpVersion,
    /// Subnet CIDR.
    pub cidr: String,
    /// Gateway address.
    #[serde(default)]
    pub gateway_ip: Option<IpAddr>,
    /// Allocation pools.
    #[serde(default)]
    pub allocation_pools: Vec<AllocationPool>,
    /// Host routes.
    #[serde(default)]
    pub host_routes: Vec<HostRoute>,
    /// DNS servers.
    #[serde(default)]
    pub dns_nameservers: Vec<IpAddr>,
    /// Whether DHCP is enabled.
    #[serde(default = "default_true")]
    pub enable_dhcp: bool,
    /// Owning tenant.
    #[serde(default, deserialize_with = "blank_as_default")]
    pub tenant_id: Option<String>,
}

/// A port.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Port {
    /// Unique ID.
    #[resource_id]
    pub id: String,
    /// Port name.
    #[serde(default)]
    pub name: String,
    /// Network the port belongs to.
    pub network_id: String,
    /// Administrative state.
    #[serde(default = "default_true")]
    pub admin_state_up: bool,
    /// Port status.
    pub status: PortStatus,
    /// MAC address.
    pub mac_address: String,
    /// Fixed IP addresses.
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
    /// ID of the device using the port.
    #[serde(default, deserialize_with = "blank_as_default")]
    pub device_id: Option<String>,
    /// Owner of the device using the port (e.g. `compute:nova`).
    #[serde(default, deserialize_with = "blank_as_default")]
    pub device_owner: Option<String>,
    /// Security groups.
    #[serde(default)]
    pub security_groups: Vec<String>,
    /// Owning tenant.
    #[serde(default, deserialize_with = "blank_as_default")]
    pub tenant_id: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Request to create a network.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewNetwork {
    /// Network name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Administrative state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
    /// Whether to share the network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
    /// Owning tenant (admin only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Request to update a network.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NetworkUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New administrative state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
    /// New sharing flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
}

/// Request to create a subnet.
#[derive(Clone, Debug, Serialize)]
pub struct NewSubnet {
    /// Network to create the subnet on.
    pub network_id: String,
    /// Subnet CIDR.
    pub cidr: String,
    /// IP version.
    pub ip_version: IpVersion,
    /// Subnet name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Gateway address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<IpAddr>,
    /// Allocation pools.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allocation_pools: Vec<AllocationPool>,
    /// Host routes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host_routes: Vec<HostRoute>,
    /// DNS servers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_nameservers: Vec<IpAddr>,
    /// Whether to enable DHCP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_dhcp: Option<bool>,
}

impl NewSubnet {
    /// Start a subnet request with the required fields.
    pub fn new<N, C>(network_id: N, cidr: C, ip_version: IpVersion) -> NewSubnet
    where
        N: Into<String>,
        C: Into<String>,
    {
        NewSubnet {
            network_id: network_id.into(),
            cidr: cidr.into(),
            ip_version,
            name: None,
            gateway_ip: None,
            allocation_pools: Vec::new(),
            host_routes: Vec::new(),
            dns_nameservers: Vec::new(),
            enable_dhcp: None,
        }
    }
}

/// Request to update a subnet.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SubnetUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New gateway address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<IpAddr>,
    /// New allocation pools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_pools: Option<Vec<AllocationPool>>,
    /// New host routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_routes: Option<Vec<HostRoute>>,
    /// New DNS servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_nameservers: Option<Vec<IpAddr>>,
    /// New DHCP flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_dhcp: Option<bool>,
}

/// Request to create a port.
#[derive(Clone, Debug, Serialize)]
pub struct NewPort {
    /// Network to create the port on.
    pub network_id: String,
    /// Port name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Administrative state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
    /// MAC address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// Fixed IP addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixed_ips: Vec<FixedIp>,
    /// ID of the device using the port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Owner of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_owner: Option<String>,
    /// Security groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<String>>,
}

impl NewPort {
    /// Start a port request on the network.
    pub fn new<N: Into<String>>(network_id: N) -> NewPort {
        NewPort {
            network_id: network_id.into(),
            name: None,
            admin_state_up: None,
            mac_address: None,
            fixed_ips: Vec::new(),
            device_id: None,
            device_owner: None,
            security_groups: None,
        }
    }
}

/// Request to update a port.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PortUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New administrative state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
    /// New fixed IP addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ips: Option<Vec<FixedIp>>,
    /// New device ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// New device owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_owner: Option<String>,
    /// New security groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NetworkRoot<T> {
    pub network: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NetworksRoot<T> {
    pub networks: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SubnetRoot<T> {
    pub subnet: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SubnetsRoot<T> {
    pub subnets: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PortRoot<T> {
    pub port: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PortsRoot<T> {
    pub ports: T,
}

#[cfg(test)]
pub mod test {
    use std::net::{IpAddr, Ipv4Addr};

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::common::test::compare;

    assert_impl_all!(AllocationPool: Copy);

    #[test]
    fn test_network_parse() {
        let root: NetworkRoot<Network> = serde_json::from_str(
            r#"{"network": {
                "id": "4e8e5957-649f-477b-9e5b-f1f75b21c03c",
                "name": "net1",
                "admin_state_up": true,
                "status": "ACTIVE",
                "shared": false,
                "router:external": true,
                "subnets": ["54d6f61d-db07-451c-9ab3-b9609b6b6f0b"],
                "tenant_id": ""
            }}"#,
        )
        .unwrap();
        let network = root.network;
        assert_eq!(network.status, NetworkStatus::Active);
        assert!(network.external);
        assert_eq!(network.subnets.len(), 1);
        assert!(network.tenant_id.is_none());
    }

    #[test]
    fn test_unknown_port_status() {
        let port: Port = serde_json::from_str(
            r#"{"id": "p1", "network_id": "n1", "status": "NOTREADY",
                "mac_address": "fa:16:3e:58:42:ed",
                "fixed_ips": [{"subnet_id": "s1", "ip_address": "10.0.0.2"}],
                "device_owner": "compute:nova"}"#,
        )
        .unwrap();
        assert_eq!(port.status, PortStatus::Other("NOTREADY".into()));
        assert_eq!(
            port.fixed_ips[0].ip_address,
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)))
        );
        assert_eq!(port.device_owner.as_deref(), Some("compute:nova"));
        assert!(port.device_id.is_none());
    }

    #[test]
    fn test_subnet_parse() {
        let subnet: Subnet = serde_json::from_str(
            r#"{"id": "s1", "network_id": "n1", "ip_version": 4,
                "cidr": "10.0.0.0/24", "gateway_ip": null,
                "allocation_pools": [{"start": "10.0.0.2", "end": "10.0.0.254"}],
                "dns_nameservers": ["8.8.8.8"], "enable_dhcp": false}"#,
        )
        .unwrap();
        assert_eq!(subnet.ip_version, IpVersion::V4);
        assert!(subnet.gateway_ip.is_none());
        assert!(!subnet.enable_dhcp);
        assert_eq!(subnet.allocation_pools.len(), 1);
    }

    #[test]
    fn test_new_subnet_serialize() {
        let mut subnet = NewSubnet::new("n1", "10.0.0.0/24", IpVersion::V4);
        subnet.name = Some("sub".into());
        compare(
            r#"{"subnet": {"network_id": "n1", "cidr": "10.0.0.0/24",
                           "ip_version": 4, "name": "sub"}}"#,
            SubnetRoot { subnet: &subnet },
        );
    }

    #[test]
    fn test_port_update_serialize() {
        let update = PortUpdate {
            name: Some("renamed".into()),
            ..Default::default()
        };
        compare(r#"{"port": {"name": "renamed"}}"#, PortRoot { port: &update });
    }
}
