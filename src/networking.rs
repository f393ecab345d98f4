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

//! Networking V2 API.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), oscloud::Error> {
//! use oscloud::networking::{Networking, NetworkQuery, NetworkStatus};
//!
//! let session = oscloud::Session::from_env().await?;
//! let networking = Networking::new(&session);
//! let query = oscloud::Query::default().with(NetworkQuery::Status(NetworkStatus::Active));
//! for network in networking.list_networks(query, None, None).await?.all_pages().await? {
//!     println!("{} ({})", network.name, network.id);
//! }
//! # Ok(()) }
//! # #[tokio::main]
//! # async fn main() { example().await.unwrap(); }
//! ```

use log::{debug, trace};

use super::services::{GenericService, NETWORK};
use super::{Adapter, Error, ErrorKind, Page, Query};

mod protocol;

use self::protocol::{NetworkRoot, NetworksRoot, PortRoot, PortsRoot, SubnetRoot, SubnetsRoot};
pub use self::protocol::{
    AllocationPool, FixedIp, HostRoute, IpVersion, Network, NetworkStatus, NetworkUpdate,
    NewNetwork, NewPort, NewSubnet, Port, PortStatus, PortUpdate, Subnet, SubnetUpdate,
};

/// Query for listing networks.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum NetworkQuery {
    /// Networks with this name.
    Name(String),
    /// Networks with this status.
    Status(NetworkStatus),
    /// Shared or not shared networks.
    Shared(bool),
    /// Networks of this tenant.
    TenantId(String),
}

/// Query for listing subnets.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum SubnetQuery {
    /// Subnets with this name.
    Name(String),
    /// Subnets of this network.
    NetworkId(String),
    /// Subnets with this IP version.
    IpVersion(IpVersion),
    /// Subnets with this CIDR.
    Cidr(String),
}

/// Query for listing ports.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum PortQuery {
    /// Ports with this name.
    Name(String),
    /// Ports on this network.
    NetworkId(String),
    /// Ports with this status.
    Status(PortStatus),
    /// Ports of this device.
    DeviceId(String),
    /// Ports of this device owner.
    DeviceOwner(String),
    /// Ports with this MAC address.
    MacAddress(String),
}

fn check_network_id(network_id: &str) -> Result<(), Error> {
    if network_id.is_empty() {
        Err(Error::new(
            ErrorKind::InvalidInput,
            "A network ID is required",
        ))
    } else {
        Ok(())
    }
}

/// Networking service client.
#[derive(Debug, Clone)]
pub struct Networking {
    adapter: Adapter<GenericService>,
}

service_client!(Networking: GenericService = NETWORK);

impl Networking {
    /// List networks.
    pub async fn list_networks(
        &self,
        query: Query<NetworkQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Network>, Error> {
        trace!("Listing networks with {:?}", query);
        self.adapter
            .get(&["networks"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Get a network by its ID.
    pub async fn get_network<S: AsRef<str>>(&self, id: S) -> Result<Network, Error> {
        let root: NetworkRoot<Network> = self
            .adapter
            .get(&["networks", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        trace!("Received network {:?}", root.network);
        Ok(root.network)
    }

    /// Create a network.
    pub async fn create_network(&self, request: &NewNetwork) -> Result<Network, Error> {
        let root: NetworkRoot<Network> = self
            .adapter
            .post(&["networks"])
            .await?
            .json(&NetworkRoot { network: request })
            .fetch_json()
            .await?;
        debug!("Created network {}", root.network.id);
        Ok(root.network)
    }

    /// Create several networks in one request.
    pub async fn create_networks(&self, requests: &[NewNetwork]) -> Result<Vec<Network>, Error> {
        let root: NetworksRoot<Vec<Network>> = self
            .adapter
            .post(&["networks"])
            .await?
            .json(&NetworksRoot { networks: requests })
            .fetch_json()
            .await?;
        debug!("Created {} networks", root.networks.len());
        Ok(root.networks)
    }

    /// Update a network.
    pub async fn update_network<S: AsRef<str>>(
        &self,
        id: S,
        update: &NetworkUpdate,
    ) -> Result<Network, Error> {
        let root: NetworkRoot<Network> = self
            .adapter
            .put(&["networks", id.as_ref()])
            .await?
            .json(&NetworkRoot { network: update })
            .fetch_json()
            .await?;
        Ok(root.network)
    }

    /// Delete a network.
    pub async fn delete_network<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["networks", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Deleted network {}", id.as_ref());
        Ok(())
    }

    /// List subnets.
    pub async fn list_subnets(
        &self,
        query: Query<SubnetQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Subnet>, Error> {
        trace!("Listing subnets with {:?}", query);
        self.adapter
            .get(&["subnets"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Get a subnet by its ID.
    pub async fn get_subnet<S: AsRef<str>>(&self, id: S) -> Result<Subnet, Error> {
        let root: SubnetRoot<Subnet> = self
            .adapter
            .get(&["subnets", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        Ok(root.subnet)
    }

    /// Create a subnet.
    pub async fn create_subnet(&self, request: &NewSubnet) -> Result<Subnet, Error> {
        check_network_id(&request.network_id)?;
        let root: SubnetRoot<Subnet> = self
            .adapter
            .post(&["subnets"])
            .await?
            .json(&SubnetRoot { subnet: request })
            .fetch_json()
            .await?;
        debug!("Created subnet {} ({})", root.subnet.id, root.subnet.cidr);
        Ok(root.subnet)
    }

    /// Create several subnets in one request.
    pub async fn create_subnets(&self, requests: &[NewSubnet]) -> Result<Vec<Subnet>, Error> {
        for request in requests {
            check_network_id(&request.network_id)?;
        }
        let root: SubnetsRoot<Vec<Subnet>> = self
            .adapter
            .post(&["subnets"])
            .await?
            .json(&SubnetsRoot { subnets: requests })
            .fetch_json()
            .await?;
        debug!("Created {} subnets", root.subnets.len());
        Ok(root.subnets)
    }

    /// Update a subnet.
    pub async fn update_subnet<S: AsRef<str>>(
        &self,
        id: S,
        update: &SubnetUpdate,
    ) -> Result<Subnet, Error> {
        let root: SubnetRoot<Subnet> = self
            .adapter
            .put(&["subnets", id.as_ref()])
            .await?
            .json(&SubnetRoot { subnet: update })
            .fetch_json()
            .await?;
        Ok(root.subnet)
    }

    /// Delete a subnet.
    pub async fn delete_subnet<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["subnets", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Deleted subnet {}", id.as_ref());
        Ok(())
    }

    /// List ports.
    pub async fn list_ports(
        &self,
        query: Query<PortQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Port>, Error> {
        trace!("Listing ports with {:?}", query);
        self.adapter
            .get(&["ports"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Get a port by its ID.
    pub async fn get_port<S: AsRef<str>>(&self, id: S) -> Result<Port, Error> {
        let root: PortRoot<Port> = self
            .adapter
            .get(&["ports", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        Ok(root.port)
    }

    /// Create a port.
    ///
    /// A port always belongs to exactly one network.
    pub async fn create_port(&self, request: &NewPort) -> Result<Port, Error> {
        check_network_id(&request.network_id)?;
        let root: PortRoot<Port> = self
            .adapter
            .post(&["ports"])
            .await?
            .json(&PortRoot { port: request })
            .fetch_json()
            .await?;
        debug!(
            "Created port {} on network {}",
            root.port.id, root.port.network_id
        );
        Ok(root.port)
    }

    /// Create several ports in one request.
    pub async fn create_ports(&self, requests: &[NewPort]) -> Result<Vec<Port>, Error> {
        for request in requests {
            check_network_id(&request.network_id)?;
        }
        let root: PortsRoot<Vec<Port>> = self
            .adapter
            .post(&["ports"])
            .await?
            .json(&PortsRoot { ports: requests })
            .fetch_json()
            .await?;
        debug!("Created {} ports", root.ports.len());
        Ok(root.ports)
    }

    /// Update a port.
    pub async fn update_port<S: AsRef<str>>(
        &self,
        id: S,
        update: &PortUpdate,
    ) -> Result<Port, Error> {
        let root: PortRoot<Port> = self
            .adapter
            .put(&["ports", id.as_ref()])
            .await?
            .json(&PortRoot { port: update })
            .fetch_json()
            .await?;
        Ok(root.port)
    }

    /// Delete a port.
    pub async fn delete_port<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["ports", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Deleted port {}", id.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{check_network_id, IpVersion, NetworkQuery, NetworkStatus, PortQuery, SubnetQuery};
    use crate::Query;

    #[test]
    fn test_network_id_required() {
        assert!(check_network_id("").is_err());
        check_network_id("n1").unwrap();
    }

    #[test]
    fn test_queries() {
        let query: Query<NetworkQuery> = vec![
            NetworkQuery::Name("private".into()),
            NetworkQuery::Status(NetworkStatus::Active),
        ]
        .into();
        assert_eq!(
            serde_urlencoded::to_string(query).unwrap(),
            "name=private&status=ACTIVE"
        );
        let query = Query::default().with(SubnetQuery::IpVersion(IpVersion::V6));
        assert_eq!(serde_urlencoded::to_string(query).unwrap(), "ip_version=6");
        let query = Query::default().with(PortQuery::DeviceOwner("network:dhcp".into()));
        assert_eq!(
            serde_urlencoded::to_string(query).unwrap(),
            "device_owner=network%3Adhcp"
        );
    }
}
