// Copyright 2024 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Rackspace Cloud Load Balancers API.
//!
//! Most modifying calls are asynchronous on the server side: the load balancer goes into the
//! `PENDING_UPDATE` state and rejects further changes until it becomes `ACTIVE` again. Use
//! [wait_for_load_balancer_state](struct.LoadBalancers.html#method.wait_for_load_balancer_state)
//! between modifications.

use std::time::Duration;

use log::{debug, trace};
use reqwest::Method;

use super::client::RequestBuilder;
use super::services::{GenericService, LOAD_BALANCER};
use super::utils;
use super::{Adapter, Error, ErrorKind, Page};

mod protocol;

use self::protocol::{
    AccessListRoot, AlgorithmsRoot, ConnectionLoggingRoot, ErrorPage, ErrorPageRoot,
    HealthMonitorRoot, LoadBalancerRoot, NodeRoot, NodesRoot, ProtocolsRoot,
    SessionPersistenceRoot, VirtualIpsRoot,
};
pub use self::protocol::{
    AccessType, Cluster, ConnectionLogging, HealthMonitor, HealthMonitorType, IpVersion,
    LoadBalancer, LoadBalancerAlgorithm, LoadBalancerProtocol, LoadBalancerState,
    LoadBalancerStatistics, LoadBalancerUpdate, NetworkItem, NewLoadBalancer, NewNode,
    NewVirtualIp, Node, NodeCondition, NodeStatus, NodeType, NodeUpdate, PersistenceType,
    ProtocolInfo, SessionPersistence, Timestamp, VirtualIp, VirtualIpType,
};

const LOAD_BALANCERS: &str = "loadbalancers";

/// Cloud Load Balancers service client.
#[derive(Debug, Clone)]
pub struct LoadBalancers {
    adapter: Adapter<GenericService>,
}

service_client!(LoadBalancers: GenericService = LOAD_BALANCER);

impl LoadBalancers {
    async fn lb_request(
        &self,
        method: Method,
        id: u64,
        rest: &[&str],
    ) -> Result<RequestBuilder<GenericService>, Error> {
        let id = id.to_string();
        let path = [LOAD_BALANCERS, id.as_str()]
            .iter()
            .chain(rest.iter())
            .copied()
            .collect::<Vec<_>>();
        self.adapter.request(method, path).await
    }

    /// List load balancers.
    pub async fn list_load_balancers(
        &self,
        limit: Option<usize>,
        marker: Option<u64>,
    ) -> Result<Page<LoadBalancer>, Error> {
        self.adapter
            .get(&[LOAD_BALANCERS])
            .await?
            .fetch_page(limit, marker)
            .await
    }

    /// Get a load balancer with all details.
    pub async fn get_load_balancer(&self, id: u64) -> Result<LoadBalancer, Error> {
        let root: LoadBalancerRoot<LoadBalancer> = self
            .lb_request(Method::GET, id, &[])
            .await?
            .fetch_json()
            .await?;
        trace!("Received {:?}", root.load_balancer);
        Ok(root.load_balancer)
    }

    /// Start creating a load balancer.
    ///
    /// At least one virtual IP is required.
    pub async fn create_load_balancer(
        &self,
        request: &NewLoadBalancer,
    ) -> Result<LoadBalancer, Error> {
        if request.virtual_ips.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "A load balancer requires at least one virtual IP",
            ));
        }
        if request.name.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Load balancer name must not be empty",
            ));
        }
        let root: LoadBalancerRoot<LoadBalancer> = self
            .adapter
            .post(&[LOAD_BALANCERS])
            .await?
            .json(&LoadBalancerRoot {
                load_balancer: request,
            })
            .fetch_json()
            .await?;
        debug!(
            "Requested creation of load balancer {} ({})",
            root.load_balancer.id, root.load_balancer.name
        );
        Ok(root.load_balancer)
    }

    /// Update load balancer attributes.
    pub async fn update_load_balancer(
        &self,
        id: u64,
        update: &LoadBalancerUpdate,
    ) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::PUT, id, &[])
            .await?
            .json(&LoadBalancerRoot {
                load_balancer: update,
            })
            .send()
            .await?;
        debug!("Requested update of load balancer {}", id);
        Ok(())
    }

    /// Start deleting a load balancer.
    pub async fn delete_load_balancer(&self, id: u64) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::DELETE, id, &[])
            .await?
            .send()
            .await?;
        debug!("Requested deletion of load balancer {}", id);
        Ok(())
    }

    /// List nodes of a load balancer.
    pub async fn list_nodes(&self, id: u64) -> Result<Vec<Node>, Error> {
        let root: NodesRoot<Vec<Node>> = self
            .lb_request(Method::GET, id, &["nodes"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.nodes)
    }

    /// Get a node of a load balancer.
    pub async fn get_node(&self, id: u64, node_id: u64) -> Result<Node, Error> {
        let node_id = node_id.to_string();
        let root: NodeRoot<Node> = self
            .lb_request(Method::GET, id, &["nodes", node_id.as_str()])
            .await?
            .fetch_json()
            .await?;
        Ok(root.node)
    }

    /// Add nodes to a load balancer.
    pub async fn add_nodes(&self, id: u64, nodes: &[NewNode]) -> Result<Vec<Node>, Error> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let root: NodesRoot<Vec<Node>> = self
            .lb_request(Method::POST, id, &["nodes"])
            .await?
            .json(&NodesRoot { nodes })
            .fetch_json()
            .await?;
        debug!("Added {} node(s) to load balancer {}", root.nodes.len(), id);
        Ok(root.nodes)
    }

    /// Update a node of a load balancer.
    pub async fn update_node(
        &self,
        id: u64,
        node_id: u64,
        update: &NodeUpdate,
    ) -> Result<(), Error> {
        let node_id = node_id.to_string();
        let _ = self
            .lb_request(Method::PUT, id, &["nodes", node_id.as_str()])
            .await?
            .json(&NodeRoot { node: update })
            .send()
            .await?;
        Ok(())
    }

    /// Remove a node from a load balancer.
    pub async fn remove_node(&self, id: u64, node_id: u64) -> Result<(), Error> {
        let node_id = node_id.to_string();
        let _ = self
            .lb_request(Method::DELETE, id, &["nodes", node_id.as_str()])
            .await?
            .send()
            .await?;
        debug!("Requested removal of node {} from load balancer {}", node_id, id);
        Ok(())
    }

    /// List virtual IPs of a load balancer.
    pub async fn list_virtual_ips(&self, id: u64) -> Result<Vec<VirtualIp>, Error> {
        let root: VirtualIpsRoot = self
            .lb_request(Method::GET, id, &["virtualips"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.virtual_ips)
    }

    /// Add a virtual IP to a load balancer.
    pub async fn add_virtual_ip(&self, id: u64, vip: &NewVirtualIp) -> Result<VirtualIp, Error> {
        let result: VirtualIp = self
            .lb_request(Method::POST, id, &["virtualips"])
            .await?
            .json(vip)
            .fetch_json()
            .await?;
        debug!("Added virtual IP {} to load balancer {}", result.address, id);
        Ok(result)
    }

    /// Remove a virtual IP from a load balancer.
    pub async fn remove_virtual_ip(&self, id: u64, vip_id: u64) -> Result<(), Error> {
        let vip_id = vip_id.to_string();
        let _ = self
            .lb_request(Method::DELETE, id, &["virtualips", vip_id.as_str()])
            .await?
            .send()
            .await?;
        Ok(())
    }

    /// List supported load balancing algorithms.
    pub async fn list_algorithms(&self) -> Result<Vec<LoadBalancerAlgorithm>, Error> {
        let root: AlgorithmsRoot = self
            .adapter
            .get(&[LOAD_BALANCERS, "algorithms"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.algorithms.into_iter().map(|a| a.name).collect())
    }

    /// List supported protocols.
    pub async fn list_protocols(&self) -> Result<Vec<ProtocolInfo>, Error> {
        let root: ProtocolsRoot = self
            .adapter
            .get(&[LOAD_BALANCERS, "protocols"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.protocols)
    }

    /// Get the health monitor (if configured).
    pub async fn get_health_monitor(&self, id: u64) -> Result<Option<HealthMonitor>, Error> {
        let root: HealthMonitorRoot<HealthMonitor> = self
            .lb_request(Method::GET, id, &["healthmonitor"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.health_monitor)
    }

    /// Configure the health monitor.
    pub async fn set_health_monitor(&self, id: u64, monitor: &HealthMonitor) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::PUT, id, &["healthmonitor"])
            .await?
            .json(&HealthMonitorRoot {
                health_monitor: Some(monitor),
            })
            .send()
            .await?;
        Ok(())
    }

    /// Remove the health monitor.
    pub async fn remove_health_monitor(&self, id: u64) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::DELETE, id, &["healthmonitor"])
            .await?
            .send()
            .await?;
        Ok(())
    }

    /// Get session persistence settings (if configured).
    pub async fn get_session_persistence(
        &self,
        id: u64,
    ) -> Result<Option<SessionPersistence>, Error> {
        let root: SessionPersistenceRoot<SessionPersistence> = self
            .lb_request(Method::GET, id, &["sessionpersistence"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.session_persistence)
    }

    /// Configure session persistence.
    pub async fn set_session_persistence(
        &self,
        id: u64,
        persistence: &SessionPersistence,
    ) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::PUT, id, &["sessionpersistence"])
            .await?
            .json(&SessionPersistenceRoot {
                session_persistence: Some(persistence),
            })
            .send()
            .await?;
        Ok(())
    }

    /// Disable session persistence.
    pub async fn remove_session_persistence(&self, id: u64) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::DELETE, id, &["sessionpersistence"])
            .await?
            .send()
            .await?;
        Ok(())
    }

    /// Get connection logging settings.
    pub async fn get_connection_logging(&self, id: u64) -> Result<ConnectionLogging, Error> {
        let root: ConnectionLoggingRoot = self
            .lb_request(Method::GET, id, &["connectionlogging"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.connection_logging)
    }

    /// Enable or disable connection logging.
    pub async fn set_connection_logging(&self, id: u64, enabled: bool) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::PUT, id, &["connectionlogging"])
            .await?
            .json(&ConnectionLoggingRoot {
                connection_logging: ConnectionLogging { enabled },
            })
            .send()
            .await?;
        debug!(
            "Requested connection logging {} for load balancer {}",
            if enabled { "on" } else { "off" },
            id
        );
        Ok(())
    }

    /// List access list items.
    pub async fn list_access_list(&self, id: u64) -> Result<Vec<NetworkItem>, Error> {
        let root: AccessListRoot<Vec<NetworkItem>> = self
            .lb_request(Method::GET, id, &["accesslist"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.access_list)
    }

    /// Add items to the access list.
    pub async fn add_access_list_items(&self, id: u64, items: &[NetworkItem]) -> Result<(), Error> {
        if items.is_empty() {
            return Ok(());
        }
        let _ = self
            .lb_request(Method::POST, id, &["accesslist"])
            .await?
            .json(&AccessListRoot { access_list: items })
            .send()
            .await?;
        Ok(())
    }

    /// Remove an item from the access list.
    pub async fn remove_access_list_item(&self, id: u64, item_id: u64) -> Result<(), Error> {
        let item_id = item_id.to_string();
        let _ = self
            .lb_request(Method::DELETE, id, &["accesslist", item_id.as_str()])
            .await?
            .send()
            .await?;
        Ok(())
    }

    /// Remove all items from the access list.
    pub async fn clear_access_list(&self, id: u64) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::DELETE, id, &["accesslist"])
            .await?
            .send()
            .await?;
        Ok(())
    }

    /// Get the HTML content of the error page.
    pub async fn get_error_page(&self, id: u64) -> Result<String, Error> {
        let root: ErrorPageRoot = self
            .lb_request(Method::GET, id, &["errorpage"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.errorpage.content)
    }

    /// Set a custom error page.
    pub async fn set_error_page<S: Into<String>>(&self, id: u64, content: S) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::PUT, id, &["errorpage"])
            .await?
            .json(&ErrorPageRoot {
                errorpage: ErrorPage {
                    content: content.into(),
                },
            })
            .send()
            .await?;
        Ok(())
    }

    /// Revert to the default error page.
    pub async fn remove_error_page(&self, id: u64) -> Result<(), Error> {
        let _ = self
            .lb_request(Method::DELETE, id, &["errorpage"])
            .await?
            .send()
            .await?;
        Ok(())
    }

    /// Get traffic statistics.
    pub async fn get_statistics(&self, id: u64) -> Result<LoadBalancerStatistics, Error> {
        self.lb_request(Method::GET, id, &["stats"])
            .await?
            .fetch_json()
            .await
    }

    /// Wait for a load balancer to reach the state.
    ///
    /// Fails with `OperationFailed` if the load balancer ends up in `ERROR` or (unless
    /// waiting for it) `DELETED`.
    pub async fn wait_for_load_balancer_state(
        &self,
        id: u64,
        state: LoadBalancerState,
        timeout: Duration,
        delay: Duration,
    ) -> Result<LoadBalancer, Error> {
        let description = format!("load balancer {} to reach state {}", id, state);
        let state = &state;
        utils::wait_for(timeout, delay, &description, move || async move {
            let lb = self.get_load_balancer(id).await?;
            if &lb.status == state {
                Ok(Some(lb))
            } else if lb.status == LoadBalancerState::Error
                || lb.status == LoadBalancerState::Deleted
            {
                Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!("Load balancer {} is in state {}", id, lb.status),
                ))
            } else {
                Ok(None)
            }
        })
        .await
    }
}
