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

//! JSON structures and protocol bits for the Cloud Load Balancers API.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::common::blank_as_default;

protocol_enum! {
    #[doc = "Possible load balancer states."]
    enum LoadBalancerState(Other) {
        Active = "ACTIVE",
        Build = "BUILD",
        PendingUpdate = "PENDING_UPDATE",
        PendingDelete = "PENDING_DELETE",
        Suspended = "SUSPENDED",
        Error = "ERROR",
        Deleted = "DELETED"
    }
}

protocol_enum! {
    #[doc = "Load balancing algorithms."]
    enum LoadBalancerAlgorithm(Other) {
        LeastConnections = "LEAST_CONNECTIONS",
        Random = "RANDOM",
        RoundRobin = "ROUND_ROBIN",
        WeightedLeastConnections = "WEIGHTED_LEAST_CONNECTIONS",
        WeightedRoundRobin = "WEIGHTED_ROUND_ROBIN"
    }
}

protocol_enum! {
    #[doc = "Load balanced protocols."]
    enum LoadBalancerProtocol(Other) {
        Dns = "DNS_TCP",
        DnsUdp = "DNS_UDP",
        Ftp = "FTP",
        Http = "HTTP",
        Https = "HTTPS",
        Imaps = "IMAPS",
        Imapv4 = "IMAPv4",
        Ldap = "LDAP",
        Ldaps = "LDAPS",
        Mysql = "MYSQL",
        Pop3 = "POP3",
        Pop3s = "POP3S",
        Smtp = "SMTP",
        Tcp = "TCP",
        TcpClientFirst = "TCP_CLIENT_FIRST",
        Udp = "UDP",
        UdpStream = "UDP_STREAM",
        Sftp = "SFTP"
    }
}

protocol_enum! {
    #[doc = "Condition of a node."]
    enum NodeCondition(Other) {
        Enabled = "ENABLED",
        Disabled = "DISABLED",
        Draining = "DRAINING"
    }
}

protocol_enum! {
    #[doc = "Type of a node."]
    enum NodeType(Other) {
        Primary = "PRIMARY",
        Secondary = "SECONDARY"
    }
}

protocol_enum! {
    #[doc = "Health status of a node."]
    enum NodeStatus(Other) {
        Online = "ONLINE",
        Offline = "OFFLINE",
        Unknown = "UNKNOWN"
    }
}

protocol_enum! {
    #[doc = "Type of a virtual IP."]
    enum VirtualIpType(Other) {
        Public = "PUBLIC",
        ServiceNet = "SERVICENET"
    }
}

protocol_enum! {
    #[doc = "IP version of a virtual IP."]
    enum IpVersion(Other) {
        V4 = "IPV4",
        V6 = "IPV6"
    }
}

protocol_enum! {
    #[doc = "Type of a health monitor."]
    enum HealthMonitorType(Other) {
        Connect = "CONNECT",
        Http = "HTTP",
        Https = "HTTPS"
    }
}

protocol_enum! {
    #[doc = "Type of session persistence."]
    enum PersistenceType(Other) {
        HttpCookie = "HTTP_COOKIE",
        SourceIp = "SOURCE_IP"
    }
}

protocol_enum! {
    #[doc = "Type of an access list item."]
    enum AccessType(Other) {
        Allow = "ALLOW",
        Deny = "DENY"
    }
}

/// A point in time as reported by the service.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Timestamp {
    /// The time.
    pub time: DateTime<FixedOffset>,
}

/// A back-end node of a load balancer.
#[derive(Clone, Debug, Deserialize)]
pub struct Node {
    /// Node ID.
    pub id: u64,
    /// Node address.
    pub address: String,
    /// Node port.
    pub port: u16,
    /// Node condition.
    pub condition: NodeCondition,
    /// Node type.
    #[serde(default = "default_node_type", rename = "type")]
    pub node_type: NodeType,
    /// Health status.
    #[serde(default = "default_node_status")]
    pub status: NodeStatus,
    /// Weight for weighted algorithms.
    #[serde(default)]
    pub weight: Option<u32>,
}

fn default_node_type() -> NodeType {
    NodeType::Primary
}

fn default_node_status() -> NodeStatus {
    NodeStatus::Unknown
}

/// A virtual IP of a load balancer.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualIp {
    /// Virtual IP ID.
    pub id: u64,
    /// The address.
    pub address: String,
    /// Virtual IP type.
    #[serde(rename = "type")]
    pub vip_type: VirtualIpType,
    /// IP version.
    pub ip_version: IpVersion,
}

/// A health monitor.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthMonitor {
    /// Monitor type.
    #[serde(rename = "type")]
    pub monitor_type: HealthMonitorType,
    /// Seconds between checks.
    pub delay: u32,
    /// Seconds to wait for a response.
    pub timeout: u32,
    /// Failed checks before a node is removed from rotation.
    pub attempts_before_deactivation: u32,
    /// HTTP path to check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Expected HTTP status regular expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_regex: Option<String>,
    /// Expected body regular expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_regex: Option<String>,
    /// Host header to send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
}

/// Session persistence settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionPersistence {
    /// Persistence type.
    pub persistence_type: PersistenceType,
}

/// Connection logging settings.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConnectionLogging {
    /// Whether connection logging is enabled.
    pub enabled: bool,
}

/// An access list item.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkItem {
    /// Item ID (assigned by the server).
    #[serde(default, skip_serializing)]
    pub id: Option<u64>,
    /// Address or CIDR.
    pub address: String,
    /// Whether to allow or deny the address.
    #[serde(rename = "type")]
    pub access_type: AccessType,
}

impl NetworkItem {
    /// A new access list item.
    pub fn new<S: Into<String>>(address: S, access_type: AccessType) -> NetworkItem {
        NetworkItem {
            id: None,
            address: address.into(),
            access_type,
        }
    }
}

/// A cluster the load balancer runs on.
#[derive(Clone, Debug, Deserialize)]
pub struct Cluster {
    /// Cluster name.
    pub name: String,
}

/// A load balancer.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
#[serde(rename_all = "camelCase")]
#[collection_name = "loadBalancers"]
pub struct LoadBalancer {
    /// Load balancer ID.
    #[resource_id]
    pub id: u64,
    /// Load balancer name.
    pub name: String,
    /// Balanced protocol.
    pub protocol: LoadBalancerProtocol,
    /// Balanced port.
    pub port: u16,
    /// Balancing algorithm.
    pub algorithm: LoadBalancerAlgorithm,
    /// Current state.
    pub status: LoadBalancerState,
    /// Connection timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u32>,
    /// Whether half-closed connections are supported.
    #[serde(default)]
    pub half_closed: Option<bool>,
    /// Number of nodes.
    #[serde(default)]
    pub node_count: Option<u32>,
    /// Back-end nodes (only in details).
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Virtual IPs.
    #[serde(default)]
    pub virtual_ips: Vec<VirtualIp>,
    /// Health monitor (only in details).
    #[serde(default)]
    pub health_monitor: Option<HealthMonitor>,
    /// Session persistence (only in details).
    #[serde(default)]
    pub session_persistence: Option<SessionPersistence>,
    /// Connection logging (only in details).
    #[serde(default)]
    pub connection_logging: Option<ConnectionLogging>,
    /// Cluster (only in details).
    #[serde(default)]
    pub cluster: Option<Cluster>,
    /// Creation time.
    #[serde(default)]
    pub created: Option<Timestamp>,
    /// Last update time.
    #[serde(default)]
    pub updated: Option<Timestamp>,
}

/// Traffic statistics of a load balancer.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancerStatistics {
    /// Connections closed because of a timeout.
    #[serde(rename = "connectTimeOut")]
    pub connect_timeout: u64,
    /// Connections closed because of an error.
    pub connect_error: u64,
    /// Connection failures.
    pub connect_failure: u64,
    /// Connections timed out while transferring data.
    pub data_timed_out: u64,
    /// Connections timed out while being kept alive.
    pub keep_alive_timed_out: u64,
    /// Maximum number of simultaneous connections.
    pub max_conn: u64,
    /// Current number of connections.
    pub current_conn: u64,
}

/// A supported protocol and its default port.
#[derive(Clone, Debug, Deserialize)]
pub struct ProtocolInfo {
    /// Protocol name.
    pub name: LoadBalancerProtocol,
    /// Default port.
    pub port: u16,
}

/// A node to add.
#[derive(Clone, Debug, Serialize)]
pub struct NewNode {
    /// Node address.
    pub address: String,
    /// Node port.
    pub port: u16,
    /// Node condition.
    pub condition: NodeCondition,
    /// Node type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    /// Node weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl NewNode {
    /// An enabled node.
    pub fn new<S: Into<String>>(address: S, port: u16) -> NewNode {
        NewNode {
            address: address.into(),
            port,
            condition: NodeCondition::Enabled,
            node_type: None,
            weight: None,
        }
    }
}

/// Changes to a node.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NodeUpdate {
    /// New condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<NodeCondition>,
    /// New type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    /// New weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// A virtual IP to create with a load balancer or to add to it.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum NewVirtualIp {
    /// A new address.
    New {
        /// Address type.
        #[serde(rename = "type")]
        vip_type: VirtualIpType,
        /// IP version.
        #[serde(rename = "ipVersion", skip_serializing_if = "Option::is_none")]
        ip_version: Option<IpVersion>,
    },
    /// An address shared with another load balancer.
    Shared {
        /// ID of the existing virtual IP.
        id: u64,
    },
}

impl NewVirtualIp {
    /// A new public IPv4 address.
    pub fn public() -> NewVirtualIp {
        NewVirtualIp::New {
            vip_type: VirtualIpType::Public,
            ip_version: None,
        }
    }

    /// A new ServiceNet address.
    pub fn service_net() -> NewVirtualIp {
        NewVirtualIp::New {
            vip_type: VirtualIpType::ServiceNet,
            ip_version: None,
        }
    }
}

/// Request to create a load balancer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoadBalancer {
    /// Load balancer name.
    pub name: String,
    /// Balanced protocol.
    pub protocol: LoadBalancerProtocol,
    /// Balanced port.
    pub port: u16,
    /// Virtual IPs, at least one is required.
    pub virtual_ips: Vec<NewVirtualIp>,
    /// Back-end nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NewNode>,
    /// Balancing algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<LoadBalancerAlgorithm>,
    /// Connection timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// Whether to support half-closed connections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_closed: Option<bool>,
    /// Access list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_list: Vec<NetworkItem>,
    /// Health monitor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_monitor: Option<HealthMonitor>,
    /// Session persistence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_persistence: Option<SessionPersistence>,
    /// Connection logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_logging: Option<ConnectionLogging>,
}

impl NewLoadBalancer {
    /// Start a request with the required fields.
    pub fn new<S: Into<String>>(
        name: S,
        protocol: LoadBalancerProtocol,
        port: u16,
        virtual_ips: Vec<NewVirtualIp>,
    ) -> NewLoadBalancer {
        NewLoadBalancer {
            name: name.into(),
            protocol,
            port,
            virtual_ips,
            nodes: Vec::new(),
            algorithm: None,
            timeout: None,
            half_closed: None,
            access_list: Vec::new(),
            health_monitor: None,
            session_persistence: None,
            connection_logging: None,
        }
    }
}

/// Changes to a load balancer.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<LoadBalancerProtocol>,
    /// New port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// New algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<LoadBalancerAlgorithm>,
    /// New connection timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// New half-closed flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_closed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoadBalancerRoot<T> {
    pub load_balancer: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NodeRoot<T> {
    pub node: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NodesRoot<T> {
    pub nodes: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VirtualIpsRoot {
    pub virtual_ips: Vec<VirtualIp>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlgorithmName {
    pub name: LoadBalancerAlgorithm,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlgorithmsRoot {
    pub algorithms: Vec<AlgorithmName>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProtocolsRoot {
    pub protocols: Vec<ProtocolInfo>,
}

/// The service returns an empty object when a setting is not configured.
#[derive(Debug, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "T: serde::de::DeserializeOwned")
)]
pub(crate) struct HealthMonitorRoot<T> {
    #[serde(default, deserialize_with = "blank_as_default")]
    pub health_monitor: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "T: serde::de::DeserializeOwned")
)]
pub(crate) struct SessionPersistenceRoot<T> {
    #[serde(default, deserialize_with = "blank_as_default")]
    pub session_persistence: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionLoggingRoot {
    pub connection_logging: ConnectionLogging,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessListRoot<T> {
    pub access_list: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ErrorPage {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ErrorPageRoot {
    pub errorpage: ErrorPage,
}
