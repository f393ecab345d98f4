// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
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

//! JSON structures and protocol bits for the Compute API.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::common::{blank_as_default, Link, Ref};

protocol_enum! {
    #[doc = "Possible server statuses."]
    enum ServerStatus(Other) {
        Active = "ACTIVE",
        Build = "BUILD",
        Deleted = "DELETED",
        Error = "ERROR",
        HardReboot = "HARD_REBOOT",
        Migrating = "MIGRATING",
        Password = "PASSWORD",
        Paused = "PAUSED",
        Reboot = "REBOOT",
        Rebuild = "REBUILD",
        Rescue = "RESCUE",
        Resize = "RESIZE",
        RevertResize = "REVERT_RESIZE",
        Shelved = "SHELVED",
        ShelvedOffloaded = "SHELVED_OFFLOADED",
        ShutOff = "SHUTOFF",
        SoftDeleted = "SOFT_DELETED",
        Suspended = "SUSPENDED",
        Unknown = "UNKNOWN",
        VerifyResize = "VERIFY_RESIZE"
    }
}

protocol_enum! {
    #[doc = "Possible power states."]
    #[non_exhaustive]
    enum ServerPowerState: u8 = NoState {
        NoState = 0,
        Running = 1,
        Paused = 3,
        Shutdown = 4,
        Crashed = 6,
        Suspended = 7
    }
}

protocol_enum! {
    #[doc = "Reboot type."]
    enum RebootType {
        Soft = "SOFT",
        Hard = "HARD"
    }
}

protocol_enum! {
    #[doc = "Possible image statuses."]
    enum ImageStatus(Other) {
        Active = "ACTIVE",
        Saving = "SAVING",
        Deleted = "DELETED",
        Error = "ERROR",
        Unknown = "UNKNOWN"
    }
}

protocol_enum! {
    #[doc = "Type of a server address."]
    enum AddressType(Other) {
        Fixed = "fixed",
        Floating = "floating"
    }
}

/// An address of a server.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerAddress {
    /// The address.
    pub addr: IpAddr,
    /// Address type (if known).
    #[serde(default, rename = "OS-EXT-IPS:type")]
    pub addr_type: Option<AddressType>,
    /// MAC address of the interface.
    #[serde(default, rename = "OS-EXT-IPS-MAC:mac_addr")]
    pub mac_addr: Option<String>,
}

/// A fault of a failed server.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerFault {
    /// HTTP-like error code.
    pub code: u16,
    /// Fault message.
    pub message: String,
    /// Fault time.
    #[serde(default)]
    pub created: Option<DateTime<FixedOffset>>,
}

/// A summary of a server.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
#[collection_name = "servers"]
pub struct ServerSummary {
    /// Server ID.
    #[resource_id]
    pub id: String,
    /// Server name.
    pub name: String,
    /// Links to the server.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A server.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
#[collection_name = "servers"]
pub struct Server {
    /// Server ID.
    #[resource_id]
    pub id: String,
    /// Server name.
    pub name: String,
    /// Server status.
    pub status: ServerStatus,
    /// Power state.
    #[serde(default, rename = "OS-EXT-STS:power_state")]
    pub power_state: ServerPowerState,
    /// Flavor of the server.
    pub flavor: Ref,
    /// Image of the server (empty for servers booted from volumes).
    #[serde(default, deserialize_with = "blank_as_default")]
    pub image: Option<Ref>,
    /// Addresses per network name.
    #[serde(default)]
    pub addresses: HashMap<String, Vec<ServerAddress>>,
    /// Public IPv4 address.
    #[serde(default, rename = "accessIPv4", deserialize_with = "blank_as_default")]
    pub access_ipv4: Option<IpAddr>,
    /// Public IPv6 address.
    #[serde(default, rename = "accessIPv6", deserialize_with = "blank_as_default")]
    pub access_ipv6: Option<IpAddr>,
    /// Key pair name.
    #[serde(default)]
    pub key_name: Option<String>,
    /// Server metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Build progress in percent.
    #[serde(default)]
    pub progress: Option<u8>,
    /// Fault of a failed server.
    #[serde(default)]
    pub fault: Option<ServerFault>,
    /// Owning tenant.
    pub tenant_id: String,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Creation time.
    pub created: DateTime<FixedOffset>,
    /// Last update time.
    pub updated: DateTime<FixedOffset>,
    /// Links to the server.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A summary of a flavor.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
#[collection_name = "flavors"]
pub struct FlavorSummary {
    /// Flavor ID.
    #[resource_id]
    pub id: String,
    /// Flavor name.
    pub name: String,
}

/// A flavor.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Flavor {
    /// Flavor ID.
    #[resource_id]
    pub id: String,
    /// Flavor name.
    pub name: String,
    /// RAM in MiB.
    pub ram: u64,
    /// Number of virtual CPUs.
    pub vcpus: u32,
    /// Root disk size in GiB.
    pub disk: u64,
    /// Swap size in MiB.
    #[serde(default, deserialize_with = "blank_as_default")]
    pub swap: u64,
    /// Ephemeral disk size in GiB.
    #[serde(default, rename = "OS-FLV-EXT-DATA:ephemeral")]
    pub ephemeral: u64,
    /// Whether the flavor is public.
    #[serde(default = "default_true", rename = "os-flavor-access:is_public")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

/// An image.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Image {
    /// Image ID.
    #[resource_id]
    pub id: String,
    /// Image name.
    pub name: String,
    /// Image status.
    pub status: ImageStatus,
    /// Minimum disk size in GiB.
    #[serde(default, rename = "minDisk")]
    pub min_disk: u64,
    /// Minimum RAM in MiB.
    #[serde(default, rename = "minRam")]
    pub min_ram: u64,
    /// Upload progress in percent.
    #[serde(default)]
    pub progress: Option<u8>,
    /// Image metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Creation time.
    #[serde(default)]
    pub created: Option<DateTime<FixedOffset>>,
    /// Last update time.
    #[serde(default)]
    pub updated: Option<DateTime<FixedOffset>>,
}

/// A key pair.
#[derive(Clone, Debug, Deserialize)]
pub struct KeyPair {
    /// Key pair name.
    pub name: String,
    /// Key fingerprint.
    pub fingerprint: String,
    /// Public key.
    pub public_key: String,
    /// Private key (only returned when the server generates the key pair).
    #[serde(default)]
    pub private_key: Option<String>,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A network to attach a new server to.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ServerNetwork {
    /// Network ID.
    #[serde(rename = "uuid", skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    /// Port ID.
    #[serde(rename = "port", skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
    /// Fixed IP address on the network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<IpAddr>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SecurityGroupName {
    pub name: String,
}

/// Request to create a server.
#[derive(Clone, Debug, Serialize)]
pub struct NewServer {
    /// Server name.
    pub name: String,
    /// Flavor ID.
    #[serde(rename = "flavorRef")]
    pub flavor: String,
    /// Image ID.
    #[serde(rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Key pair name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Server metadata.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    /// Networks to attach.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<ServerNetwork>,
    /// Security groups.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<SecurityGroupName>,
    /// Base64-encoded user data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Availability zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Whether to attach a config drive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_drive: Option<bool>,
}

impl NewServer {
    /// Start a server request with the required fields.
    pub fn new<N: Into<String>, F: Into<String>>(name: N, flavor: F) -> NewServer {
        NewServer {
            name: name.into(),
            flavor: flavor.into(),
            image: None,
            key_name: None,
            metadata: HashMap::new(),
            networks: Vec::new(),
            security_groups: Vec::new(),
            user_data: None,
            availability_zone: None,
            config_drive: None,
        }
    }

    /// Add a security group by name.
    pub fn with_security_group<S: Into<String>>(mut self, name: S) -> NewServer {
        self.security_groups
            .push(SecurityGroupName { name: name.into() });
        self
    }
}

/// A server that is being created.
#[derive(Clone, Debug, Deserialize)]
pub struct CreatedServer {
    /// Server ID.
    pub id: String,
    /// Generated administrator password.
    #[serde(default, rename = "adminPass")]
    pub admin_password: Option<String>,
    /// Links to the server.
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerRoot<T> {
    pub server: T,
}

#[derive(Debug, Serialize)]
pub struct ServerNameUpdate<'n> {
    pub name: &'n str,
}

#[derive(Debug, Deserialize)]
pub struct FlavorRoot {
    pub flavor: Flavor,
}

#[derive(Debug, Deserialize)]
pub struct ImageRoot {
    pub image: Image,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyPairRoot<T> {
    pub keypair: T,
}

#[derive(Debug, Deserialize)]
pub struct KeyPairsRoot {
    pub keypairs: Vec<KeyPairRoot<KeyPair>>,
}

#[derive(Debug, Serialize)]
pub struct NewKeyPair<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataRoot {
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct RebootAction {
    #[serde(rename = "type")]
    pub reboot_type: RebootType,
}

#[derive(Debug, Serialize)]
pub struct ResizeAction<'f> {
    #[serde(rename = "flavorRef")]
    pub flavor: &'f str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerAction<'a> {
    Reboot(RebootAction),
    Resize(ResizeAction<'a>),
    ConfirmResize(()),
    RevertResize(()),
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::common::test::compare;

    const SERVER: &str = r#"{"server": {
        "id": "22c91117-08de-4894-9aa9-6ef382400985",
        "name": "new-server-test",
        "status": "ACTIVE",
        "OS-EXT-STS:power_state": 1,
        "flavor": {"id": "1", "links": []},
        "image": "",
        "addresses": {"private": [{"addr": "192.168.0.3", "version": 4,
                                    "OS-EXT-IPS:type": "fixed"}]},
        "accessIPv4": "",
        "accessIPv6": "",
        "metadata": {"My Server Name": "Apache1"},
        "tenant_id": "6f70656e737461636b20342065766572",
        "user_id": "fake",
        "created": "2017-02-14T19:23:58Z",
        "updated": "2017-02-14T19:24:00Z",
        "links": []
    }}"#;

    #[test]
    fn test_server_parse() {
        let root: ServerRoot<Server> = serde_json::from_str(SERVER).unwrap();
        let server = root.server;
        assert_eq!(server.status, ServerStatus::Active);
        assert_eq!(server.power_state, ServerPowerState::Running);
        assert!(server.image.is_none());
        assert!(server.access_ipv4.is_none());
        assert_eq!(
            server.addresses["private"][0].addr_type,
            Some(AddressType::Fixed)
        );
        assert_eq!(server.metadata["My Server Name"], "Apache1");
    }

    #[test]
    fn test_flavor_empty_swap() {
        let flavor: Flavor = serde_json::from_str(
            r#"{"id": "1", "name": "m1.tiny", "ram": 512, "vcpus": 1, "disk": 1, "swap": ""}"#,
        )
        .unwrap();
        assert_eq!(flavor.swap, 0);
        assert!(flavor.is_public);
    }

    #[test]
    fn test_actions_serialize() {
        compare(
            r#"{"reboot": {"type": "HARD"}}"#,
            ServerAction::Reboot(RebootAction {
                reboot_type: RebootType::Hard,
            }),
        );
        compare(
            r#"{"resize": {"flavorRef": "2"}}"#,
            ServerAction::Resize(ResizeAction { flavor: "2" }),
        );
        compare(r#"{"confirmResize": null}"#, ServerAction::ConfirmResize(()));
    }

    #[test]
    fn test_new_server_serialize() {
        let mut server = NewServer::new("test", "1").with_security_group("default");
        server.image = Some("abcd".into());
        server.networks.push(ServerNetwork {
            network_id: Some("net".into()),
            ..Default::default()
        });
        compare(
            r#"{"server": {"name": "test", "flavorRef": "1", "imageRef": "abcd",
                           "networks": [{"uuid": "net"}],
                           "security_groups": [{"name": "default"}]}}"#,
            ServerRoot { server: &server },
        );
    }

    #[test]
    fn test_key_pairs_parse() {
        let root: KeyPairsRoot = serde_json::from_str(
            r#"{"keypairs": [{"keypair": {"name": "key", "fingerprint": "7e:eb",
                                          "public_key": "ssh-rsa AAAA"}}]}"#,
        )
        .unwrap();
        assert_eq!(root.keypairs[0].keypair.name, "key");
        assert!(root.keypairs[0].keypair.private_key.is_none());
    }
}
