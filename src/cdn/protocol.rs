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

//! JSON structures and protocol bits for the Content Delivery API.

use serde::{Deserialize, Serialize};

use crate::common::Link;
use crate::Error;

protocol_enum! {
    #[doc = "Possible statuses of a CDN service."]
    enum ServiceStatus(Other) {
        CreateInProgress = "create_in_progress",
        Deployed = "deployed",
        UpdateInProgress = "update_in_progress",
        DeleteInProgress = "delete_in_progress",
        Failed = "failed"
    }
}

impl ServiceStatus {
    /// Whether the service is in an error state.
    pub fn is_failed(&self) -> bool {
        matches!(self, ServiceStatus::Failed)
            || self.as_str().ends_with("_failed")
    }
}

protocol_enum! {
    #[doc = "Protocol used to serve a domain."]
    enum DomainProtocol {
        Http = "http",
        Https = "https"
    }
}

protocol_enum! {
    #[doc = "JSON patch operation."]
    enum PatchOp {
        Add = "add",
        Remove = "remove",
        Replace = "replace"
    }
}

/// A CDN provider behind a flavor.
#[derive(Clone, Debug, Deserialize)]
pub struct FlavorProvider {
    /// Provider name.
    pub provider: String,
    /// Links to the provider.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A CDN flavor.
#[derive(Clone, Debug, Deserialize)]
pub struct Flavor {
    /// Flavor ID.
    pub id: String,
    /// Providers used by the flavor.
    #[serde(default)]
    pub providers: Vec<FlavorProvider>,
    /// Links to the flavor.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A domain served by a CDN service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Domain {
    /// Domain name.
    pub domain: String,
    /// Protocol of the domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<DomainProtocol>,
}

impl Domain {
    /// An HTTP domain.
    pub fn new<S: Into<String>>(domain: S) -> Domain {
        Domain {
            domain: domain.into(),
            protocol: None,
        }
    }
}

/// A rule matching request URLs.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Rule {
    /// Rule name.
    pub name: String,
    /// Request URL pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    /// Referrer (for restrictions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// An origin server.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Origin {
    /// Host name or address.
    pub origin: String,
    /// Port of the origin.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether to use SSL for the origin.
    #[serde(default)]
    pub ssl: bool,
    /// Rules selecting requests to send to this origin.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

fn default_port() -> u16 {
    80
}

impl Origin {
    /// An HTTP origin on port 80.
    pub fn new<S: Into<String>>(origin: S) -> Origin {
        Origin {
            origin: origin.into(),
            port: default_port(),
            ssl: false,
            rules: Vec::new(),
        }
    }
}

/// A caching rule.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CachingRule {
    /// Rule name.
    pub name: String,
    /// Time-to-live in seconds.
    pub ttl: u64,
    /// Requests the rule applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

/// An access restriction.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Restriction {
    /// Restriction name.
    pub name: String,
    /// Rules of the restriction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

/// An error reported for a service.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceError {
    /// Error message.
    pub message: String,
}

/// A CDN service.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Service {
    /// Service ID.
    #[resource_id]
    pub id: String,
    /// Service name.
    pub name: String,
    /// Served domains.
    #[serde(default)]
    pub domains: Vec<Domain>,
    /// Origin servers.
    #[serde(default)]
    pub origins: Vec<Origin>,
    /// Caching rules.
    #[serde(default)]
    pub caching: Vec<CachingRule>,
    /// Access restrictions.
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
    /// Flavor of the service.
    pub flavor_id: String,
    /// Current status.
    pub status: ServiceStatus,
    /// Errors (for failed services).
    #[serde(default)]
    pub errors: Vec<ServiceError>,
    /// Links to the service and its access URLs.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Request to create a CDN service.
#[derive(Clone, Debug, Serialize)]
pub struct NewService {
    /// Service name.
    pub name: String,
    /// Domains to serve.
    pub domains: Vec<Domain>,
    /// Origin servers.
    pub origins: Vec<Origin>,
    /// Caching rules.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caching: Vec<CachingRule>,
    /// Access restrictions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
    /// Flavor to use.
    pub flavor_id: String,
}

/// A single JSON patch operation for updating a service.
#[derive(Clone, Debug, Serialize)]
pub struct PatchOperation {
    /// Operation.
    pub op: PatchOp,
    /// JSON pointer to the changed field (e.g. `/domains/-`).
    pub path: String,
    /// New value (not used for removal).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl PatchOperation {
    /// Add a value at the path.
    pub fn add<P: Into<String>, T: Serialize>(path: P, value: T) -> Result<PatchOperation, Error> {
        Ok(PatchOperation {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(serde_json::to_value(value)?),
        })
    }

    /// Replace the value at the path.
    pub fn replace<P: Into<String>, T: Serialize>(
        path: P,
        value: T,
    ) -> Result<PatchOperation, Error> {
        Ok(PatchOperation {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(serde_json::to_value(value)?),
        })
    }

    /// Remove the value at the path.
    pub fn remove<P: Into<String>>(path: P) -> PatchOperation {
        PatchOperation {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlavorsRoot {
    pub flavors: Vec<Flavor>,
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::common::test::compare;

    #[test]
    fn test_service_parse() {
        let service: Service = serde_json::from_str(
            r#"{
                "id": "96737ae3-cfc1-4c72-be88-5d0e7cc9a3f0",
                "name": "mywebsite.com",
                "domains": [{"domain": "www.mywebsite.com", "protocol": "http"}],
                "origins": [{"origin": "mywebsite.com", "port": 80, "ssl": false}],
                "caching": [{"name": "default", "ttl": 3600}],
                "restrictions": [{"name": "website only",
                                  "rules": [{"name": "mywebsite.com",
                                             "referrer": "www.mywebsite.com"}]}],
                "flavor_id": "cdn",
                "status": "update_failed",
                "errors": [{"message": "Provider is not available"}],
                "links": []
            }"#,
        )
        .unwrap();
        assert_eq!(service.domains[0].protocol, Some(DomainProtocol::Http));
        assert_eq!(service.caching[0].ttl, 3600);
        assert!(service.status.is_unknown());
        assert!(service.status.is_failed());
        assert!(!ServiceStatus::Deployed.is_failed());
        assert_eq!(service.errors[0].message, "Provider is not available");
    }

    #[test]
    fn test_patch_serialize() {
        let ops = vec![
            PatchOperation::add("/domains/-", Domain::new("cdn.example.com")).unwrap(),
            PatchOperation::remove("/origins/1"),
            PatchOperation::replace("/name", "renamed").unwrap(),
        ];
        compare(
            r#"[
                {"op": "add", "path": "/domains/-", "value": {"domain": "cdn.example.com"}},
                {"op": "remove", "path": "/origins/1"},
                {"op": "replace", "path": "/name", "value": "renamed"}
            ]"#,
            ops,
        );
    }
}
