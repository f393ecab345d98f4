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

//! Identity API wire structures (V3 and V2).

use chrono::{DateTime, FixedOffset};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::catalog::{CatalogEndpoint, ServiceCatalogEntry};
use crate::common::IdOrName;
use crate::InterfaceType;

/// User name or ID, password and the user domain.
#[derive(Clone, Debug, Serialize)]
pub struct UserAndPassword {
    #[serde(flatten)]
    pub user: IdOrName,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<IdOrName>,
}

/// V3 authentication identity.
#[derive(Clone, Debug)]
pub enum Identity {
    Password(UserAndPassword),
    Token(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct Project {
    #[serde(flatten)]
    pub project: IdOrName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<IdOrName>,
}

#[derive(Clone, Debug, Serialize)]
pub enum Scope {
    #[serde(rename = "project")]
    Project(Project),
}

#[derive(Clone, Debug, Serialize)]
pub struct Auth {
    pub identity: Identity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthRoot {
    pub auth: Auth,
}

#[derive(Serialize)]
struct UserRoot<'u> {
    user: &'u UserAndPassword,
}

#[derive(Serialize)]
struct TokenId<'t> {
    id: &'t str,
}

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut inner = serializer.serialize_struct("Identity", 2)?;
        match self {
            Identity::Password(ref user) => {
                inner.serialize_field("methods", &["password"])?;
                inner.serialize_field("password", &UserRoot { user })?;
            }
            Identity::Token(ref token) => {
                inner.serialize_field("methods", &["token"])?;
                inner.serialize_field("token", &TokenId { id: token })?;
            }
        }
        inner.end()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoleV3 {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProjectV3 {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserV3 {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// V3 token body.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenV3 {
    pub expires_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub catalog: Vec<ServiceCatalogEntry>,
    #[serde(default)]
    pub project: Option<ProjectV3>,
    #[serde(default)]
    pub user: Option<UserV3>,
    #[serde(default)]
    pub roles: Vec<RoleV3>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenV3Root {
    pub token: TokenV3,
}

/// V2 credentials in their wire form.
#[derive(Clone, Serialize)]
pub enum CredentialsV2 {
    #[serde(rename = "passwordCredentials")]
    Password { username: String, password: String },
    #[serde(rename = "RAX-KSKEY:apiKeyCredentials")]
    ApiKey {
        username: String,
        #[serde(rename = "apiKey")]
        api_key: String,
    },
    #[serde(rename = "apiAccessKeyCredentials")]
    AccessKey {
        #[serde(rename = "accessKey")]
        access_key: String,
        #[serde(rename = "secretKey")]
        secret_key: String,
    },
    #[serde(rename = "token")]
    Token { id: String },
}

#[derive(Clone, Serialize)]
pub struct AuthV2 {
    #[serde(flatten)]
    pub credentials: CredentialsV2,
    #[serde(rename = "tenantName", skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct AuthV2Root {
    pub auth: AuthV2,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TenantV2 {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenV2 {
    pub id: String,
    pub expires: DateTime<FixedOffset>,
    #[serde(default)]
    pub tenant: Option<TenantV2>,
}

/// A V2 endpoint: one entry per region with up to three interfaces.
#[derive(Clone, Debug, Deserialize)]
pub struct EndpointV2 {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, rename = "publicURL")]
    pub public_url: Option<String>,
    #[serde(default, rename = "internalURL")]
    pub internal_url: Option<String>,
    #[serde(default, rename = "adminURL")]
    pub admin_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceV2 {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointV2>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoleV2 {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "tenantId")]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserV2 {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleV2>,
    #[serde(default, rename = "RAX-AUTH:defaultRegion")]
    pub default_region: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccessV2 {
    pub token: TokenV2,
    #[serde(default, rename = "serviceCatalog")]
    pub catalog: Vec<ServiceV2>,
    #[serde(default)]
    pub user: Option<UserV2>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccessV2Root {
    pub access: AccessV2,
}

impl From<ServiceV2> for ServiceCatalogEntry {
    fn from(value: ServiceV2) -> ServiceCatalogEntry {
        let mut endpoints = Vec::with_capacity(value.endpoints.len() * 3);
        for endp in value.endpoints {
            for (interface, url) in [
                (InterfaceType::Public, endp.public_url),
                (InterfaceType::Internal, endp.internal_url),
                (InterfaceType::Admin, endp.admin_url),
            ] {
                if let Some(url) = url {
                    endpoints.push(CatalogEndpoint {
                        interface: interface.to_string(),
                        region: endp.region.clone(),
                        url,
                    });
                }
            }
        }

        ServiceCatalogEntry {
            service_type: value.service_type,
            name: value.name,
            endpoints,
        }
    }
}

#[cfg(test)]
pub mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_password_body() {
        let body = AuthRoot {
            auth: Auth {
                identity: Identity::Password(UserAndPassword {
                    user: IdOrName::from_name("admin"),
                    password: "pa$$w0rd".into(),
                    domain: Some(IdOrName::from_name("Default")),
                }),
                scope: Some(Scope::Project(Project {
                    project: IdOrName::from_id("abcd"),
                    domain: None,
                })),
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {"user": {
                        "name": "admin",
                        "password": "pa$$w0rd",
                        "domain": {"name": "Default"}
                    }}
                },
                "scope": {"project": {"id": "abcd"}}
            }})
        );
    }

    #[test]
    fn test_token_body() {
        let body = AuthRoot {
            auth: Auth {
                identity: Identity::Token("t0k3n".into()),
                scope: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"auth": {"identity": {"methods": ["token"], "token": {"id": "t0k3n"}}}})
        );
    }

    #[test]
    fn test_v2_bodies() {
        let body = AuthV2Root {
            auth: AuthV2 {
                credentials: CredentialsV2::ApiKey {
                    username: "joe".into(),
                    api_key: "k3y".into(),
                },
                tenant_name: None,
                tenant_id: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"auth": {"RAX-KSKEY:apiKeyCredentials": {"username": "joe", "apiKey": "k3y"}}})
        );

        let body = AuthV2Root {
            auth: AuthV2 {
                credentials: CredentialsV2::AccessKey {
                    access_key: "ak".into(),
                    secret_key: "sk".into(),
                },
                tenant_name: None,
                tenant_id: Some("1234".into()),
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"auth": {
                "apiAccessKeyCredentials": {"accessKey": "ak", "secretKey": "sk"},
                "tenantId": "1234"
            }})
        );
    }

    #[test]
    fn test_v2_access() {
        let root: AccessV2Root = serde_json::from_value(json!({"access": {
            "token": {
                "id": "abcd",
                "expires": "2030-10-15T15:13:50.866-05:00",
                "tenant": {"id": "123456", "name": "123456"}
            },
            "serviceCatalog": [{
                "name": "cloudFiles",
                "type": "object-store",
                "endpoints": [{
                    "region": "DFW",
                    "tenantId": "MossoCloudFS_1",
                    "publicURL": "https://storage101.dfw1.clouddrive.com/v1/MossoCloudFS_1",
                    "internalURL": "https://snet-storage101.dfw1.clouddrive.com/v1/MossoCloudFS_1"
                }]
            }],
            "user": {
                "id": "42",
                "name": "joe",
                "roles": [{"id": "3", "name": "identity:default"}],
                "RAX-AUTH:defaultRegion": "DFW"
            }
        }}))
        .unwrap();
        assert_eq!(root.access.token.id, "abcd");
        let user = root.access.user.unwrap();
        assert_eq!(user.default_region.as_deref(), Some("DFW"));
        assert_eq!(user.roles[0].name, "identity:default");

        let entry: ServiceCatalogEntry = root.access.catalog.into_iter().next().unwrap().into();
        assert_eq!(entry.service_type, "object-store");
        assert_eq!(entry.endpoints.len(), 2);
        assert_eq!(entry.endpoints[0].interface, "public");
        assert_eq!(entry.endpoints[1].interface, "internal");
        assert_eq!(entry.endpoints[1].region.as_deref(), Some("DFW"));
    }
}
