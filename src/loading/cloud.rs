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

//! A cloud entry and turning it into an authenticated session.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::config::from_config;
use super::env::from_env;
use super::{config_error, HttpOptions};
use crate::client::AuthenticatedClient;
use crate::common::IdOrName;
use crate::identity::v2::{CloudIdentity, Credentials};
use crate::identity::{Password, Scope, Token};
use crate::{AuthType, Error, NoAuth, Session, ValidInterfaces, Vendor};

/// The `auth` section of a cloud entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[cfg_attr(test, derive(PartialEq, Eq))]
#[serde(default)]
pub(crate) struct Auth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) auth_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) project_domain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) project_domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tenant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user_domain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user_domain_name: Option<String>,
}

/// Cloud configuration.
///
/// A cloud configuration is loaded from `clouds.yaml`, from `OS_*` environment variables or
/// from a [credentials file](struct.CredentialsFile.html) and can be turned into a
/// [Session](struct.Session.html) or into one of the authentication plugins.
///
/// Besides the upstream keys (`auth`, `auth_type`, `cacert`, `verify`, `api_timeout`,
/// `interface`, `region_name` and `<service>_endpoint_override`), an entry may contain
/// `vendor` (`openstack`, `rackspace` or `hp`) and `proxy`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct CloudConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) auth: Option<Auth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) auth_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) api_timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cacert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) region_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) vendor: Option<Vendor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) verify: Option<bool>,
    #[serde(flatten)]
    pub(crate) options: HashMap<String, serde_yaml::Value>,
}

/// Authentication plugin selected by `auth_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    None,
    Password,
    Token,
    V2Password,
    V2ApiKey,
    V2AccessKey,
    V2Token,
}

const ALL_V2: &[Method] = &[
    Method::V2Password,
    Method::V2ApiKey,
    Method::V2AccessKey,
    Method::V2Token,
];

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::None => "none",
            Method::Password => "password",
            Method::Token => "v3token",
            Method::V2Password => "v2password",
            Method::V2ApiKey => "v2apikey",
            Method::V2AccessKey => "v2accesskey",
            Method::V2Token => "v2token",
        }
    }

    #[inline]
    fn is_v2(self) -> bool {
        ALL_V2.contains(&self)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Method, Error> {
        Ok(match s {
            "none" | "noauth" => Method::None,
            "password" | "v3password" => Method::Password,
            "token" | "v3token" => Method::Token,
            "v2password" => Method::V2Password,
            "v2apikey" | "rackspace_apikey" => Method::V2ApiKey,
            "v2accesskey" => Method::V2AccessKey,
            "v2token" => Method::V2Token,
            other => {
                return Err(config_error(format!(
                    "Unsupported authentication type: {}",
                    other
                )))
            }
        })
    }
}

#[inline]
fn require(value: Option<String>, message: &str) -> Result<String, Error> {
    value.ok_or_else(|| config_error(message))
}

impl Auth {
    /// Plugin implied by the credentials present.
    fn implied_method(&self, vendor: Vendor) -> Method {
        let v2 = vendor.prefers_identity_v2();
        if self.token.is_some() {
            if v2 {
                Method::V2Token
            } else {
                Method::Token
            }
        } else if self.api_key.is_some() && vendor.supports_api_key() {
            Method::V2ApiKey
        } else if self.access_key.is_some() && vendor.supports_access_key() {
            Method::V2AccessKey
        } else if v2 {
            Method::V2Password
        } else {
            Method::Password
        }
    }

    fn scope(&mut self) -> Option<Scope> {
        let project = match (self.project_id.take(), self.project_name.take()) {
            (Some(id), _) => IdOrName::Id(id),
            (None, Some(name)) => IdOrName::Name(name),
            (None, None) => return None,
        };
        let domain = match (self.project_domain_id.take(), self.project_domain_name.take()) {
            (Some(id), _) => IdOrName::Id(id),
            (None, Some(name)) => IdOrName::Name(name),
            (None, None) => IdOrName::from_name("Default"),
        };
        Some(Scope::Project {
            project,
            domain: Some(domain),
        })
    }

    fn into_none(self) -> Result<NoAuth, Error> {
        let auth = match self.endpoint {
            Some(endpoint) => NoAuth::new(endpoint)?,
            None => NoAuth::new_without_endpoint(),
        };
        match self.token {
            Some(token) => auth.with_token(token),
            None => Ok(auth),
        }
    }

    fn into_password(mut self) -> Result<Password, Error> {
        let scope = self.scope();
        let auth_url = require(self.auth_url, "Password authentication requires auth_url")?;
        let password = require(self.password, "Password authentication requires a password")?;
        let user_domain = match (self.user_domain_id, self.user_domain_name) {
            (Some(id), _) => Some(IdOrName::Id(id)),
            (None, Some(name)) => Some(IdOrName::Name(name)),
            (None, None) => None,
        };
        let user = match (self.user_id, self.username) {
            (Some(id), _) => IdOrName::Id(id),
            (None, Some(name)) => IdOrName::Name(name),
            (None, None) => {
                return Err(config_error(
                    "Password authentication requires a username or a user ID",
                ))
            }
        };
        // A user name is meaningless without a domain, a user ID is globally unique.
        let user_domain = match user {
            IdOrName::Name(_) => {
                Some(user_domain.unwrap_or_else(|| IdOrName::from_name("Default")))
            }
            IdOrName::Id(_) => user_domain,
        };

        let mut id = Password::new_with_user(&auth_url, user, password, user_domain)?;
        if let Some(scope) = scope {
            id.set_scope(scope);
        }
        Ok(id)
    }

    fn into_token(mut self) -> Result<Token, Error> {
        let scope = self.scope();
        let auth_url = require(self.auth_url, "Token authentication requires auth_url")?;
        let token = require(self.token, "Token authentication requires a token")?;
        let mut id = Token::new(&auth_url, token)?;
        if let Some(scope) = scope {
            id.set_scope(scope);
        }
        Ok(id)
    }

    fn into_cloud_identity(self, method: Method, vendor: Vendor) -> Result<CloudIdentity, Error> {
        let auth_url = require(
            self.auth_url
                .or_else(|| vendor.identity_url().map(String::from)),
            "Identity V2 authentication requires auth_url",
        )?;
        let credentials = match method {
            Method::V2Password => Credentials::password(
                require(self.username, "Password authentication requires a username")?,
                require(self.password, "Password authentication requires a password")?,
            ),
            Method::V2ApiKey => Credentials::api_key(
                require(self.username, "API key authentication requires a username")?,
                require(self.api_key, "API key authentication requires an API key")?,
            ),
            Method::V2AccessKey => Credentials::access_key(
                require(self.access_key, "Access key authentication requires access_key")?,
                require(self.secret_key, "Access key authentication requires secret_key")?,
            ),
            Method::V2Token => {
                Credentials::token(require(self.token, "Token authentication requires a token")?)
            }
            other => {
                return Err(config_error(format!(
                    "{} is not an Identity V2 authentication type",
                    other.as_str()
                )))
            }
        };

        let mut id = CloudIdentity::new_for_vendor(&auth_url, credentials, vendor)?;
        // Identity V2 calls projects tenants.
        match (
            self.tenant_id.or(self.project_id),
            self.tenant_name.or(self.project_name),
        ) {
            (Some(tenant_id), _) => id.set_tenant_id(tenant_id),
            (None, Some(tenant_name)) => id.set_tenant_name(tenant_name),
            (None, None) => {}
        }
        Ok(id)
    }

    fn into_auth_type(self, method: Method, vendor: Vendor) -> Result<Arc<dyn AuthType>, Error> {
        debug!("Using {} authentication for vendor {}", method.as_str(), vendor);
        Ok(match method {
            Method::None => Arc::new(self.into_none()?),
            Method::Password => Arc::new(self.into_password()?),
            Method::Token => Arc::new(self.into_token()?),
            v2 => Arc::new(self.into_cloud_identity(v2, vendor)?),
        })
    }
}

// Everything a session is created from, split out for unit tests.
#[derive(Debug)]
pub(crate) struct SessionConfig {
    pub(crate) client: AuthenticatedClient,
    pub(crate) endpoint_overrides: HashMap<String, Url>,
    pub(crate) interface: Option<ValidInterfaces>,
    pub(crate) region_name: Option<String>,
}

impl CloudConfig {
    /// Create a cloud config from the configuration file.
    pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<CloudConfig, Error> {
        from_config(cloud_name.as_ref())
    }

    /// Create a cloud config from environment variables.
    pub fn from_env() -> Result<CloudConfig, Error> {
        from_env()
    }

    /// Vendor of the cloud (OpenStack if not specified).
    #[inline]
    pub fn vendor(&self) -> Vendor {
        self.vendor.unwrap_or_default()
    }

    /// Region name (if specified).
    #[inline]
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    /// Explicitly requested authentication plugin, if it is one of `accepted`.
    fn requested_method(&self, accepted: &[Method]) -> Result<Option<Method>, Error> {
        let method = match self.auth_type {
            Some(ref auth_type) => auth_type.parse::<Method>()?,
            None => return Ok(None),
        };
        if accepted.contains(&method) {
            Ok(Some(method))
        } else {
            let names: Vec<_> = accepted.iter().map(|m| m.as_str()).collect();
            Err(config_error(format!(
                "Invalid authentication type, expected {}, got {}",
                names.join(" or "),
                method.as_str()
            )))
        }
    }

    fn take_auth(&mut self) -> Result<Auth, Error> {
        self.auth
            .take()
            .ok_or_else(|| config_error("Credentials can be missing only for none authentication"))
    }

    fn create_endpoint_overrides(&self) -> Result<HashMap<String, Url>, Error> {
        let mut result = HashMap::new();
        for (key, value) in &self.options {
            let service_type = match key.strip_suffix("_endpoint_override") {
                Some(service_type) => service_type,
                None => continue,
            };
            let url = value
                .as_str()
                .ok_or_else(|| config_error(format!("{} must be a string, got {:?}", key, value)))
                .and_then(|value| {
                    Url::parse(value)
                        .map_err(|e| config_error(format!("Invalid {} `{}`: {}", key, value, e)))
                })?;
            // clouds.yaml keys use underscores where catalog types use dashes
            // (rax_load_balancer for rax:load-balancer).
            let with_dashes = service_type.replace('_', "-");
            if with_dashes != service_type {
                let _ = result.insert(with_dashes, url.clone());
            }
            let _ = result.insert(service_type.to_string(), url);
        }
        Ok(result)
    }

    fn http_options(&self) -> Result<HttpOptions, Error> {
        let timeout = match self.api_timeout {
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => {
                return Err(config_error(format!(
                    "api_timeout must be a positive number of seconds, got {}",
                    secs
                )))
            }
            None => None,
        };
        Ok(HttpOptions {
            cacert: self.cacert.clone(),
            insecure: self.verify == Some(false),
            proxy: self.proxy.clone(),
            timeout,
        })
    }

    pub(crate) fn create_session_config(mut self) -> Result<SessionConfig, Error> {
        let endpoint_overrides = self.create_endpoint_overrides()?;
        let http = self.http_options()?;
        let vendor = self.vendor();
        let requested = match self.auth_type {
            Some(ref auth_type) => Some(auth_type.parse::<Method>()?),
            None => None,
        };
        let auth = match (self.auth.take(), requested) {
            (Some(auth), requested) => {
                let method = requested.unwrap_or_else(|| auth.implied_method(vendor));
                auth.into_auth_type(method, vendor)?
            }
            (None, Some(Method::None)) => Arc::new(NoAuth::new_without_endpoint()),
            (None, _) => {
                return Err(config_error(
                    "Credentials can be missing only for none authentication",
                ))
            }
        };
        let interface = self
            .interface
            .as_deref()
            .map(ValidInterfaces::from_str)
            .transpose()?;

        Ok(SessionConfig {
            client: AuthenticatedClient::new_internal(http.into_client()?, auth),
            endpoint_overrides,
            interface,
            region_name: self.region_name,
        })
    }

    /// Create a session from this configuration.
    ///
    /// The authentication is performed immediately, so invalid credentials are reported here.
    pub async fn create_session(self) -> Result<Session, Error> {
        let config = self.create_session_config()?;
        config.client.refresh().await?;
        let mut result = Session::new_with_authenticated_client(config.client);
        result
            .endpoint_overrides_mut()
            .extend(config.endpoint_overrides);
        let filters = result.endpoint_filters_mut();
        filters.region = config.region_name;
        if let Some(interface) = config.interface {
            filters.set_interfaces(interface);
        }
        Ok(result)
    }
}

impl TryFrom<CloudConfig> for NoAuth {
    type Error = Error;

    fn try_from(mut value: CloudConfig) -> Result<NoAuth, Error> {
        let _ = value.requested_method(&[Method::None])?;
        match value.auth.take() {
            Some(auth) => auth.into_none(),
            None => Ok(NoAuth::new_without_endpoint()),
        }
    }
}

impl TryFrom<CloudConfig> for Password {
    type Error = Error;

    fn try_from(mut value: CloudConfig) -> Result<Password, Error> {
        let _ = value.requested_method(&[Method::Password])?;
        value.take_auth()?.into_password()
    }
}

impl TryFrom<CloudConfig> for Token {
    type Error = Error;

    fn try_from(mut value: CloudConfig) -> Result<Token, Error> {
        let _ = value.requested_method(&[Method::Token])?;
        value.take_auth()?.into_token()
    }
}

impl TryFrom<CloudConfig> for CloudIdentity {
    type Error = Error;

    fn try_from(mut value: CloudConfig) -> Result<CloudIdentity, Error> {
        let requested = value.requested_method(ALL_V2)?;
        let vendor = value.vendor();
        let auth = value.take_auth()?;
        let method = requested.unwrap_or_else(|| match auth.implied_method(vendor) {
            v2 if v2.is_v2() => v2,
            _ => Method::V2Password,
        });
        auth.into_cloud_identity(method, vendor)
    }
}
