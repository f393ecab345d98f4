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

//! Support for JSON credentials files used by live tests and demos.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use super::cloud::Auth;
use super::CloudConfig;
use crate::{Error, ErrorKind, Vendor};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Credentials {
    #[serde(default)]
    vendor: Option<Vendor>,
    base_address: String,
    #[serde(default)]
    default_region: Option<String>,
    #[serde(default)]
    proxy: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, rename = "APIKey")]
    api_key: Option<String>,
    #[serde(default)]
    access_key: Option<String>,
    #[serde(default)]
    secret_key: Option<String>,
    #[serde(default)]
    tenant_name: Option<String>,
    #[serde(default)]
    tenant_id: Option<String>,
}

/// A JSON file with named sets of credentials.
///
/// The format is
///
/// ```json
/// {
///     "DefaultCredentials": "rackspace",
///     "Credentials": {
///         "rackspace": {
///             "Vendor": "rackspace",
///             "BaseAddress": "https://identity.api.rackspacecloud.com/v2.0",
///             "DefaultRegion": "DFW",
///             "Username": "joe",
///             "APIKey": "..."
///         }
///     }
/// }
/// ```
///
/// Each entry may also contain `Proxy`, `Password`, `AccessKey`, `SecretKey`, `TenantName` and
/// `TenantId`. Entries are always authenticated through Identity V2.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsFile {
    #[serde(rename = "DefaultCredentials", default)]
    default: Option<String>,
    #[serde(rename = "Credentials")]
    credentials: HashMap<String, Credentials>,
}

impl Credentials {
    fn auth_type(&self, vendor: Vendor) -> &'static str {
        if self.api_key.is_some() && vendor.supports_api_key() {
            "v2apikey"
        } else if self.access_key.is_some() && vendor.supports_access_key() {
            "v2accesskey"
        } else {
            "v2password"
        }
    }
}

impl From<Credentials> for CloudConfig {
    fn from(value: Credentials) -> CloudConfig {
        let vendor = value.vendor.unwrap_or_default();
        let auth_type = value.auth_type(vendor);
        CloudConfig {
            auth: Some(Auth {
                access_key: value.access_key,
                api_key: value.api_key,
                auth_url: Some(value.base_address),
                password: value.password,
                secret_key: value.secret_key,
                tenant_id: value.tenant_id,
                tenant_name: value.tenant_name,
                username: value.username,
                ..Auth::default()
            }),
            auth_type: Some(auth_type.into()),
            proxy: value.proxy,
            region_name: value.default_region,
            vendor: Some(vendor),
            ..CloudConfig::default()
        }
    }
}

impl CredentialsFile {
    /// Read credentials from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CredentialsFile, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot read {}: {}", path.display(), e),
            )
        })?;
        let result: CredentialsFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("Cannot parse {}: {}", path.display(), e),
                )
            })?;
        debug!(
            "Loaded {} credential set(s) from {}",
            result.credentials.len(),
            path.display()
        );
        Ok(result)
    }

    /// Names of all credential sets.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.credentials.keys().map(String::as_str)
    }

    /// Get a cloud configuration for the named credentials.
    ///
    /// An empty name selects `DefaultCredentials`.
    pub fn get<S: AsRef<str>>(&self, name: S) -> Result<CloudConfig, Error> {
        let name = match name.as_ref() {
            "" => self.default.as_deref().ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    "No credentials name provided and DefaultCredentials is not set",
                )
            })?,
            other => other,
        };
        self.credentials
            .get(name)
            .cloned()
            .map(From::from)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("No such credentials: {}", name),
                )
            })
    }
}
