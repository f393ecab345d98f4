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

//! Cloud vendors and their dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Error, ErrorKind};

/// A cloud vendor.
///
/// Vendors differ in the credential kinds they accept for Identity V2, in how the default region
/// is reported and in whether a tenant is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Vendor {
    /// Upstream OpenStack (the default).
    #[default]
    OpenStack,
    /// Rackspace Public Cloud.
    Rackspace,
    /// HP Helion Public Cloud.
    Hp,
}

impl Vendor {
    /// Name of the vendor as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::OpenStack => "openstack",
            Vendor::Rackspace => "rackspace",
            Vendor::Hp => "hp",
        }
    }

    /// Whether Identity V2 authentication with an API key is supported.
    #[inline]
    pub fn supports_api_key(&self) -> bool {
        *self == Vendor::Rackspace
    }

    /// Whether Identity V2 authentication with an access key is supported.
    #[inline]
    pub fn supports_access_key(&self) -> bool {
        *self == Vendor::Hp
    }

    /// Whether an Identity V2 token must be scoped to a tenant.
    #[inline]
    pub fn requires_tenant(&self) -> bool {
        *self == Vendor::Hp
    }

    /// Whether the user's default region is reported by the identity service.
    #[inline]
    pub fn reports_default_region(&self) -> bool {
        *self == Vendor::Rackspace
    }

    /// Identity endpoint used when the configuration does not provide one.
    pub fn identity_url(&self) -> Option<&'static str> {
        match self {
            Vendor::OpenStack => None,
            Vendor::Rackspace => Some("https://identity.api.rackspacecloud.com/v2.0/"),
            Vendor::Hp => Some("https://region-a.geo-1.identity.hpcloudsvc.com:35357/v2.0/"),
        }
    }

    /// Whether the vendor uses Identity V2 by default.
    #[inline]
    pub fn prefers_identity_v2(&self) -> bool {
        *self != Vendor::OpenStack
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Vendor, Error> {
        match s.to_ascii_lowercase().as_str() {
            "openstack" => Ok(Vendor::OpenStack),
            "rackspace" => Ok(Vendor::Rackspace),
            "hp" | "hpcloud" => Ok(Vendor::Hp),
            other => Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("Unknown cloud vendor {}", other),
            )),
        }
    }
}

impl Serialize for Vendor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Vendor {
    fn deserialize<D>(deserializer: D) -> Result<Vendor, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Vendor::from_str(&value).map_err(serde::de::Error::custom)
    }
}
