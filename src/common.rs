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

//! JSON structures shared by several services.

use reqwest::Url;
use serde::de::{DeserializeOwned, Error as DeserError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ApiVersion;

/// A link to a resource, as found in `links` arrays.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Link {
    /// Resource URL.
    pub href: Url,
    /// Relationship, e.g. `self`, `bookmark` or `next`.
    pub rel: String,
}

impl Link {
    /// The URL of the next page of a collection, if any.
    pub fn find_next(links: &[Link]) -> Option<Url> {
        Link::find_rel(links, "next").cloned()
    }

    /// The URL of the first link with this relationship.
    pub fn find_rel<'l>(links: &'l [Link], rel: &str) -> Option<&'l Url> {
        links.iter().find(|link| link.rel == rel).map(|link| &link.href)
    }
}

/// An ID together with links to the referenced resource.
///
/// Servers refer to their flavor and image this way.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ref {
    /// ID of the referenced resource.
    pub id: String,
    /// Links to the resource.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A reference to a resource by either its ID or name.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
pub enum IdOrName {
    /// Resource ID.
    #[serde(rename = "id")]
    Id(String),
    /// Resource name.
    #[serde(rename = "name")]
    Name(String),
}

impl IdOrName {
    /// Create an ID.
    #[inline]
    pub fn from_id<T: Into<String>>(value: T) -> IdOrName {
        IdOrName::Id(value.into())
    }

    /// Create a name.
    #[inline]
    pub fn from_name<T: Into<String>>(value: T) -> IdOrName {
        IdOrName::Name(value.into())
    }

    /// The ID or the name.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            IdOrName::Id(value) | IdOrName::Name(value) => value,
        }
    }
}

/// Status of a major API version in a version document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum VersionStatus {
    /// The current version.
    Current,
    /// Supported (also `STABLE`) but not current.
    Supported,
    /// Deprecated version.
    Deprecated,
    /// Experimental version.
    Experimental,
    /// Missing or unrecognized status.
    #[default]
    Unknown,
}

impl VersionStatus {
    /// Whether the version can be used for requests.
    ///
    /// Unknown statuses are treated as stable: Swift and Rackspace services do not report any.
    #[inline]
    pub fn is_stable(&self) -> bool {
        !matches!(self, VersionStatus::Deprecated | VersionStatus::Experimental)
    }
}

impl From<String> for VersionStatus {
    fn from(value: String) -> VersionStatus {
        match value.to_ascii_uppercase().as_str() {
            "CURRENT" => VersionStatus::Current,
            "SUPPORTED" | "STABLE" => VersionStatus::Supported,
            "DEPRECATED" => VersionStatus::Deprecated,
            "EXPERIMENTAL" => VersionStatus::Experimental,
            _ => VersionStatus::Unknown,
        }
    }
}

/// One entry of a version discovery document.
#[derive(Clone, Debug, Deserialize)]
pub struct Version {
    /// Major version, e.g. `v2.1` for Compute or `v2.0` for Networking.
    pub id: ApiVersion,
    /// Links, the `self` link points at the versioned root.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Version status.
    #[serde(deserialize_with = "blank_as_default", default)]
    pub status: VersionStatus,
    /// Maximum microversion (empty if microversions are not supported).
    #[serde(deserialize_with = "blank_as_default", default)]
    pub version: Option<ApiVersion>,
    /// Minimum microversion.
    #[serde(deserialize_with = "blank_as_default", default)]
    pub min_version: Option<ApiVersion>,
}

impl Version {
    /// Whether the version can be used for requests.
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.status.is_stable()
    }
}

/// Deserialize a value that services report as `""`, `{}` or `null` when it is unset.
///
/// Compute uses an empty string for the image of a server booted from a volume, while
/// Cloud Load Balancers return `{}` for a disabled health monitor.
pub fn blank_as_default<'de, D, T>(des: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(des)?;
    let blank = match value {
        Value::Null => true,
        Value::String(ref s) => s.is_empty(),
        Value::Object(ref map) => map.is_empty(),
        _ => false,
    };
    if blank {
        Ok(T::default())
    } else {
        serde_json::from_value(value).map_err(D::Error::custom)
    }
}
