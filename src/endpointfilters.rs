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

//! Selecting endpoints from the service catalog.

use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;
use std::str::FromStr;

use super::{Error, ErrorKind};
use crate::catalog::CatalogEndpoint;

/// Endpoint interface.
///
/// Rackspace calls the internal interface ServiceNet: it is only reachable from servers
/// in the same region and is not billed for bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterfaceType {
    /// Public interface (used by default).
    #[default]
    Public,
    /// Internal interface (ServiceNet on Rackspace).
    Internal,
    /// Administrator interface.
    Admin,
}

/// Acceptable interfaces, most preferred first.
///
/// Never contains duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidInterfaces(Vec<InterfaceType>);

/// Filters applied when looking up an endpoint in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct EndpointFilters {
    /// Acceptable endpoint interfaces.
    pub interfaces: ValidInterfaces,
    /// Cloud region, e.g. `DFW`.
    pub region: Option<String>,
}

impl InterfaceType {
    /// Name as used in Identity V3 catalogs and `clouds.yaml`.
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceType::Public => "public",
            InterfaceType::Internal => "internal",
            InterfaceType::Admin => "admin",
        }
    }

    /// Key of the URL in an Identity V2 endpoint, e.g. `publicURL`.
    pub fn v2_url_key(&self) -> &'static str {
        match self {
            InterfaceType::Public => "publicURL",
            InterfaceType::Internal => "internalURL",
            InterfaceType::Admin => "adminURL",
        }
    }

    /// Whether a catalog interface name refers to this interface.
    pub fn matches(&self, interface: &str) -> bool {
        interface
            .parse::<InterfaceType>()
            .map(|parsed| parsed == *self)
            .unwrap_or(false)
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterfaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" | "publicurl" => Ok(InterfaceType::Public),
            "internal" | "internalurl" | "servicenet" | "snet" => Ok(InterfaceType::Internal),
            "admin" | "adminurl" => Ok(InterfaceType::Admin),
            other => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Unknown interface type: {}", other),
            )),
        }
    }
}

impl Default for ValidInterfaces {
    fn default() -> ValidInterfaces {
        ValidInterfaces(vec![InterfaceType::Public])
    }
}

impl Deref for ValidInterfaces {
    type Target = [InterfaceType];

    fn deref(&self) -> &[InterfaceType] {
        &self.0
    }
}

impl From<InterfaceType> for ValidInterfaces {
    fn from(value: InterfaceType) -> ValidInterfaces {
        ValidInterfaces(vec![value])
    }
}

impl From<Vec<InterfaceType>> for ValidInterfaces {
    fn from(value: Vec<InterfaceType>) -> ValidInterfaces {
        value.into_iter().collect()
    }
}

impl FromIterator<InterfaceType> for ValidInterfaces {
    fn from_iter<T: IntoIterator<Item = InterfaceType>>(iter: T) -> Self {
        let mut result = ValidInterfaces(Vec::with_capacity(3));
        for item in iter {
            result.push(item);
        }
        result
    }
}

impl FromStr for ValidInterfaces {
    type Err = Error;

    /// Parse a comma-separated list, e.g. `internal,public`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let result = s
            .split(',')
            .filter(|x| !x.trim().is_empty())
            .map(InterfaceType::from_str)
            .collect::<Result<ValidInterfaces, _>>()?;
        if result.is_empty() {
            Err(Error::new(
                ErrorKind::InvalidInput,
                "At least one interface is required",
            ))
        } else {
            Ok(result)
        }
    }
}

impl ValidInterfaces {
    /// Add a fallback interface. Returns `false` if it was already present.
    pub fn push(&mut self, item: InterfaceType) -> bool {
        if self.0.contains(&item) {
            false
        } else {
            self.0.push(item);
            true
        }
    }

    /// Priority of the catalog interface name (lower is better), if it is acceptable.
    pub(crate) fn priority(&self, interface: &str) -> Option<usize> {
        self.0.iter().position(|x| x.matches(interface))
    }
}

impl EndpointFilters {
    /// Create filters with interfaces and region.
    pub fn new<I, S>(interfaces: I, region: S) -> EndpointFilters
    where
        I: Into<ValidInterfaces>,
        S: Into<String>,
    {
        EndpointFilters {
            interfaces: interfaces.into(),
            region: Some(region.into()),
        }
    }

    /// Whether the endpoint passes the filters.
    ///
    /// Regions are compared case-insensitively (`dfw` and `DFW` are the same region).
    /// Endpoints without a region are global and match any region.
    pub fn check(&self, endpoint: &CatalogEndpoint) -> bool {
        if self.interfaces.priority(&endpoint.interface).is_none() {
            return false;
        }

        match (&self.region, &endpoint.region) {
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
            _ => true,
        }
    }

    /// Replace the acceptable interfaces.
    #[inline]
    pub fn set_interfaces<T: Into<ValidInterfaces>>(&mut self, value: T) {
        self.interfaces = value.into();
    }

    /// Set region.
    #[inline]
    pub fn set_region<T: Into<String>>(&mut self, value: T) {
        self.region = Some(value.into());
    }

    /// Replace the acceptable interfaces.
    #[inline]
    pub fn with_interfaces<T: Into<ValidInterfaces>>(mut self, value: T) -> Self {
        self.set_interfaces(value);
        self
    }

    /// Set region.
    #[inline]
    pub fn with_region<T: Into<String>>(mut self, value: T) -> Self {
        self.set_region(value);
        self
    }
}
