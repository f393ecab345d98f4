// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Low-level code to work with the service catalog.

use log::{debug, error};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{EndpointFilters, Error, ErrorKind};

/// An endpoint of a service in the catalog.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CatalogEndpoint {
    /// Interface: `public`, `internal` or `admin` (Identity V2 spellings are also accepted).
    pub interface: String,
    /// Region (if any, endpoints without a region are global).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Endpoint URL.
    pub url: String,
}

/// A service in the catalog.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceCatalogEntry {
    /// Service type, e.g. `object-store`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service name, e.g. `cloudFiles`.
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoints of the service.
    pub endpoints: Vec<CatalogEndpoint>,
}

/// Find an endpoint in the service catalog.
///
/// All entries of the service type are searched, since a catalog may list the same type more
/// than once (e.g. `cloudServers` and `cloudServersOpenStack` for `compute`). Interfaces are
/// tried in the order they are listed in the filters; for the same interface an endpoint of the
/// requested region is preferred over a global one.
pub fn find_endpoint<'c>(
    catalog: &'c [ServiceCatalogEntry],
    service_type: &str,
    filters: &EndpointFilters,
) -> Result<&'c CatalogEndpoint, Error> {
    let mut entries = catalog
        .iter()
        .filter(|x| x.service_type == service_type)
        .peekable();
    if entries.peek().is_none() {
        return Err(Error::new_endpoint_not_found(service_type));
    }

    let regional = filters.region.is_some();
    entries
        .flat_map(|svc| svc.endpoints.iter())
        .filter(|x| filters.check(x))
        .filter_map(|x| {
            filters
                .interfaces
                .priority(&x.interface)
                .map(|pos| ((pos, regional && x.region.is_none()), x))
        })
        .min_by_key(|(key, _)| *key)
        .map(|(_, x)| x)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::EndpointNotFound,
                format!(
                    "Endpoint for service {} was not found for interfaces {:?} in region {:?}",
                    service_type, filters.interfaces, filters.region
                ),
            )
        })
}

/// Extract a URL from the service catalog.
pub fn extract_url(
    catalog: &[ServiceCatalogEntry],
    service_type: &str,
    filters: &EndpointFilters,
) -> Result<Url, Error> {
    let endp = find_endpoint(catalog, service_type, filters)?;
    debug!("Received {:?} for {}", endp, service_type);
    Url::parse(&endp.url).map_err(|e| {
        error!(
            "Invalid URL {} received from service catalog for service \
             '{}', filters {:?}: {}",
            endp.url, service_type, filters, e
        );
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Invalid URL {} for {} - {}", endp.url, service_type, e),
        )
    })
}
