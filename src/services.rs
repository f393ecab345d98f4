// Copyright 2019 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Cloud service types.

use http::header::HeaderName;

use super::ApiVersion;

/// Trait representing a service type.
pub trait ServiceType {
    /// Service type to pass to the catalog.
    fn catalog_type(&self) -> &'static str;

    /// Alternative service types to try when the main one is not in the catalog.
    fn catalog_aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Check whether this service type is compatible with the given major version.
    fn major_version_supported(&self, _version: ApiVersion) -> bool {
        true
    }

    /// Whether this service supports version discovery at all.
    fn version_discovery_supported(&self) -> bool {
        false
    }

    /// Header used to request an API version (if the service supports API versions).
    fn api_version_header(&self) -> Option<HeaderName> {
        None
    }
}

/// A service that supports API versions (microversions) via a header.
pub trait VersionedService: ServiceType {
    /// Name of the version header.
    fn version_header(&self) -> HeaderName;
}

/// A generic service.
#[derive(Copy, Clone, Debug)]
pub struct GenericService {
    catalog_type: &'static str,
    aliases: &'static [&'static str],
    major_version: Option<u16>,
    discovery: bool,
}

/// The Compute service.
#[derive(Copy, Clone, Debug)]
pub struct ComputeService {
    __use_new: (),
}

impl GenericService {
    /// Create a new generic service.
    pub const fn new(catalog_type: &'static str, major_version: Option<u16>) -> GenericService {
        GenericService {
            catalog_type,
            aliases: &[],
            major_version,
            discovery: false,
        }
    }

    /// Add alternative catalog types.
    pub const fn with_aliases(self, aliases: &'static [&'static str]) -> GenericService {
        GenericService { aliases, ..self }
    }

    /// Enable version discovery.
    pub const fn with_discovery(self) -> GenericService {
        GenericService {
            discovery: true,
            ..self
        }
    }
}

impl ServiceType for GenericService {
    fn catalog_type(&self) -> &'static str {
        self.catalog_type
    }

    fn catalog_aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn major_version_supported(&self, version: ApiVersion) -> bool {
        if let Some(supported) = self.major_version {
            version.0 == supported
        } else {
            true
        }
    }

    fn version_discovery_supported(&self) -> bool {
        self.discovery
    }
}

impl ComputeService {
    /// Create a Compute service type.
    pub const fn new() -> ComputeService {
        ComputeService { __use_new: () }
    }
}

const NOVA_API_VERSION: &str = "x-openstack-nova-api-version";

impl ServiceType for ComputeService {
    fn catalog_type(&self) -> &'static str {
        "compute"
    }

    fn major_version_supported(&self, version: ApiVersion) -> bool {
        version.0 == 2
    }

    fn version_discovery_supported(&self) -> bool {
        true
    }

    fn api_version_header(&self) -> Option<HeaderName> {
        Some(self.version_header())
    }
}

impl VersionedService for ComputeService {
    fn version_header(&self) -> HeaderName {
        HeaderName::from_static(NOVA_API_VERSION)
    }
}

/// Identity service.
pub const IDENTITY: GenericService = GenericService::new("identity", None);

/// Object Storage service.
pub const OBJECT_STORAGE: GenericService = GenericService::new("object-store", Some(1));

/// CDN management for Object Storage containers (Rackspace).
pub const OBJECT_CDN: GenericService = GenericService::new("rax:object-cdn", Some(1));

/// Networking service.
pub const NETWORK: GenericService = GenericService::new("network", Some(2)).with_discovery();

/// Content Delivery service.
pub const CONTENT_DELIVERY: GenericService =
    GenericService::new("rax:cdn", Some(1)).with_aliases(&["cdn"]);

/// Compute service.
pub const COMPUTE: ComputeService = ComputeService::new();

/// Block Storage service.
pub const BLOCK_STORAGE: GenericService = GenericService::new("volumev2", None).with_aliases(&[
    "volume",
    "block-storage",
    "volumev3",
]);

/// Cloud Load Balancers service (Rackspace).
pub const LOAD_BALANCER: GenericService = GenericService::new("rax:load-balancer", Some(1));

/// Cloud DNS service (Rackspace).
pub const DNS: GenericService = GenericService::new("rax:dns", Some(1));

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_generic_service() {
        assert_eq!(NETWORK.catalog_type(), "network");
        assert!(NETWORK.version_discovery_supported());
        assert!(NETWORK.major_version_supported(ApiVersion(2, 0)));
        assert!(!NETWORK.major_version_supported(ApiVersion(3, 0)));
        assert!(!OBJECT_STORAGE.version_discovery_supported());
        assert!(OBJECT_STORAGE.api_version_header().is_none());
    }

    #[test]
    fn test_aliases() {
        assert_eq!(CONTENT_DELIVERY.catalog_aliases(), &["cdn"]);
        assert!(BLOCK_STORAGE.catalog_aliases().contains(&"volume"));
        assert!(DNS.catalog_aliases().is_empty());
    }

    #[test]
    fn test_compute_service() {
        assert_eq!(COMPUTE.catalog_type(), "compute");
        assert_eq!(
            COMPUTE.api_version_header().unwrap().as_str(),
            "x-openstack-nova-api-version"
        );
        assert!(COMPUTE.major_version_supported(ApiVersion(2, 1)));
    }
}
