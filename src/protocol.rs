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

//! Version discovery.

use log::{debug, trace, warn};
use reqwest::{Method, Url};
use serde::Deserialize;

use super::client::AuthenticatedClient;
use super::common::Version;
use super::services::ServiceType;
use super::url;
use super::{ApiVersion, Error, ErrorKind};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Versions {
    Plain(Vec<Version>),
    // Identity wraps the list into an object
    Wrapped { values: Vec<Version> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Root {
    MultipleVersions { versions: Versions },
    OneVersion { version: Version },
}

/// Information about API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Root endpoint.
    pub root_url: Url,
    /// Major API version.
    pub major_version: Option<ApiVersion>,
    /// Current API version (if supported).
    pub current_version: Option<ApiVersion>,
    /// Minimum API version (if supported).
    pub minimum_version: Option<ApiVersion>,
}

fn version_into_service_info(version: Version) -> Result<ServiceInfo, Error> {
    let endpoint = match version.links.into_iter().find(|x| x.rel == "self") {
        Some(link) => link.href,
        None => {
            return Err(Error::new(
                ErrorKind::InvalidResponse,
                "Invalid version - missing self link",
            ));
        }
    };

    Ok(ServiceInfo {
        root_url: endpoint,
        major_version: Some(version.id),
        current_version: version.version,
        minimum_version: version.min_version,
    })
}

impl Root {
    async fn fetch(client: &AuthenticatedClient, endpoint: Url) -> Result<Root, Error> {
        debug!("Fetching version information from {}", endpoint);
        client.request(Method::GET, endpoint).fetch_json().await
    }

    fn into_service_info<Srv: ServiceType>(self, service: &Srv) -> Result<ServiceInfo, Error> {
        trace!(
            "Available major versions for {} service: {:?}",
            service.catalog_type(),
            self
        );

        match self {
            Root::OneVersion { version: ver } => {
                if service.major_version_supported(ver.id) {
                    if !ver.is_stable() {
                        warn!(
                            "Using version {:?} of {} API that is not marked as stable",
                            ver,
                            service.catalog_type()
                        );
                    }

                    version_into_service_info(ver)
                } else {
                    Err(Error::new(
                        ErrorKind::EndpointNotFound,
                        format!(
                            "Major version {} of {} is not supported",
                            ver.id,
                            service.catalog_type()
                        ),
                    ))
                }
            }
            Root::MultipleVersions { versions } => {
                let mut vers = match versions {
                    Versions::Plain(vers) | Versions::Wrapped { values: vers } => vers,
                };
                vers.sort_unstable_by_key(|v| v.id);
                match vers
                    .into_iter()
                    .rfind(|x| x.is_stable() && service.major_version_supported(x.id))
                {
                    Some(ver) => version_into_service_info(ver),
                    None => Err(Error::new_endpoint_not_found(service.catalog_type())),
                }
            }
        }
    }
}

/// Whether the catalog path is a sub-path of the discovered version path.
///
/// This is the case for endpoints that include a project, e.g. `/v2/123456` within `/v2`.
fn within_version(catalog: &Url, root: &Url) -> bool {
    let root_path = root.path().trim_end_matches('/');
    let catalog_path = catalog.path().trim_end_matches('/');
    catalog.host_str() == root.host_str()
        && catalog_path
            .strip_prefix(root_path)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

impl ServiceInfo {
    /// Whether this service supports the given API version.
    ///
    /// Defaults to false if cannot be determined.
    #[inline]
    pub fn supports_api_version(&self, version: ApiVersion) -> bool {
        match (self.minimum_version, self.current_version) {
            (Some(min), Some(max)) => version.is_within(min, max),
            (None, Some(current)) => current == version,
            (Some(min), None) => version >= min,
            _ => false,
        }
    }

    /// Generic code to extract a `ServiceInfo` from a URL.
    pub(crate) async fn fetch<Srv: ServiceType>(
        service: &Srv,
        endpoint: Url,
        client: &AuthenticatedClient,
    ) -> Result<ServiceInfo, Error> {
        let catalog_type = service.catalog_type();
        if !service.version_discovery_supported() {
            debug!(
                "Service {} does not support version discovery, using {}",
                catalog_type, endpoint
            );
            return Ok(ServiceInfo {
                root_url: endpoint,
                major_version: None,
                current_version: None,
                minimum_version: None,
            });
        }

        // Workaround for old version of Nova returning HTTP endpoints even if
        // accessed via HTTPS
        let secure = endpoint.scheme() == "https";

        let root = match Root::fetch(client, endpoint.clone()).await {
            Ok(root) => root,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::ResourceNotFound | ErrorKind::InvalidResponse
                ) =>
            {
                if url::is_root(&endpoint) {
                    return Err(Error::new_endpoint_not_found(catalog_type));
                }
                let parent = url::pop(endpoint.clone(), true)?;
                debug!(
                    "No version information at {} ({}), trying parent endpoint {}",
                    endpoint, e, parent
                );
                Root::fetch(client, parent).await?
            }
            Err(e) => return Err(e),
        };

        let mut info = root.into_service_info(service)?;
        if secure && info.root_url.scheme() == "http" && info.root_url.set_scheme("https").is_err() {
            warn!("Cannot switch {} to HTTPS", info.root_url);
        }

        if within_version(&endpoint, &info.root_url) {
            debug!(
                "Keeping catalog endpoint {} within version root {}",
                endpoint, info.root_url
            );
            info.root_url = endpoint;
        }

        debug!("Received {:?} for {} service", info, catalog_type);
        Ok(info)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use reqwest::Url;

    use super::super::common::{Link, Version, VersionStatus};
    use super::super::services::ServiceType;
    use super::super::ApiVersion;
    use super::super::ErrorKind;
    use super::{version_into_service_info, within_version, Root, Versions};

    fn version(id: ApiVersion, href: &str) -> Version {
        Version {
            id,
            links: vec![Link {
                href: Url::parse(href).unwrap(),
                rel: "self".to_string(),
            }],
            status: VersionStatus::Supported,
            version: None,
            min_version: None,
        }
    }

    #[test]
    fn test_version_into_service_info() {
        let url = Url::parse("https://example.com/v2").unwrap();
        let mut ver = version(ApiVersion(2, 0), url.as_str());
        ver.links.insert(
            0,
            Link {
                href: Url::parse("https://example.com/docs").unwrap(),
                rel: "other".to_string(),
            },
        );
        ver.version = Some(ApiVersion(2, 2));
        let info = version_into_service_info(ver).unwrap();
        assert_eq!(info.root_url, url);
        assert_eq!(info.major_version, Some(ApiVersion(2, 0)));
        assert_eq!(info.current_version, Some(ApiVersion(2, 2)));
        assert_eq!(info.minimum_version, None);
        assert!(info.supports_api_version(ApiVersion(2, 2)));
        assert!(!info.supports_api_version(ApiVersion(2, 3)));
    }

    #[test]
    fn test_version_into_service_info_no_self_link() {
        let mut ver = version(ApiVersion(2, 0), "https://example.com/docs");
        ver.links[0].rel = "other".into();
        let err = version_into_service_info(ver).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    struct ServiceWithDiscovery;

    impl ServiceType for ServiceWithDiscovery {
        fn catalog_type(&self) -> &'static str {
            "test-service-with-discovery"
        }

        fn major_version_supported(&self, version: ApiVersion) -> bool {
            version.0 == 1 && version.1 > 0
        }

        fn version_discovery_supported(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_root_into_service_info_one_version() {
        let url = Url::parse("https://example.com/v1.2").unwrap();
        let root = Root::OneVersion {
            version: version(ApiVersion(1, 2), url.as_str()),
        };

        let info = root.into_service_info(&ServiceWithDiscovery).unwrap();
        assert_eq!(info.root_url, url);
        assert_eq!(info.major_version, Some(ApiVersion(1, 2)));
    }

    #[test]
    fn test_root_into_service_info_one_version_unsupported() {
        let root = Root::OneVersion {
            version: version(ApiVersion(1, 0), "https://example.com/v1.0"),
        };

        let err = root.into_service_info(&ServiceWithDiscovery).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::EndpointNotFound);
    }

    #[test]
    fn test_root_into_service_info_versions() {
        let url = Url::parse("https://example.com/v1.2").unwrap();
        let root = Root::MultipleVersions {
            versions: Versions::Plain(vec![
                version(ApiVersion(1, 0), "https://example.com/1.0"),
                version(ApiVersion(1, 2), url.as_str()),
                version(ApiVersion(1, 1), "https://example.com/1.1"),
                version(ApiVersion(2, 0), "https://example.com/2.0"),
            ]),
        };

        let info = root.into_service_info(&ServiceWithDiscovery).unwrap();
        assert_eq!(info.root_url, url);
        assert_eq!(info.major_version, Some(ApiVersion(1, 2)));
    }

    #[test]
    fn test_root_identity_format() {
        let root: Root = serde_json::from_str(
            r#"{"versions": {"values": [
                {"id": "v1.1", "status": "stable",
                 "links": [{"rel": "self", "href": "https://example.com/v1.1/"}]},
                {"id": "v1.3", "status": "deprecated",
                 "links": [{"rel": "self", "href": "https://example.com/v1.3/"}]}
            ]}}"#,
        )
        .unwrap();
        let info = root.into_service_info(&ServiceWithDiscovery).unwrap();
        assert_eq!(info.root_url.as_str(), "https://example.com/v1.1/");
    }

    #[test]
    fn test_root_into_service_info_versions_unsupported() {
        let root = Root::MultipleVersions {
            versions: Versions::Plain(vec![
                version(ApiVersion(1, 0), "https://example.com/1.0"),
                version(ApiVersion(2, 0), "https://example.com/2.0"),
            ]),
        };

        let err = root.into_service_info(&ServiceWithDiscovery).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::EndpointNotFound);
    }

    #[test]
    fn test_within_version() {
        let root = Url::parse("https://compute.example.com/v2/").unwrap();
        let tenant = Url::parse("https://compute.example.com/v2/123456").unwrap();
        let other = Url::parse("https://compute.example.com/v2.1/123456").unwrap();
        assert!(within_version(&tenant, &root));
        assert!(!within_version(&other, &root));
        assert!(!within_version(&root, &root));
    }
}
