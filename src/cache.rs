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

//! Per-session cache of resolved service endpoints.

use std::collections::HashMap;

use log::{debug, trace};
use reqwest::Url;
use tokio::sync::RwLock;

use crate::client::AuthenticatedClient;
use crate::protocol::ServiceInfo;
use crate::services::ServiceType;
use crate::{EndpointFilters, Error, ErrorKind};

/// Resolved services keyed by their catalog type, plus the inputs of resolution.
///
/// Filters and overrides are part of the cache: whoever changes them must clear it.
#[derive(Debug)]
pub struct EndpointCache {
    resolved: RwLock<HashMap<&'static str, ServiceInfo>>,
    pub filters: EndpointFilters,
    pub overrides: HashMap<String, Url>,
}

/// The catalog type of the service followed by its aliases.
fn candidate_types<Srv: ServiceType>(service: &Srv) -> impl Iterator<Item = &'static str> {
    std::iter::once(service.catalog_type()).chain(service.catalog_aliases().iter().copied())
}

fn check_root(url: &Url, catalog_type: &str) -> Result<(), Error> {
    if url.cannot_be_a_base() || !url.has_host() {
        Err(Error::new(
            ErrorKind::InvalidResponse,
            format!("Invalid URL {} received for service {}", url, catalog_type),
        ))
    } else {
        Ok(())
    }
}

impl Clone for EndpointCache {
    /// Keep filters and overrides, drop everything resolved.
    fn clone(&self) -> EndpointCache {
        EndpointCache {
            resolved: RwLock::default(),
            filters: self.filters.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

impl EndpointCache {
    pub fn new() -> Self {
        EndpointCache {
            resolved: RwLock::default(),
            filters: EndpointFilters::default(),
            overrides: HashMap::new(),
        }
    }

    /// Forget everything resolved so far.
    #[inline]
    pub fn clear(&mut self) -> &mut Self {
        self.resolved.get_mut().clear();
        self
    }

    /// Locate the endpoint: an override first, then the catalog.
    async fn locate<Srv: ServiceType>(
        &self,
        client: &AuthenticatedClient,
        service: &Srv,
    ) -> Result<Url, Error> {
        if let Some((name, url)) =
            candidate_types(service).find_map(|name| self.overrides.get(name).map(|u| (name, u)))
        {
            debug!("Using override {} for service {}", url, name);
            return Ok(url.clone());
        }

        for name in candidate_types(service) {
            match client.get_endpoint(name, &self.filters).await {
                Err(e) if e.kind() == ErrorKind::EndpointNotFound => {
                    trace!("No {} in the catalog: {}", name, e);
                }
                other => return other,
            }
        }

        Err(Error::new_endpoint_not_found(service.catalog_type()))
    }

    /// Run `filter` on the cached information, resolving the service on first use.
    pub async fn extract_service_info<Srv, F, T>(
        &self,
        client: &AuthenticatedClient,
        service: &Srv,
        filter: F,
    ) -> Result<T, Error>
    where
        Srv: ServiceType + Sync,
        F: FnOnce(&ServiceInfo) -> T + Send,
        T: Send,
    {
        let catalog_type = service.catalog_type();
        if let Some(info) = self.resolved.read().await.get(catalog_type) {
            return Ok(filter(info));
        }

        let mut resolved = self.resolved.write().await;
        // Someone may have resolved it while we waited for the lock.
        if let Some(info) = resolved.get(catalog_type) {
            return Ok(filter(info));
        }

        debug!("Resolving endpoint of service {}", catalog_type);
        let endpoint = self.locate(client, service).await?;
        check_root(&endpoint, catalog_type)?;
        let info = ServiceInfo::fetch(service, endpoint, client).await?;
        let value = filter(&info);
        let _ = resolved.insert(catalog_type, info);
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use reqwest::Url;

    use crate::client::AuthenticatedClient;
    use crate::protocol::ServiceInfo;
    use crate::services::{CONTENT_DELIVERY, DNS, OBJECT_STORAGE};
    use crate::ErrorKind;

    use super::EndpointCache;

    fn info(url: &str) -> ServiceInfo {
        ServiceInfo {
            root_url: Url::parse(url).unwrap(),
            major_version: None,
            current_version: None,
            minimum_version: None,
        }
    }

    #[tokio::test]
    async fn test_resolves_once() {
        let client =
            AuthenticatedClient::new_noauth("https://dns.api.rackspacecloud.com/v1.0/123").await;
        let mut cache = EndpointCache::new();
        let url = cache
            .extract_service_info(&client, &DNS, |s| s.root_url.clone())
            .await
            .unwrap();
        assert_eq!(url.as_str(), "https://dns.api.rackspacecloud.com/v1.0/123");

        let _ = cache
            .resolved
            .get_mut()
            .insert("rax:dns", info("https://cached.example.com/v1.0/123"));
        let url = cache
            .extract_service_info(&client, &DNS, |s| s.root_url.clone())
            .await
            .unwrap();
        assert_eq!(url.as_str(), "https://cached.example.com/v1.0/123");

        let cloned = cache.clone();
        assert!(cloned.resolved.read().await.is_empty());
        assert!(!cache.clear().resolved.get_mut().contains_key("rax:dns"));
    }

    #[tokio::test]
    async fn test_rejects_relative_endpoint() {
        let client = AuthenticatedClient::new_noauth("unix:/run/swift.socket").await;
        let err = EndpointCache::new()
            .extract_service_info(&client, &OBJECT_STORAGE, |s| s.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_override_by_alias() {
        let client = AuthenticatedClient::new_noauth("http://unused").await;
        let mut cache = EndpointCache::new();
        let _ = cache.overrides.insert(
            "cdn".into(),
            Url::parse("http://cdn.local/v1.0/123").unwrap(),
        );
        let url = cache
            .extract_service_info(&client, &CONTENT_DELIVERY, |s| s.root_url.clone())
            .await
            .unwrap();
        assert_eq!(url.as_str(), "http://cdn.local/v1.0/123");
    }
}
