// Copyright 2023 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Content Delivery (CDN) V1 API.

use std::time::Duration;

use log::{debug, trace};
use reqwest::header::LOCATION;

use super::services::{GenericService, CONTENT_DELIVERY};
use super::utils;
use super::{Adapter, Error, ErrorKind, Page};

mod protocol;

use self::protocol::FlavorsRoot;
pub use self::protocol::{
    CachingRule, Domain, DomainProtocol, Flavor, FlavorProvider, NewService, Origin, PatchOp,
    PatchOperation, Restriction, Rule, Service, ServiceError, ServiceStatus,
};

/// What to purge from the edge caches.
#[derive(Debug, Clone, Copy)]
pub enum PurgeTarget<'u> {
    /// A single asset by its URL path.
    Url(&'u str),
    /// All cached assets of the service.
    All,
}

fn id_from_location(location: &str) -> Option<&str> {
    location
        .split(&['?', '#'][..])
        .next()
        .and_then(|path| path.rsplit('/').find(|segment| !segment.is_empty()))
}

/// Content Delivery service client.
#[derive(Debug, Clone)]
pub struct ContentDelivery {
    adapter: Adapter<GenericService>,
}

service_client!(ContentDelivery: GenericService = CONTENT_DELIVERY);

impl ContentDelivery {
    /// Check that the service is reachable.
    pub async fn ping(&self) -> Result<(), Error> {
        let _ = self.adapter.get(&["ping"]).await?.send().await?;
        Ok(())
    }

    /// List available flavors.
    pub async fn list_flavors(&self) -> Result<Vec<Flavor>, Error> {
        let root: FlavorsRoot = self
            .adapter
            .get(&["flavors"])
            .await?
            .fetch_json()
            .await?;
        trace!("Received flavors: {:?}", root.flavors);
        Ok(root.flavors)
    }

    /// Get a flavor by its ID.
    pub async fn get_flavor<S: AsRef<str>>(&self, id: S) -> Result<Flavor, Error> {
        self.adapter
            .get(&["flavors", id.as_ref()])
            .await?
            .fetch_json()
            .await
    }

    /// List CDN services.
    pub async fn list_services(
        &self,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Service>, Error> {
        self.adapter
            .get(&["services"])
            .await?
            .fetch_page(limit, marker)
            .await
    }

    /// Get a CDN service by its ID.
    pub async fn get_service<S: AsRef<str>>(&self, id: S) -> Result<Service, Error> {
        self.adapter
            .get(&["services", id.as_ref()])
            .await?
            .fetch_json()
            .await
    }

    /// Create a CDN service and return its ID.
    ///
    /// The service is created asynchronously, use
    /// [wait_for_service_status](#method.wait_for_service_status) to wait for it.
    pub async fn create_service(&self, request: &NewService) -> Result<String, Error> {
        if request.domains.is_empty() || request.origins.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "A CDN service requires at least one domain and one origin",
            ));
        }
        let response = self
            .adapter
            .post(&["services"])
            .await?
            .json(request)
            .send()
            .await?;
        let id = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(id_from_location)
            .map(String::from)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidResponse,
                    "No valid Location header in response to creating a CDN service",
                )
            })?;
        debug!("Created CDN service {} with ID {}", request.name, id);
        Ok(id)
    }

    /// Update a CDN service with a JSON patch.
    pub async fn update_service<S: AsRef<str>>(
        &self,
        id: S,
        patch: &[PatchOperation],
    ) -> Result<(), Error> {
        let _ = self
            .adapter
            .patch(&["services", id.as_ref()])
            .await?
            .json(patch)
            .send()
            .await?;
        debug!("Requested update of CDN service {}", id.as_ref());
        Ok(())
    }

    /// Delete a CDN service.
    pub async fn delete_service<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["services", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Requested deletion of CDN service {}", id.as_ref());
        Ok(())
    }

    /// Purge cached assets of a CDN service.
    pub async fn purge_cached_assets<S: AsRef<str>>(
        &self,
        id: S,
        target: PurgeTarget<'_>,
    ) -> Result<(), Error> {
        let builder = self
            .adapter
            .delete(&["services", id.as_ref(), "assets"])
            .await?;
        let builder = match target {
            PurgeTarget::Url(url) => builder.query(&[("url", url)]),
            PurgeTarget::All => builder.query(&[("all", "true")]),
        };
        let _ = builder.send().await?;
        debug!("Purged {:?} of CDN service {}", target, id.as_ref());
        Ok(())
    }

    /// Wait for a CDN service to reach the status.
    ///
    /// Fails with `OperationFailed` if the service reaches an error status instead.
    pub async fn wait_for_service_status<S: AsRef<str>>(
        &self,
        id: S,
        status: ServiceStatus,
        timeout: Duration,
        delay: Duration,
    ) -> Result<Service, Error> {
        let id = id.as_ref();
        let description = format!("CDN service {} to reach status {}", id, status);
        let status = &status;
        utils::wait_for(timeout, delay, &description, move || async move {
            let service = self.get_service(id).await?;
            if &service.status == status {
                Ok(Some(service))
            } else if service.status.is_failed() {
                let messages: Vec<_> = service.errors.iter().map(|e| e.message.as_str()).collect();
                Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!(
                        "CDN service {} is in status {}: {}",
                        id,
                        service.status,
                        messages.join("; ")
                    ),
                ))
            } else {
                Ok(None)
            }
        })
        .await
    }
}
